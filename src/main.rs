//! Geoguess - terminal front end
//!
//! Reads commands from stdin and turns them into bus events; the HUD prints
//! whatever the game announces back.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use geoguess::settings::print_help;
use geoguess::ui::{Command, attach_hud, emit_command, parse_command};
use geoguess::{
    CliAction, EventBus, Game, GameSettings, LocationDatabase, LogConfig, SqliteEventLogger,
    init_logging,
};
use tracing::{error, info, warn};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let settings = match GameSettings::parse_args(GameSettings::from_config_files(), &args) {
        CliAction::Play(settings) => settings,
        CliAction::Help => {
            print_help();
            return;
        }
    };

    let mut log_config = LogConfig::load_with_args(&args);
    if settings.debug_log {
        log_config.level = "debug".to_string();
    }
    init_logging(&log_config);

    let bus = EventBus::new();
    attach_hud(&bus);

    // Keep the logger alive for the whole session
    let _event_logger = settings.event_db.as_deref().and_then(|path| {
        match SqliteEventLogger::new(Path::new(path), "game") {
            Ok(logger) => {
                let logger = Rc::new(logger);
                logger.attach(&bus);
                info!("Logging events to {} (session {})", path, logger.session_id());
                Some(logger)
            }
            Err(e) => {
                warn!("Could not open event database {}: {}", path, e);
                None
            }
        }
    });

    let locations = Arc::new(LocationDatabase::load_from_file(&settings.locations_file));
    let game = match Game::install(&bus, locations, settings.game_config()) {
        Ok(game) => game,
        Err(e) => {
            error!("Could not start a game: {}", e);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    prompt();
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };

        let command = parse_command(&line);
        match &command {
            Command::Quit => break,
            Command::Help => print_help(),
            Command::Score => {
                let game = game.borrow();
                println!(
                    "Score: {} pts after {}/{} rounds",
                    game.total_score(),
                    game.completed_rounds(),
                    game.round_count()
                );
            }
            Command::Invalid(message) => println!("{}", message),
            Command::Empty => {}
            Command::Guess(_) | Command::Next | Command::Restart => {
                emit_command(&bus, &command);
            }
        }
        prompt();
    }

    let game = game.borrow();
    println!("Bye! Final score: {} pts", game.total_score());
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}
