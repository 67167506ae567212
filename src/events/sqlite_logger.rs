//! SQLite Event Logger - persistent record of everything on the bus
//!
//! Every bus event becomes a row in `events`. Games are grouped in `games`:
//! a row is opened on the first RoundStarted of a game and closed with the
//! total score on GameEnded.

use rusqlite::{Connection, OptionalExtension, params};
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use tracing::{info, warn};

use super::bus::{EventBus, ListenerId};
use super::types::GameEvent;

/// Logger writing bus events to a SQLite database
///
/// Single-threaded like the bus it listens to.
pub struct SqliteEventLogger {
    /// None when logging is disabled
    conn: Option<Connection>,
    session_id: String,
    current_game_id: Cell<Option<i64>>,
    /// Per-session event sequence number
    sequence: Cell<u64>,
}

impl SqliteEventLogger {
    /// Open (or create) the database at `db_path` and start a session
    ///
    /// `session_type` is free-form ("game", "simulation", "scenario").
    pub fn new(db_path: &Path, session_type: &str) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(db_path)?;

        // Enable WAL mode for concurrent reads during writes
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Self::with_connection(conn, session_type)
    }

    /// Logger backed by a private in-memory database
    pub fn in_memory(session_type: &str) -> Result<Self, rusqlite::Error> {
        Self::with_connection(Connection::open_in_memory()?, session_type)
    }

    /// Logger that drops everything
    pub fn disabled() -> Self {
        Self {
            conn: None,
            session_id: String::new(),
            current_game_id: Cell::new(None),
            sequence: Cell::new(0),
        }
    }

    fn with_connection(conn: Connection, session_type: &str) -> Result<Self, rusqlite::Error> {
        init_schema(&conn)?;
        let session_id = create_session(&conn, session_type)?;
        info!("Event logging session {} ({})", &session_id[..8], session_type);

        Ok(Self {
            conn: Some(conn),
            session_id,
            current_game_id: Cell::new(None),
            sequence: Cell::new(0),
        })
    }

    /// Subscribe the logger to every event on `bus`
    pub fn attach(self: &Rc<Self>, bus: &EventBus) -> ListenerId {
        let logger = Rc::clone(self);
        bus.on_any(move |event| logger.log_event(event))
    }

    /// Record one event, opening/closing the game row as needed
    pub fn log_event(&self, event: &GameEvent) {
        let Some(conn) = &self.conn else {
            return;
        };

        if let GameEvent::RoundStarted(started) = event
            && self.current_game_id.get().is_none()
        {
            self.start_game(conn, started.round_count);
        }

        let seq = self.sequence.get() + 1;
        self.sequence.set(seq);

        if let Err(e) = conn.execute(
            "INSERT INTO events (session_id, game_id, seq, event_type, data) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.session_id,
                self.current_game_id.get(),
                seq as i64,
                event.name(),
                event.payload_json(),
            ],
        ) {
            warn!("Failed to log event: {}", e);
        }

        if let GameEvent::GameEnded(ended) = event {
            self.end_game(conn, ended.0.total_score);
        }
    }

    fn start_game(&self, conn: &Connection, round_count: usize) {
        let started_at = chrono::Utc::now().to_rfc3339();
        let result = conn.execute(
            "INSERT INTO games (session_id, started_at, round_count) VALUES (?1, ?2, ?3)",
            params![self.session_id, started_at, round_count as i64],
        );

        match result {
            Ok(_) => {
                let game_id = conn.last_insert_rowid();
                self.current_game_id.set(Some(game_id));
                info!("Started game {} ({} rounds)", game_id, round_count);
            }
            Err(e) => warn!("Failed to start game: {}", e),
        }
    }

    fn end_game(&self, conn: &Connection, total_score: u64) {
        let Some(game_id) = self.current_game_id.take() else {
            return;
        };
        let ended_at = chrono::Utc::now().to_rfc3339();
        // SQLite integers are signed 64-bit
        let stored = i64::try_from(total_score).unwrap_or(i64::MAX);

        match conn.execute(
            "UPDATE games SET ended_at = ?1, total_score = ?2 WHERE id = ?3",
            params![ended_at, stored, game_id],
        ) {
            Ok(_) => info!("Ended game {} (total score: {})", game_id, total_score),
            Err(e) => warn!("Failed to end game: {}", e),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    pub fn current_game_id(&self) -> Option<i64> {
        self.current_game_id.get()
    }

    /// Events logged in this session
    pub fn event_count(&self) -> Option<u64> {
        let conn = self.conn.as_ref()?;
        conn.query_row(
            "SELECT COUNT(*) FROM events WHERE session_id = ?1",
            params![self.session_id],
            |row| row.get::<_, i64>(0),
        )
        .ok()
        .map(|n| n as u64)
    }

    /// Total score stored for a finished game
    pub fn game_total(&self, game_id: i64) -> Option<u64> {
        let conn = self.conn.as_ref()?;
        conn.query_row(
            "SELECT total_score FROM games WHERE id = ?1",
            params![game_id],
            |row| row.get::<_, Option<i64>>(0),
        )
        .optional()
        .ok()
        .flatten()
        .flatten()
        .and_then(|total| u64::try_from(total).ok())
    }

    /// Event wire names for a game, in logged order
    pub fn game_event_names(&self, game_id: i64) -> Vec<String> {
        let Some(conn) = &self.conn else {
            return Vec::new();
        };
        let mut stmt = match conn.prepare("SELECT event_type FROM events WHERE game_id = ?1 ORDER BY seq") {
            Ok(stmt) => stmt,
            Err(e) => {
                warn!("Failed to query events: {}", e);
                return Vec::new();
            }
        };
        let names: Vec<String> = stmt
            .query_map(params![game_id], |row| row.get::<_, String>(0))
            .map(|rows| rows.filter_map(Result::ok).collect())
            .unwrap_or_default();
        names
    }
}

/// Initialize the database schema
fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            session_type TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS games (
            id INTEGER PRIMARY KEY,
            session_id TEXT REFERENCES sessions(id),
            started_at TEXT NOT NULL,
            ended_at TEXT,
            round_count INTEGER NOT NULL,
            total_score INTEGER
        );

        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY,
            session_id TEXT REFERENCES sessions(id),
            game_id INTEGER REFERENCES games(id),
            seq INTEGER NOT NULL,
            event_type TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_games_session ON games(session_id);
        CREATE INDEX IF NOT EXISTS idx_events_game ON events(game_id);
        CREATE INDEX IF NOT EXISTS idx_events_type ON events(event_type);
        "#,
    )?;
    Ok(())
}

/// Create a new session and return its ID
fn create_session(conn: &Connection, session_type: &str) -> Result<String, rusqlite::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let created_at = chrono::Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO sessions (id, created_at, session_type) VALUES (?1, ?2, ?3)",
        params![id, created_at, session_type],
    )?;

    Ok(id)
}
