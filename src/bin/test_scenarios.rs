//! Scenario test runner CLI
//!
//! Usage:
//!   cargo run --bin test-scenarios                      # Run all scenarios
//!   cargo run --bin test-scenarios -- restart/          # Run one category
//!   cargo run --bin test-scenarios -- game/two_rounds   # Run a single scenario
//!   cargo run --bin test-scenarios -- --verbose         # Show expected/actual on failure

use std::env;
use std::path::Path;

use geoguess::logging::{LogConfig, init_logging};
use geoguess::testing::{
    SCENARIOS_DIR, TestResult, discover_scenarios, parser::parse_scenario_file, run_scenario,
};

#[derive(Default)]
struct Tally {
    passed: usize,
    failed: usize,
    errors: usize,
}

fn main() {
    let args: Vec<String> = env::args().collect();
    init_logging(&LogConfig::load_with_args(&args));

    let (verbose, filter) = parse_flags(&args);

    println!("Scenario Tests");
    println!("==============\n");

    let base = Path::new(SCENARIOS_DIR);
    if !base.is_dir() {
        println!("No scenarios directory found at {}", SCENARIOS_DIR);
        std::process::exit(1);
    }

    let scenarios = discover_scenarios(base, filter.as_deref());
    if scenarios.is_empty() {
        println!("No scenario files found{}", filter.map(|f| format!(" matching '{}'", f)).unwrap_or_default());
        std::process::exit(1);
    }

    let mut tally = Tally::default();
    let mut category = String::new();

    for path in &scenarios {
        let rel = path.strip_prefix(base).unwrap_or(path);

        let dir = rel.parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default();
        if dir != category {
            if !dir.is_empty() {
                println!("{}{}/", if category.is_empty() { "" } else { "\n" }, dir);
            }
            category = dir;
        }

        let name = rel
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let result = match parse_scenario_file(path) {
            Ok(scenario) => run_scenario(&scenario),
            Err(message) => TestResult::Error { message },
        };

        match &result {
            TestResult::Pass { .. } => tally.passed += 1,
            TestResult::Fail { .. } => tally.failed += 1,
            TestResult::Error { .. } => tally.errors += 1,
        }
        print_result(&name, &result, verbose);
    }

    println!("\n==============");
    println!(
        "Results: {} passed, {} failed, {} errors",
        tally.passed, tally.failed, tally.errors
    );

    if tally.failed > 0 || tally.errors > 0 {
        std::process::exit(1);
    }
}

/// `--verbose` plus the first positional argument as a path filter
fn parse_flags(args: &[String]) -> (bool, Option<String>) {
    let rest = || args.iter().skip(1);
    let verbose = rest().any(|a| a == "--verbose" || a == "-v");
    let filter = rest().find(|a| !a.starts_with('-')).cloned();
    (verbose, filter)
}

fn print_result(name: &str, result: &TestResult, verbose: bool) {
    let dots = ".".repeat(40 - name.len().min(39));

    match result {
        TestResult::Pass { steps, events } => {
            println!("  {} {} PASS ({} steps, {} events)", name, dots, steps, events);
        }
        TestResult::Fail { error } => {
            println!("  {} {} FAIL", name, dots);
            if verbose {
                println!("    {}", error);
            } else {
                println!("    {}", error.message);
            }
        }
        TestResult::Error { message } => {
            println!("  {} {} ERROR", name, dots);
            println!("    {}", message);
        }
    }
}
