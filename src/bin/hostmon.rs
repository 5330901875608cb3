//! hostmon - host network monitoring probe.
//!
//! Prints a header of column titles, then one line of interface and SNMP
//! counter deltas every `-i` seconds until terminated.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::process::ExitCode;
use std::sync::mpsc;

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use hostmon::config::Args;
use hostmon::{lifecycle, signals};

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
///
/// Logs go to stderr; stdout is reserved for the report stream.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::new(format!("hostmon={}", level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Startup banner: date, version and the command line as given.
fn log_banner() {
    let date = chrono::Local::now().format("%a %b %e %H:%M:%S %Y");
    let command_line: Vec<String> = std::env::args().collect();
    info!(
        "{} : hostmon {} Command line: {}",
        date,
        env!("CARGO_PKG_VERSION"),
        command_line.join(" ")
    );
}

fn main() -> ExitCode {
    // Handlers go in first so an interrupt at any later point still ends
    // in a clean shutdown. They only queue an event for the main loop.
    let (tx, rx) = mpsc::channel();
    let termination = signals::on_termination(tx.clone());
    let suspend = signals::on_suspend(tx.clone());

    let args = Args::parse();
    let config = args.into_config();

    init_logging(config.verbose, config.quiet);

    for installed in [termination, suspend] {
        if let Err(e) = installed {
            warn!("{}", e);
        }
    }
    if !config.quiet {
        log_banner();
    }

    match lifecycle::run(&config, &rx, &tx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
