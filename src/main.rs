//! telnetc: A minimal interactive TELNET client
//!
//! Connects to a server, relays keystrokes and server output between the
//! terminal and the socket, and answers option negotiation with a fixed
//! policy:
//! - `DO <opt>` is refused with `WONT <opt>`
//! - `WILL <opt>` is permitted with `DO <opt>`
//! - `DO NAWS` is accepted and followed by a window-size report
//!
//! Exit status is 0 when the server hangs up and 1 on any failure.

mod config;
mod runtime;
mod telnet;

use config::Config;
use runtime::SessionEnd;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) if e.is_informational() => {
            print!("{e}");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging; stdout belongs to the session
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(
        host = %config.host,
        port = config.port,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        width = config.window.width,
        height = config.window.height,
        "Starting telnetc"
    );

    match runtime::run(&config) {
        Ok(SessionEnd::PeerClosed) => {
            println!("Server hung up!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
