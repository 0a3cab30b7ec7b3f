//! Client runtime.
//!
//! - `connection`: name resolution and connect
//! - `terminal`: non-blocking terminal input source
//! - `relay`: routes bytes between the two sides
//! - `buffer`: ordered send queue for the non-blocking socket
//! - `event_loop`: single-threaded mio readiness loop driving it all

mod buffer;
mod connection;
mod event_loop;
mod relay;
mod terminal;

pub(crate) use buffer::SendQueue;
pub(crate) use connection::connect;
pub(crate) use event_loop::EventLoop;
pub(crate) use relay::Relay;
pub(crate) use terminal::TerminalInput;

use crate::config::Config;
use crate::telnet::Negotiator;
use std::io;
use tracing::{info, warn};

/// How a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The server closed the connection.
    PeerClosed,
}

/// Fatal session failures. None of these are retried.
#[derive(Debug)]
pub enum SessionError {
    /// The readiness wait itself failed.
    Wait(io::Error),
    /// Reading from the connection failed.
    Receive(io::Error),
    /// Sending to the connection failed.
    Send(io::Error),
    /// Reading from the terminal failed.
    Terminal(io::Error),
    /// Writing to the terminal failed.
    Output(io::Error),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Wait(_) => write!(f, "Error waiting for input!"),
            SessionError::Receive(_) => write!(f, "Error reading from socket!"),
            SessionError::Send(_) => write!(f, "Error writing to socket!"),
            SessionError::Terminal(_) => write!(f, "Error reading from terminal!"),
            SessionError::Output(_) => write!(f, "Error writing to terminal!"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Wait(e)
            | SessionError::Receive(e)
            | SessionError::Send(e)
            | SessionError::Terminal(e)
            | SessionError::Output(e) => Some(e),
        }
    }
}

/// Connect to the configured host and relay until the session ends.
pub fn run(config: &Config) -> Result<SessionEnd, Box<dyn std::error::Error>> {
    let conn = connect(&config.host, config.port, config.connect_timeout)?;

    info!(peer = %conn.peer, "Connected");

    let terminal = match TerminalInput::stdin() {
        Ok(t) => Some(t),
        Err(e) => {
            warn!(error = %e, "Standard input unavailable, relaying server output only");
            None
        }
    };

    let mut event_loop = EventLoop::new(
        conn.stream,
        terminal,
        io::stdout(),
        Negotiator::new(config.window),
        config.poll_interval,
    )?;

    Ok(event_loop.run()?)
}
