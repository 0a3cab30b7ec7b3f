//! Option negotiation replies.
//!
//! Policy: refuse every option the server asks us to perform, permit every
//! option the server says it will perform. The one exception is `DO NAWS`,
//! which is answered with `WILL NAWS` and an immediate window-size report.

use super::{option_name, verb_name, Command, DO, IAC, NAWS, SB, SE, WILL, WONT};
use std::io::{self, Write};
use tracing::debug;

/// Default reported terminal width.
pub const DEFAULT_WIDTH: u16 = 80;
/// Default reported terminal height.
pub const DEFAULT_HEIGHT: u16 = 24;

/// Window size carried in the NAWS report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u16,
    pub height: u16,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

/// Map a single byte through the substitution policy.
///
/// `DO` becomes `WONT`, `WILL` becomes `DO`, everything else is unchanged.
pub fn substitute(byte: u8) -> u8 {
    match byte {
        DO => WONT,
        WILL => DO,
        other => other,
    }
}

/// Stateless responder for inbound command sequences.
#[derive(Debug, Clone, Default)]
pub struct Negotiator {
    window: WindowSize,
}

impl Negotiator {
    pub fn new(window: WindowSize) -> Self {
        Self { window }
    }

    /// True for the server's request that we report our window size.
    pub fn is_naws_request(cmd: &Command) -> bool {
        cmd[1] == DO && cmd[2] == NAWS
    }

    /// Build the reply for `cmd`. Nothing is remembered between calls.
    pub fn reply(&self, cmd: Command) -> Vec<u8> {
        if Self::is_naws_request(&cmd) {
            let mut out = vec![IAC, WILL, NAWS];
            out.extend_from_slice(&self.naws_report());
            return out;
        }

        cmd.iter().map(|&b| substitute(b)).collect()
    }

    /// Write the reply for `cmd` to the connection.
    pub fn negotiate<W: Write>(&self, cmd: Command, conn: &mut W) -> io::Result<()> {
        let reply = self.reply(cmd);

        debug!(
            verb = verb_name(cmd[1]),
            option = option_name(cmd[2]),
            reply_verb = verb_name(reply[1]),
            reply_len = reply.len(),
            "Negotiated option"
        );

        conn.write_all(&reply)
    }

    /// `IAC SB NAWS <width> <height> IAC SE`, each dimension as 16-bit
    /// big-endian with 255 bytes doubled.
    pub fn naws_report(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(13);
        out.extend_from_slice(&[IAC, SB, NAWS]);

        let w = self.window.width.to_be_bytes();
        let h = self.window.height.to_be_bytes();
        for b in w.into_iter().chain(h) {
            out.push(b);
            if b == IAC {
                out.push(IAC);
            }
        }

        out.extend_from_slice(&[IAC, SE]);
        out
    }
}
