//! TELNET protocol subset.
//!
//! Only the pieces an interactive client needs to keep a server happy:
//! - `IAC <verb> <option>` command sequences
//! - A fixed refusal/permission policy for option offers
//! - A NAWS (RFC 1073) window-size report when the server asks for one
//!
//! ## Wire Format
//!
//! ```text
//! Command:  IAC <DO|DONT|WILL|WONT|SB> <option>
//! NAWS:     IAC SB NAWS <w-hi> <w-lo> <h-hi> <h-lo> IAC SE
//! ```
//!
//! There is no per-option state machine. Subnegotiation payloads other than
//! our own NAWS report are not buffered.

pub mod negotiator;
pub mod parser;

pub use negotiator::{Negotiator, WindowSize};
pub use parser::{CommandAssembler, Feed};

/// Interpret as command.
pub const IAC: u8 = 255;
/// You are not to use option.
pub const DONT: u8 = 254;
/// Please, you use option.
pub const DO: u8 = 253;
/// I won't use option.
pub const WONT: u8 = 252;
/// I will use option.
pub const WILL: u8 = 251;
/// Begin subnegotiation.
pub const SB: u8 = 250;
/// End subnegotiation.
pub const SE: u8 = 240;

/// Negotiate About Window Size.
pub const NAWS: u8 = 31;

/// Length of a command sequence on the wire.
pub const COMMAND_LEN: usize = 3;

/// A complete `IAC <verb> <option>` sequence as read from the wire.
pub type Command = [u8; COMMAND_LEN];

/// Human-readable name of a verb byte, for logging.
pub fn verb_name(byte: u8) -> &'static str {
    match byte {
        IAC => "IAC",
        DONT => "DONT",
        DO => "DO",
        WONT => "WONT",
        WILL => "WILL",
        SB => "SB",
        SE => "SE",
        _ => "?",
    }
}

/// Human-readable name of an option byte, for logging.
pub fn option_name(byte: u8) -> &'static str {
    match byte {
        0 => "BINARY",
        1 => "ECHO",
        3 => "SGA",
        5 => "STATUS",
        6 => "TIMING-MARK",
        24 => "TTYPE",
        NAWS => "NAWS",
        32 => "TSPEED",
        33 => "LFLOW",
        34 => "LINEMODE",
        36 => "ENVIRON",
        39 => "NEW-ENVIRON",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        assert_eq!([IAC, DONT, DO, WONT, WILL, SB, SE], [255, 254, 253, 252, 251, 250, 240]);
        assert_eq!(NAWS, 31);
    }

    #[test]
    fn test_names() {
        assert_eq!(verb_name(DO), "DO");
        assert_eq!(verb_name(42), "?");
        assert_eq!(option_name(NAWS), "NAWS");
        assert_eq!(option_name(24), "TTYPE");
        assert_eq!(option_name(200), "UNKNOWN");
    }
}
