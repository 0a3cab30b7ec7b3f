//! Byte routing between the connection and the terminal.
//!
//! Inbound bytes are either server output (copied to the terminal) or part
//! of a command sequence (answered by the negotiator). Outbound bytes are
//! keystrokes, copied to the connection verbatim.

use super::SessionError;
use crate::telnet::{CommandAssembler, Feed, Negotiator};
use std::io::Write;

/// Routing state carried across loop iterations.
#[derive(Debug, Default)]
pub struct Relay {
    assembler: CommandAssembler,
    negotiator: Negotiator,
}

impl Relay {
    pub fn new(negotiator: Negotiator) -> Self {
        Self {
            assembler: CommandAssembler::new(),
            negotiator,
        }
    }

    /// Handle bytes read from the connection, in arrival order.
    ///
    /// Terminal output is flushed before returning.
    pub fn network_input<C: Write, T: Write>(
        &mut self,
        input: &[u8],
        conn: &mut C,
        term: &mut T,
    ) -> Result<(), SessionError> {
        for &byte in input {
            match self.assembler.feed(byte) {
                Feed::Data(b) => term.write_all(&[b]).map_err(SessionError::Output)?,
                Feed::Pending => {}
                Feed::Command(cmd) => self
                    .negotiator
                    .negotiate(cmd, conn)
                    .map_err(SessionError::Send)?,
            }
        }

        term.flush().map_err(SessionError::Output)
    }

    /// Handle keystrokes read from the terminal.
    ///
    /// Each byte goes to the connection unchanged. A newline also puts a
    /// carriage return on the local terminal only.
    pub fn terminal_input<C: Write, T: Write>(
        &mut self,
        input: &[u8],
        conn: &mut C,
        term: &mut T,
    ) -> Result<(), SessionError> {
        for &byte in input {
            conn.write_all(&[byte]).map_err(SessionError::Send)?;
            if byte == b'\n' {
                term.write_all(b"\r").map_err(SessionError::Output)?;
            }
        }

        term.flush().map_err(SessionError::Output)
    }

    /// True while a command sequence is split across reads.
    pub fn mid_command(&self) -> bool {
        self.assembler.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telnet::{DO, IAC, NAWS, WILL, WONT};

    #[test]
    fn test_server_text_to_terminal() {
        let mut relay = Relay::default();
        let (mut conn, mut term) = (Vec::new(), Vec::new());

        for &b in b"hello\n" {
            relay.network_input(&[b], &mut conn, &mut term).unwrap();
        }

        assert_eq!(term, b"hello\n");
        assert!(conn.is_empty());
    }

    #[test]
    fn test_commands_are_not_printed() {
        let mut relay = Relay::default();
        let (mut conn, mut term) = (Vec::new(), Vec::new());

        relay
            .network_input(&[b'a', IAC, DO, 24, b'b', IAC, WILL, 1, b'c'], &mut conn, &mut term)
            .unwrap();

        assert_eq!(term, b"abc");
        assert_eq!(conn, vec![IAC, WONT, 24, IAC, DO, 1]);
    }

    #[test]
    fn test_command_split_across_reads() {
        let mut relay = Relay::default();
        let (mut conn, mut term) = (Vec::new(), Vec::new());

        relay.network_input(&[b'x', IAC], &mut conn, &mut term).unwrap();
        assert!(relay.mid_command());
        assert!(conn.is_empty());

        relay.network_input(&[DO], &mut conn, &mut term).unwrap();
        relay.network_input(&[NAWS, b'y'], &mut conn, &mut term).unwrap();
        assert!(!relay.mid_command());

        assert_eq!(term, b"xy");
        assert_eq!(
            conn,
            vec![255, 251, 31, 255, 250, 31, 0, 80, 0, 24, 255, 240]
        );
    }

    #[test]
    fn test_keystrokes_to_connection() {
        let mut relay = Relay::default();
        let (mut conn, mut term) = (Vec::new(), Vec::new());

        relay.terminal_input(b"hi\n", &mut conn, &mut term).unwrap();

        assert_eq!(conn, b"hi\n");
        assert_eq!(term, b"\r");
    }

    #[test]
    fn test_byte_order_per_direction() {
        let mut relay = Relay::default();
        let (mut conn, mut term) = (Vec::new(), Vec::new());

        let server = b"server output";
        let keys = b"typed";
        for i in 0..server.len().max(keys.len()) {
            if let Some(&k) = keys.get(i) {
                relay.terminal_input(&[k], &mut conn, &mut term).unwrap();
            }
            if let Some(&s) = server.get(i) {
                relay.network_input(&[s], &mut conn, &mut term).unwrap();
            }
        }

        assert_eq!(term, server);
        assert_eq!(conn, keys);
    }
}
