//! Command-sequence assembly.
//!
//! Splits the inbound byte stream into data bytes and 3-byte command
//! sequences. A sequence may arrive fragmented across reads; the partial
//! sequence is carried until its remaining bytes show up.

use super::{Command, COMMAND_LEN, IAC};

/// Result of feeding one inbound byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// Ordinary server output.
    Data(u8),
    /// Byte consumed into an incomplete command sequence.
    Pending,
    /// A full `IAC <verb> <option>` sequence.
    Command(Command),
}

/// Accumulates command bytes between reads.
#[derive(Debug, Default)]
pub struct CommandAssembler {
    buf: Command,
    filled: usize,
}

impl CommandAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify the next inbound byte.
    ///
    /// Every byte following an `IAC` belongs to the sequence, including a
    /// second `IAC`. Escaped literal 255s are not unescaped here.
    pub fn feed(&mut self, byte: u8) -> Feed {
        if self.filled == 0 {
            if byte != IAC {
                return Feed::Data(byte);
            }
            self.buf[0] = byte;
            self.filled = 1;
            return Feed::Pending;
        }

        self.buf[self.filled] = byte;
        self.filled += 1;

        if self.filled < COMMAND_LEN {
            return Feed::Pending;
        }

        self.filled = 0;
        Feed::Command(self.buf)
    }

    /// True while a sequence has started but is not complete.
    pub fn is_pending(&self) -> bool {
        self.filled > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telnet::{DO, NAWS, WILL};

    #[test]
    fn test_plain_data() {
        let mut asm = CommandAssembler::new();
        for &b in b"hello\n" {
            assert_eq!(asm.feed(b), Feed::Data(b));
        }
        assert!(!asm.is_pending());
    }

    #[test]
    fn test_command_sequence() {
        let mut asm = CommandAssembler::new();
        assert_eq!(asm.feed(IAC), Feed::Pending);
        assert_eq!(asm.feed(DO), Feed::Pending);
        match asm.feed(NAWS) {
            Feed::Command(cmd) => assert_eq!(cmd, [IAC, DO, NAWS]),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(!asm.is_pending());
    }

    #[test]
    fn test_fragmented_sequence_with_data_around() {
        let mut asm = CommandAssembler::new();
        assert_eq!(asm.feed(b'a'), Feed::Data(b'a'));

        // First read ends after the escape byte.
        assert_eq!(asm.feed(IAC), Feed::Pending);
        assert!(asm.is_pending());

        // Next read carries the rest.
        assert_eq!(asm.feed(WILL), Feed::Pending);
        assert_eq!(asm.feed(1), Feed::Command([IAC, WILL, 1]));
        assert_eq!(asm.feed(b'b'), Feed::Data(b'b'));
    }

    #[test]
    fn test_escaped_iac_is_a_sequence() {
        let mut asm = CommandAssembler::new();
        assert_eq!(asm.feed(IAC), Feed::Pending);
        assert_eq!(asm.feed(IAC), Feed::Pending);
        assert_eq!(asm.feed(b'x'), Feed::Command([IAC, IAC, b'x']));
    }
}
