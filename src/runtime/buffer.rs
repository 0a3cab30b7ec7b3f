//! Outbound send queue for the network connection.
//!
//! The socket is non-blocking, so a send can stop short. Bytes that the
//! kernel did not take stay queued, in order, until the socket reports
//! writable again. Nothing is ever dropped or reordered.

use std::io::{self, Write};

/// Pending bytes for the connection plus how many are already sent.
#[derive(Debug, Default)]
pub struct SendQueue {
    data: Vec<u8>,
    written: usize,
}

impl SendQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes still waiting to be sent.
    pub fn pending(&self) -> &[u8] {
        &self.data[self.written..]
    }

    pub fn is_empty(&self) -> bool {
        self.written == self.data.len()
    }

    /// Send as much as the writer accepts.
    ///
    /// Returns `Ok(true)` once the queue is drained and `Ok(false)` if the
    /// writer would block. Any other error is returned as is.
    pub fn flush_to<W: Write>(&mut self, conn: &mut W) -> io::Result<bool> {
        while !self.is_empty() {
            match conn.write(&self.data[self.written..]) {
                Ok(0) => {
                    return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0"));
                }
                Ok(n) => self.written += n,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        // Fully drained, reuse the allocation
        self.data.clear();
        self.written = 0;
        Ok(true)
    }
}

impl Write for SendQueue {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writer that accepts at most `budget` bytes, then would block.
    struct Throttled {
        out: Vec<u8>,
        budget: usize,
    }

    impl Write for Throttled {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "full"));
            }
            let n = buf.len().min(self.budget).min(2);
            self.out.extend_from_slice(&buf[..n]);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_flush_all() {
        let mut queue = SendQueue::new();
        queue.write_all(b"hello").unwrap();
        assert_eq!(queue.pending(), b"hello");

        let mut conn = Vec::new();
        assert!(queue.flush_to(&mut conn).unwrap());
        assert_eq!(conn, b"hello");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_partial_then_resume() {
        let mut queue = SendQueue::new();
        queue.write_all(b"abcdef").unwrap();

        let mut conn = Throttled {
            out: Vec::new(),
            budget: 3,
        };
        assert!(!queue.flush_to(&mut conn).unwrap());
        assert_eq!(conn.out, b"abc");
        assert_eq!(queue.pending(), b"def");

        // More bytes queued while blocked keep their order
        queue.write_all(b"gh").unwrap();
        conn.budget = 10;
        assert!(queue.flush_to(&mut conn).unwrap());
        assert_eq!(conn.out, b"abcdefgh");
    }

    #[test]
    fn test_write_zero_is_error() {
        struct Zero;
        impl Write for Zero {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut queue = SendQueue::new();
        queue.write_all(b"x").unwrap();
        let err = queue.flush_to(&mut Zero).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }
}
