//! mio event loop implementation.
//!
//! Readiness-based model: poll tells us when the socket or the terminal is
//! ready, then we perform non-blocking reads.
//! Uses epoll on Linux, kqueue on macOS.
//!
//! One thread, two sources, one wait per iteration. Each iteration reads at
//! most one chunk from each source, network first, so a busy server cannot
//! starve the keyboard. mio is edge-triggered: a source that may still hold
//! data stays marked pending and the next wait does not block. Otherwise
//! the wait is bounded by the poll interval and an empty wake-up just waits
//! again. While the send queue is over its cap, neither source is read.

use super::{Relay, SendQueue, SessionEnd, SessionError, TerminalInput};
use crate::telnet::Negotiator;
use mio::net::TcpStream;
use mio::{Events, Interest, Poll, Token};
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::{debug, trace, warn};

const NETWORK: Token = Token(0);
const TERMINAL: Token = Token(1);

/// Read buffer size for either source
const READ_BUF_SIZE: usize = 4096;

/// Reads pause while more than this many bytes wait to be sent
const MAX_PENDING_SEND: usize = 64 * 1024;

/// Owns both ends of the session for its whole lifetime.
pub struct EventLoop<O: Write> {
    poll: Poll,
    stream: TcpStream,
    terminal: Option<TerminalInput>,
    output: O,
    relay: Relay,
    outbound: SendQueue,
    /// WRITABLE interest is registered while the send queue is backed up.
    write_interest: bool,
    /// The socket may hold unread data.
    network_pending: bool,
    /// The terminal may hold unread input.
    terminal_pending: bool,
    poll_interval: Duration,
}

impl<O: Write> EventLoop<O> {
    /// Register the connection and, if it can be watched, the terminal.
    pub fn new(
        stream: std::net::TcpStream,
        terminal: Option<TerminalInput>,
        output: O,
        negotiator: Negotiator,
        poll_interval: Duration,
    ) -> io::Result<Self> {
        let poll = Poll::new()?;

        stream.set_nonblocking(true)?;
        let mut stream = TcpStream::from_std(stream);
        poll.registry()
            .register(&mut stream, NETWORK, Interest::READABLE)?;

        // Regular files and /dev/null cannot be polled
        let terminal = match terminal {
            Some(mut t) => match poll.registry().register(&mut t, TERMINAL, Interest::READABLE) {
                Ok(()) => Some(t),
                Err(e) => {
                    warn!(error = %e, "Terminal input cannot be watched, relaying server output only");
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            poll,
            stream,
            terminal,
            output,
            relay: Relay::new(negotiator),
            outbound: SendQueue::new(),
            write_interest: false,
            network_pending: false,
            terminal_pending: false,
            poll_interval,
        })
    }

    /// Relay until the peer hangs up or something fails.
    pub fn run(&mut self) -> Result<SessionEnd, SessionError> {
        let mut events = Events::with_capacity(8);

        loop {
            // Fresh timeout every iteration
            let timeout = if self.can_read_pending() {
                Duration::ZERO
            } else {
                self.poll_interval
            };

            if let Err(e) = self.poll.poll(&mut events, Some(timeout)) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(SessionError::Wait(e));
            }

            let mut network_writable = false;

            for event in events.iter() {
                let ready = event.is_readable() || event.is_read_closed() || event.is_error();
                match event.token() {
                    NETWORK => {
                        self.network_pending |= ready;
                        network_writable |= event.is_writable();
                    }
                    TERMINAL => self.terminal_pending |= ready,
                    _ => {}
                }
            }

            if network_writable {
                self.flush_outbound()?;
            }

            if !self.can_read_pending() {
                if events.is_empty() {
                    trace!("Idle");
                }
                continue;
            }

            if self.network_pending && !self.backed_up() {
                if let Some(end) = self.service_network()? {
                    return Ok(end);
                }
            }

            if self.terminal_pending && !self.backed_up() {
                self.service_terminal()?;
            }

            self.flush_outbound()?;
        }
    }

    /// More than the cap is waiting to be sent.
    fn backed_up(&self) -> bool {
        self.outbound.pending().len() > MAX_PENDING_SEND
    }

    /// Some source may hold data and reading is allowed.
    fn can_read_pending(&self) -> bool {
        (self.network_pending || self.terminal_pending) && !self.backed_up()
    }

    /// Read one chunk from the socket. Returns `Some` once the peer has
    /// hung up.
    fn service_network(&mut self) -> Result<Option<SessionEnd>, SessionError> {
        let mut buf = [0u8; READ_BUF_SIZE];

        let n = loop {
            match self.stream.read(&mut buf) {
                Ok(0) => {
                    if self.relay.mid_command() {
                        debug!("Peer closed in the middle of a command sequence");
                    }
                    return Ok(Some(SessionEnd::PeerClosed));
                }
                Ok(n) => break n,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.network_pending = false;
                    return Ok(None);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(SessionError::Receive(e)),
            }
        };

        trace!(bytes = n, "Network input");
        self.relay
            .network_input(&buf[..n], &mut self.outbound, &mut self.output)?;

        // Negotiation replies go out before the next read
        self.flush_outbound()?;
        Ok(None)
    }

    /// Read one chunk from the terminal.
    fn service_terminal(&mut self) -> Result<(), SessionError> {
        let mut buf = [0u8; READ_BUF_SIZE];

        let Some(terminal) = self.terminal.as_mut() else {
            self.terminal_pending = false;
            return Ok(());
        };

        let n = match terminal.try_read(&mut buf) {
            Ok(Some(n)) => n,
            Ok(None) => {
                self.terminal_pending = false;
                return Ok(());
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => return Ok(()),
            Err(e) => return Err(SessionError::Terminal(e)),
        };

        if n == 0 {
            self.close_terminal();
            return Ok(());
        }

        trace!(bytes = n, "Terminal input");
        self.relay
            .terminal_input(&buf[..n], &mut self.outbound, &mut self.output)
    }

    /// Stop watching the terminal after end of input.
    fn close_terminal(&mut self) {
        self.terminal_pending = false;
        if let Some(mut terminal) = self.terminal.take() {
            if let Err(e) = self.poll.registry().deregister(&mut terminal) {
                debug!(error = %e, "Failed to deregister terminal");
            }
            debug!("Terminal input closed, relaying server output only");
        }
    }

    /// Push queued bytes to the socket, toggling WRITABLE interest while
    /// the kernel buffer is full.
    fn flush_outbound(&mut self) -> Result<(), SessionError> {
        let drained = self
            .outbound
            .flush_to(&mut self.stream)
            .map_err(SessionError::Send)?;

        if !drained {
            trace!(pending = self.outbound.pending().len(), "Send queue backed up");
        }

        if drained == self.write_interest {
            let interest = if drained {
                Interest::READABLE
            } else {
                Interest::READABLE | Interest::WRITABLE
            };
            self.poll
                .registry()
                .reregister(&mut self.stream, NETWORK, interest)
                .map_err(SessionError::Wait)?;
            self.write_interest = !drained;
        }

        Ok(())
    }

    #[cfg(test)]
    fn output(&self) -> &O {
        &self.output
    }
}
