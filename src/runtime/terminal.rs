//! Terminal input source.
//!
//! Wraps the input file descriptor (normally stdin) so it can sit in the
//! same `mio::Poll` as the socket. The descriptor stays in blocking mode:
//! on a tty, stdin shares its open file description with stdout, and the
//! session's output must keep blocking while the terminal catches up.
//! Reads are only issued after a zero-timeout `poll(2)` reports input, so
//! they return immediately.

use mio::event::Source;
use mio::unix::SourceFd;
use mio::{Interest, Registry, Token};
use std::io::{self, Read};
use std::os::unix::io::{AsRawFd, RawFd};

/// Non-owning handle on the terminal input fd.
#[derive(Debug)]
pub struct TerminalInput {
    fd: RawFd,
}

impl TerminalInput {
    /// Process standard input.
    pub fn stdin() -> io::Result<Self> {
        Self::from_fd(libc::STDIN_FILENO)
    }

    /// Wrap `fd` without changing its flags. The caller keeps ownership.
    pub fn from_fd(fd: RawFd) -> io::Result<Self> {
        // SAFETY: fcntl on a caller-provided fd; failures are reported via errno.
        if unsafe { libc::fcntl(fd, libc::F_GETFL) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { fd })
    }

    /// True when a read would return without blocking, including at EOF.
    pub fn has_input(&self) -> io::Result<bool> {
        let mut pfd = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };

        loop {
            // SAFETY: one valid pollfd, zero timeout.
            let rc = unsafe { libc::poll(&mut pfd, 1, 0) };
            if rc < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            break;
        }

        if pfd.revents & libc::POLLNVAL != 0 {
            return Err(io::Error::from_raw_os_error(libc::EBADF));
        }
        Ok(pfd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0)
    }

    /// Read what is available now. `Ok(None)` means nothing is waiting.
    pub fn try_read(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        if !self.has_input()? {
            return Ok(None);
        }
        self.read(buf).map(Some)
    }
}

impl Read for TerminalInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // SAFETY: buf is valid for writes of buf.len() bytes.
        let n = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }
}

impl AsRawFd for TerminalInput {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Source for TerminalInput {
    fn register(&mut self, registry: &Registry, token: Token, interests: Interest) -> io::Result<()> {
        SourceFd(&self.fd).register(registry, token, interests)
    }

    fn reregister(
        &mut self,
        registry: &Registry,
        token: Token,
        interests: Interest,
    ) -> io::Result<()> {
        SourceFd(&self.fd).reregister(registry, token, interests)
    }

    fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        SourceFd(&self.fd).deregister(registry)
    }
}
