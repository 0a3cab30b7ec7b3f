//! Connection setup.
//!
//! Resolves the host with the system resolver and tries each candidate
//! address in order until one connects.

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::debug;

/// A connected stream and the address it reached.
#[derive(Debug)]
pub struct Connection {
    pub stream: TcpStream,
    pub peer: SocketAddr,
}

/// Establish a connection to `host:port`.
pub fn connect(host: &str, port: u16, timeout: Option<Duration>) -> Result<Connection, ConnectError> {
    let candidates: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(ConnectError::Resolve)?
        .collect();

    if candidates.is_empty() {
        return Err(ConnectError::Resolve(io::Error::new(
            io::ErrorKind::NotFound,
            "no addresses",
        )));
    }

    connect_any(&candidates, timeout)
}

/// Try `candidates` in order and return the first that connects.
pub fn connect_any(
    candidates: &[SocketAddr],
    timeout: Option<Duration>,
) -> Result<Connection, ConnectError> {
    let mut last_error = None;

    for &addr in candidates {
        match connect_one(addr, timeout) {
            Ok(stream) => {
                debug!(peer = %addr, "Connected");
                return Ok(Connection { stream, peer: addr });
            }
            Err(e) => {
                debug!(peer = %addr, error = %e, "Connect attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(ConnectError::Unreachable(last_error))
}

fn connect_one(addr: SocketAddr, timeout: Option<Duration>) -> io::Result<TcpStream> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;

    match timeout {
        Some(t) => socket.connect_timeout(&addr.into(), t)?,
        None => socket.connect(&addr.into())?,
    }

    // Keystrokes go out one at a time
    socket.set_nodelay(true)?;

    Ok(socket.into())
}

/// Connection setup errors
#[derive(Debug)]
pub enum ConnectError {
    /// Name resolution failed or produced no addresses.
    Resolve(io::Error),
    /// No candidate address accepted the connection.
    Unreachable(Option<io::Error>),
}

impl std::fmt::Display for ConnectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectError::Resolve(_) => write!(f, "Failed to retrieve the ip address!"),
            ConnectError::Unreachable(_) => write!(f, "Failed to connect to the server!"),
        }
    }
}

impl std::error::Error for ConnectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectError::Resolve(e) => Some(e),
            ConnectError::Unreachable(e) => e.as_ref().map(|e| e as _),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn closed_port() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    }

    #[test]
    fn test_connect_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let conn = connect("127.0.0.1", port, None).unwrap();
        assert_eq!(conn.peer.port(), port);
        assert!(conn.stream.nodelay().unwrap());
    }

    #[test]
    fn test_falls_through_to_next_candidate() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let good = listener.local_addr().unwrap();
        let bad = closed_port();

        let conn = connect_any(&[bad, good], Some(Duration::from_secs(2))).unwrap();
        assert_eq!(conn.peer, good);
    }

    #[test]
    fn test_unreachable() {
        let bad = closed_port();
        match connect_any(&[bad], None) {
            Err(ConnectError::Unreachable(Some(_))) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_no_candidates() {
        match connect_any(&[], None) {
            Err(ConnectError::Unreachable(None)) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_messages() {
        let resolve = ConnectError::Resolve(io::Error::new(io::ErrorKind::NotFound, "x"));
        assert_eq!(resolve.to_string(), "Failed to retrieve the ip address!");
        assert_eq!(
            ConnectError::Unreachable(None).to_string(),
            "Failed to connect to the server!"
        );
    }
}
