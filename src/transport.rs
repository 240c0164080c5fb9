//! The UDP transport boundary. `neutronium::net::endpoint::Endpoint` wraps a
//! `mio::net::TcpListener` behind a poll loop; a ring node instead wants N
//! independent blocking threads each with their own timeout, so this wraps
//! `std::net::UdpSocket` with `set_read_timeout` rather
//! than a reactor. The narrow `Transport` trait exists so the engine's core
//! can be driven by an in-memory fake in tests.

use crate::timing::RECV_BUFFER_SIZE;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Mutex;
use std::time::Duration;

/// Everything the engine needs from the network.
pub trait Transport: Send + Sync {
    fn send_to(&self, addr: SocketAddr, bytes: &[u8]) -> io::Result<()>;

    /// Blocks up to `timeout` for a datagram. `Ok(None)` means the read
    /// timed out with nothing received; it is not an error.
    fn recv_timeout(&self, timeout: Duration) -> io::Result<Option<(Vec<u8>, SocketAddr)>>;
}

/// Production transport backed by a real UDP socket.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    pub fn bind(port: u16) -> io::Result<UdpTransport> {
        let socket = UdpSocket::bind(("0.0.0.0", port))?;
        socket.set_read_timeout(Some(Duration::from_secs(1)))?;
        Ok(UdpTransport { socket })
    }
}

impl Transport for UdpTransport {
    fn send_to(&self, addr: SocketAddr, bytes: &[u8]) -> io::Result<()> {
        self.socket.send_to(bytes, addr)?;
        Ok(())
    }

    fn recv_timeout(&self, timeout: Duration) -> io::Result<Option<(Vec<u8>, SocketAddr)>> {
        self.socket.set_read_timeout(Some(timeout))?;
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        match self.socket.recv_from(&mut buf) {
            Ok((len, addr)) => Ok(Some((buf[..len].to_vec(), addr))),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock || err.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// A recording fake transport for unit tests, so the router and token
/// machine can be exercised without a real socket.
#[cfg(any(test, feature = "test-util"))]
pub struct FakeTransport {
    pub sent: Mutex<Vec<(SocketAddr, Vec<u8>)>>,
    pub inbound: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
}

#[cfg(any(test, feature = "test-util"))]
impl FakeTransport {
    pub fn new() -> FakeTransport {
        FakeTransport {
            sent: Mutex::new(Vec::new()),
            inbound: Mutex::new(Vec::new()),
        }
    }

    pub fn push_inbound(&self, bytes: &[u8], from: SocketAddr) {
        self.inbound.lock().unwrap().push((bytes.to_vec(), from));
    }

    pub fn sent_messages(&self) -> Vec<(SocketAddr, Vec<u8>)> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Transport for FakeTransport {
    fn send_to(&self, addr: SocketAddr, bytes: &[u8]) -> io::Result<()> {
        self.sent.lock().unwrap().push((addr, bytes.to_vec()));
        Ok(())
    }

    fn recv_timeout(&self, _timeout: Duration) -> io::Result<Option<(Vec<u8>, SocketAddr)>> {
        Ok(self.inbound.lock().unwrap().pop())
    }
}
