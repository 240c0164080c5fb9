use std::fmt;

/// Errors surfaced by the ring engine. Each variant either recovers locally or is
/// fatal at startup; there is no retry taxonomy beyond what the router already
/// implements for NAK handling.
#[derive(Debug)]
pub enum RingError {
    /// The config file did not have the expected shape.
    Config(String),
    /// Inbound bytes did not parse as a data packet.
    MalformedPacket(String),
}

impl fmt::Display for RingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RingError::Config(msg) => write!(f, "configuration error: {}", msg),
            RingError::MalformedPacket(msg) => write!(f, "malformed packet: {}", msg),
        }
    }
}

impl std::error::Error for RingError {}
