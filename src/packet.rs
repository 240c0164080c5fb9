//! Wire encoding for the two packet kinds that travel the ring: the token and
//! data packets. Mirrors the tagged-dispatch shape of `neutronium::net::frame`,
//! but the wire form here is plain UTF-8 text rather than a binary header.

use crate::error::RingError;

pub const TOKEN_WIRE: &str = "1000";
const DATA_TAG: &str = "2000";

/// Delivery outcome recorded on a data packet.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Status {
    /// Initial value: the destination has not yet been claimed by any node.
    NoSuchDestination,
    Ack,
    Nak,
    /// A status string we don't recognize; preserved verbatim so it can be
    /// logged, but never produced by this implementation.
    Unknown,
}

impl Status {
    const NO_SUCH_DESTINATION: &'static str = "maquinanaoexiste";
    const ACK: &'static str = "ACK";
    const NAK: &'static str = "NAK";

    fn as_str(self) -> &'static str {
        match self {
            Status::NoSuchDestination => Self::NO_SUCH_DESTINATION,
            Status::Ack => Self::ACK,
            Status::Nak => Self::NAK,
            Status::Unknown => "unknown",
        }
    }

    fn parse(raw: &str) -> Status {
        match raw {
            Self::NO_SUCH_DESTINATION => Status::NoSuchDestination,
            Self::ACK => Status::Ack,
            Self::NAK => Status::Nak,
            _ => Status::Unknown,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const BROADCAST_DEST: &str = "TODOS";

/// A data packet in flight on the ring.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DataPacket {
    pub src: String,
    pub dest: String,
    pub status: Status,
    pub status_raw: String,
    pub crc: u32,
    /// Set when the `crc` field on the wire did not parse as an exact,
    /// unsigned, sign-free decimal `u32`. A parse failure is treated by the
    /// router as a CRC mismatch, not a separate error class.
    pub crc_unparseable: bool,
    pub message: String,
}

impl DataPacket {
    /// Builds a fresh outbound packet with the initial "destination unknown"
    /// status and a placeholder crc; the caller must call [`DataPacket::set_crc`]
    /// before encoding it onto the wire.
    pub fn new(src: impl Into<String>, dest: impl Into<String>, message: impl Into<String>) -> DataPacket {
        DataPacket {
            src: src.into(),
            dest: dest.into(),
            status: Status::NoSuchDestination,
            status_raw: Status::NoSuchDestination.as_str().to_string(),
            crc: 0,
            crc_unparseable: false,
            message: message.into(),
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.dest == BROADCAST_DEST
    }

    pub fn set_status(&mut self, status: Status) {
        self.status_raw = status.as_str().to_string();
        self.status = status;
    }

    pub fn set_crc(&mut self, crc: u32) {
        self.crc = crc;
    }

    pub fn encode(&self) -> String {
        format!(
            "{};{}:{}:{}:{}:{}",
            DATA_TAG, self.src, self.dest, self.status_raw, self.crc, self.message
        )
    }

    pub fn decode(payload: &str) -> Result<DataPacket, RingError> {
        let rest = payload
            .strip_prefix(DATA_TAG)
            .ok_or_else(|| RingError::MalformedPacket("missing \"2000\" tag".into()))?;
        let rest = rest
            .strip_prefix(';')
            .ok_or_else(|| RingError::MalformedPacket("missing ';' separator".into()))?;

        let mut fields = rest.splitn(5, ':');
        let src = fields
            .next()
            .ok_or_else(|| RingError::MalformedPacket("missing src field".into()))?;
        let dest = fields
            .next()
            .ok_or_else(|| RingError::MalformedPacket("missing dest field".into()))?;
        let status_raw = fields
            .next()
            .ok_or_else(|| RingError::MalformedPacket("missing status field".into()))?;
        let crc_raw = fields
            .next()
            .ok_or_else(|| RingError::MalformedPacket("missing crc field".into()))?;
        let message = fields
            .next()
            .ok_or_else(|| RingError::MalformedPacket("missing message field".into()))?;

        let (crc, crc_unparseable) = match parse_strict_u32(crc_raw) {
            Some(value) => (value, false),
            None => (0, true),
        };

        Ok(DataPacket {
            src: src.to_string(),
            dest: dest.to_string(),
            status: Status::parse(status_raw),
            status_raw: status_raw.to_string(),
            crc,
            crc_unparseable,
            message: message.to_string(),
        })
    }
}

/// Parses a decimal `u32` with no leading zeros and no sign, per the wire
/// contract: the crc field is compared as an integer but must be the exact
/// decimal representation.
fn parse_strict_u32(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if raw.len() > 1 && raw.starts_with('0') {
        return None;
    }
    raw.parse::<u32>().ok()
}

/// What an inbound datagram turned out to be.
pub enum Inbound {
    Token,
    Data(DataPacket),
}

/// Classifies a raw inbound payload. Anything that is neither the token wire
/// form nor tagged with the data prefix is dropped by the caller.
pub fn classify(payload: &str) -> Option<Inbound> {
    if payload == TOKEN_WIRE {
        Some(Inbound::Token)
    } else if payload.starts_with("2000") {
        match DataPacket::decode(payload) {
            Ok(packet) => Some(Inbound::Data(packet)),
            Err(_) => None,
        }
    } else {
        None
    }
}
