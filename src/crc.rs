//! Integrity checking for data packets. The canonical form over which the
//! CRC32 is computed is part of the wire contract and
//! must not be "cleaned up": the leading component is the literal `"2000"`
//! wire tag, not a semantic field.

use crc::{Crc, CRC_32_ISO_HDLC};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Builds the canonical string a data packet's CRC32 is computed over, with
/// `"0"` standing in for the crc slot.
pub fn canonical_form(src: &str, dest: &str, status: &str, body: &str) -> String {
    format!("2000;{}:{}:{}:0:{}", src, dest, status, body)
}

pub fn compute_crc(canonical: &str) -> u32 {
    CRC32.checksum(canonical.as_bytes())
}
