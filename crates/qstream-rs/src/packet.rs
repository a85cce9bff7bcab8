//! The packet wire format.
//!
//! A packet is `magic(2) | seq(2) | total(2) | flags(1) | crc16(2) |
//! payload`, all multi-byte fields big-endian, header exactly
//! [`Packet::HEADER_LEN`] bytes. The checksum covers the payload only.

use serde::{Deserialize, Serialize};

use crate::crc16::crc16;
use crate::error::StreamError;

/// Packet flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flags(u8);

impl Flags {
    /// First packet of a stream.
    pub const FIRST: Flags = Flags(0x01);
    /// Last packet of a stream.
    pub const LAST: Flags = Flags(0x02);
    /// The packet is a retransmit request, not data.
    pub const RETRANSMIT: Flags = Flags(0x04);
    /// Acknowledgment.
    pub const ACK: Flags = Flags(0x08);

    pub fn empty() -> Flags {
        Flags(0)
    }

    pub fn from_byte(byte: u8) -> Flags {
        Flags(byte)
    }

    pub fn to_byte(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn with(self, other: Flags) -> Flags {
        Flags(self.0 | other.0)
    }
}

/// One stream packet: header fields plus an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub seq: u16,
    pub total: u16,
    pub flags: Flags,
    pub payload: Vec<u8>,
}

impl Packet {
    /// Serialized header size in bytes.
    pub const HEADER_LEN: usize = 9;

    /// Leading magic bytes.
    pub const MAGIC: [u8; 2] = *b"QS";

    pub fn new(seq: u16, total: u16, flags: Flags, payload: Vec<u8>) -> Self {
        Self {
            seq,
            total,
            flags,
            payload,
        }
    }

    /// Builds a retransmit request for the given sequence numbers. The
    /// payload is the ASCII comma-joined list.
    pub fn nack(seqs: &[u16]) -> Self {
        let payload = seqs
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",")
            .into_bytes();
        Self::new(0, 0, Flags::RETRANSMIT, payload)
    }

    /// Whether this packet is a retransmit request.
    pub fn is_nack(&self) -> bool {
        self.flags.contains(Flags::RETRANSMIT)
    }

    /// Parses a retransmit request payload back into sequence numbers.
    ///
    /// Fails with [`StreamError::NotANack`] on data packets and
    /// [`StreamError::BadNack`] if the payload is not a comma-joined
    /// decimal list. An empty payload is an empty request.
    pub fn parse_nack(&self) -> Result<Vec<u16>, StreamError> {
        if !self.is_nack() {
            return Err(StreamError::NotANack);
        }
        let text = std::str::from_utf8(&self.payload).map_err(|_| StreamError::BadNack)?;
        if text.is_empty() {
            return Ok(Vec::new());
        }
        text.split(',')
            .map(|part| part.parse::<u16>().map_err(|_| StreamError::BadNack))
            .collect()
    }

    /// Serializes header and payload, computing the payload checksum.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::HEADER_LEN + self.payload.len());
        out.extend_from_slice(&Self::MAGIC);
        out.extend_from_slice(&self.seq.to_be_bytes());
        out.extend_from_slice(&self.total.to_be_bytes());
        out.push(self.flags.to_byte());
        out.extend_from_slice(&crc16(&self.payload).to_be_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parses a frame. Validation order is cheapest first: length, magic,
    /// then the payload checksum (skipped for retransmit requests, whose
    /// integrity the sequence-number parse covers).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StreamError> {
        if bytes.len() < Self::HEADER_LEN {
            return Err(StreamError::Truncated {
                expected: Self::HEADER_LEN,
                actual: bytes.len(),
            });
        }
        if bytes[0..2] != Self::MAGIC {
            return Err(StreamError::InvalidMagic);
        }
        let seq = u16::from_be_bytes([bytes[2], bytes[3]]);
        let total = u16::from_be_bytes([bytes[4], bytes[5]]);
        let flags = Flags::from_byte(bytes[6]);
        let stored_crc = u16::from_be_bytes([bytes[7], bytes[8]]);
        let payload = bytes[Self::HEADER_LEN..].to_vec();

        if !flags.contains(Flags::RETRANSMIT) && crc16(&payload) != stored_crc {
            return Err(StreamError::ChecksumMismatch { seq });
        }
        Ok(Self {
            seq,
            total,
            flags,
            payload,
        })
    }
}
