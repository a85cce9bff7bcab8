use thiserror::Error;

/// Errors from packet parsing and stream construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StreamError {
    #[error("frame too short: {actual} bytes, header needs {expected}")]
    Truncated { expected: usize, actual: usize },

    #[error("invalid magic")]
    InvalidMagic,

    #[error("checksum mismatch on packet {seq}")]
    ChecksumMismatch { seq: u16 },

    #[error("not a retransmit request")]
    NotANack,

    #[error("malformed retransmit request payload")]
    BadNack,

    #[error("payload needs {chunks} chunks, sequence numbers cap at {max}")]
    TooManyChunks { chunks: usize, max: usize },
}
