use thiserror::Error;

/// Errors surfaced by the symbol codec.
///
/// The public [`decode`](crate::decode) entry point never returns these; it
/// collapses every failure to `None` so a bad camera frame can only ever
/// look like "no symbol here". The variants exist for the encoder and for
/// the internal decode stages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum QrError {
    #[error("payload too large: {needed} bits exceed the {available} available at version 40")]
    PayloadTooLarge { needed: usize, available: usize },

    #[error("unsupported segment mode {mode:#06b}")]
    Unsupported { mode: u8 },

    #[error("malformed frame: {0}")]
    MalformedFrame(&'static str),
}
