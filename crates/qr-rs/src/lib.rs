//! Encodes and decodes QR Code symbols.
//!
//! The encoder turns payload bytes into a module grid per the QR Code
//! Model 2 standard: automatic version selection, Reed-Solomon error
//! correction with block interleaving, and mask selection by penalty
//! score. The decoder runs the other way from a raw RGBA camera frame:
//! adaptive binarization, finder pattern localization, grid sampling,
//! format and version recovery, demasking, and bit-stream decoding of
//! numeric, alphanumeric, and byte segments.
//!
//! # Examples
//!
//! Encode, rasterize, decode:
//!
//! ```
//! use qr_rs::{decode, encode, EcLevel};
//!
//! let symbol = encode(b"HELLO WORLD", EcLevel::Medium).unwrap();
//! assert_eq!(symbol.size(), 21);
//!
//! let frame = qr_rs::render::to_rgba(&symbol, 4, 4);
//! let payload = decode(&frame.data, frame.width, frame.height).unwrap();
//! assert_eq!(payload, b"HELLO WORLD");
//! ```
//!
//! The decoder tolerates a targeted, generated symbol rather than a full
//! error-correcting read: it recovers format and version words through
//! their redundant copies but does not correct damaged data codewords.

// The set of all legal characters in alphanumeric mode, where each
// character value maps to the index in the string.
pub static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

mod binarize;
pub mod bits;
mod decode;
mod ec_level;
mod encode;
mod error;
mod finder;
mod geometry;
pub mod gf256;
mod locate;
mod mask;
mod matrix;
pub mod reed_solomon;
pub mod render;
mod segment;
pub mod tables;
mod version;

pub use decode::decode;
pub use ec_level::EcLevel;
pub use encode::{encode, encode_text, encode_with_mask};
pub use error::QrError;
pub use mask::Mask;
pub use matrix::Symbol;
pub use segment::{DataMode, Segment};
pub use version::Version;
