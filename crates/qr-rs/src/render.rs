//! Plain rasterization of a symbol to an RGBA8 buffer.
//!
//! This is the synthetic counterpart of a camera frame: the same buffer
//! shape [`decode`](crate::decode) consumes. PNG output lives in the
//! companion `qr-rs-png` crate.

use crate::matrix::Symbol;

/// An RGBA8 pixel buffer, interleaved rows, top-left origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaFrame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

/// Renders the symbol at `scale` pixels per module with a quiet zone of
/// `margin` modules on every side. Dark modules are black, everything else
/// white, alpha opaque.
///
/// Panics if `scale` is zero; a quiet zone of at least 4 modules is what
/// scanners expect, but any margin is accepted.
pub fn to_rgba(symbol: &Symbol, scale: usize, margin: usize) -> RgbaFrame {
    assert!(scale > 0, "Scale must be positive");
    let side = (symbol.size() + 2 * margin) * scale;
    let mut data = vec![0xFFu8; side * side * 4];
    for py in 0..side {
        for px in 0..side {
            let mx = (px / scale) as i32;
            let my = (py / scale) as i32;
            let dark = symbol.module(mx - margin as i32, my - margin as i32);
            if dark {
                let at = (py * side + px) * 4;
                data[at] = 0;
                data[at + 1] = 0;
                data[at + 2] = 0;
            }
        }
    }
    RgbaFrame {
        width: side,
        height: side,
        data,
    }
}
