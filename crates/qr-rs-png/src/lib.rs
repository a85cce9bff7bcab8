//! PNG rendering for encoded QR symbols.
//!
//! Companion crate to `qr-rs`: takes a [`Symbol`] and produces PNG bytes
//! at a configurable module scale and quiet-zone margin.

use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Luma};
use qr_rs::{encode, EcLevel, Symbol};
use serde::{Deserialize, Serialize};

mod error;

pub use error::QrPngError;

/// Rendering parameters: pixels per module and quiet-zone modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub scale: u32,
    pub margin: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        // Scanners want at least four quiet modules around the symbol.
        Self {
            scale: 8,
            margin: 4,
        }
    }
}

/// Renders a symbol to PNG bytes, dark modules black on white.
pub fn render_png(symbol: &Symbol, opts: RenderOptions) -> Result<Vec<u8>, QrPngError> {
    if opts.scale == 0 {
        return Err(QrPngError::InvalidScale { scale: opts.scale });
    }
    let side = (symbol.size() as u32 + 2 * opts.margin) * opts.scale;
    let img = ImageBuffer::from_fn(side, side, |x, y| {
        let mx = (x / opts.scale) as i32 - opts.margin as i32;
        let my = (y / opts.scale) as i32 - opts.margin as i32;
        if symbol.module(mx, my) {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    });
    let mut w = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img).write_to(&mut w, ImageFormat::Png)?;
    Ok(w.into_inner())
}

/// Encodes `data` and renders it in one step.
pub fn generate_qr_png(
    data: &[u8],
    level: EcLevel,
    opts: RenderOptions,
) -> Result<Vec<u8>, QrPngError> {
    let symbol = encode(data, level)?;
    render_png(&symbol, opts)
}
