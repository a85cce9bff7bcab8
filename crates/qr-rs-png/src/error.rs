use image::ImageError;
use qr_rs::QrError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QrPngError {
    #[error("image error: {0}")]
    ImageError(#[from] ImageError),

    #[error("qr error: {0}")]
    QrError(#[from] QrError),

    #[error("invalid scale: {scale}")]
    InvalidScale { scale: u32 },
}
