//! PNG rendering of QR codes.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use thiserror::Error;

pub const DEFAULT_QR_SIZE: u32 = 300;
pub const MIN_QR_SIZE: u32 = 100;
pub const MAX_QR_SIZE: u32 = 1000;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("failed to encode QR data: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("failed to write PNG: {0}")]
    Image(#[from] image::ImageError),
}

/// Requested edge length clamped to the supported range.
pub fn clamp_size(size: Option<u32>) -> u32 {
    size.unwrap_or(DEFAULT_QR_SIZE)
        .clamp(MIN_QR_SIZE, MAX_QR_SIZE)
}

/// Renders `data` as a grayscale PNG at least `size` pixels wide.
///
/// # Errors
///
/// Returns [`QrError`] if the data does not fit in a QR code or PNG
/// encoding fails.
pub fn render_png(data: &str, size: u32) -> Result<Vec<u8>, QrError> {
    let code = QrCode::new(data.as_bytes())?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(size, size)
        .build();

    let mut png = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(image).write_to(&mut png, ImageFormat::Png)?;

    Ok(png.into_inner())
}
