//! Image container probing.
//!
//! Only the container header is parsed: format detection plus dimensions.
//! Pixel data is never decoded, which keeps large drone frames cheap.

use image::ImageFormat;
use std::io::Cursor;

/// Header-level facts about an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbedImage {
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

/// Verify that bytes form a decodable image container.
///
/// Returns a human-readable message on failure; callers wrap it into
/// `ExtractError::UnreadableImage`.
pub fn probe(bytes: &[u8]) -> Result<ProbedImage, String> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| format!("cannot detect image format: {e}"))?;
    let format = reader
        .format()
        .ok_or_else(|| "unknown image format".to_string())?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| format!("cannot decode {} header: {e}", format_to_string(format)))?;

    Ok(ProbedImage {
        format,
        width,
        height,
    })
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Avif => "avif",
        _ => "unknown",
    }
}
