use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{RgbImage, RgbaImage};

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("JPEG encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// Baseline JPEG at `quality` (clamped to 1..=100). JPEG has no alpha
/// channel, so alpha is dropped rather than composited.
pub fn encode_jpeg(img: &RgbaImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let rgb: RgbImage = img.convert();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).encode_image(&rgb)?;
    Ok(out)
}
