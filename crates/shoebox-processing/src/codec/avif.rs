use image::RgbaImage;

use super::{has_ftyp_brand, Codec, DecodeError, AVIF_BRANDS};

/// AVIF stills. Decoding needs the `avif` feature (dav1d); without it the
/// codec still recognises the container so the error says what is missing.
#[derive(Debug, Default)]
pub struct AvifCodec;

impl Codec for AvifCodec {
    fn name(&self) -> &'static str {
        "avif"
    }

    fn matches_signature(&self, data: &[u8]) -> bool {
        has_ftyp_brand(data, AVIF_BRANDS)
    }

    #[cfg(feature = "avif")]
    fn decode(&self, data: &[u8]) -> Result<RgbaImage, DecodeError> {
        let img = image::load_from_memory_with_format(data, image::ImageFormat::Avif)
            .map_err(|e| DecodeError::from_image(self.name(), e))?;
        super::ensure_dimensions(img.into_rgba8())
    }

    #[cfg(not(feature = "avif"))]
    fn decode(&self, _data: &[u8]) -> Result<RgbaImage, DecodeError> {
        Err(DecodeError::Unsupported {
            format: self.name(),
        })
    }
}
