use image::{ImageFormat, RgbaImage};

use super::{ensure_dimensions, is_webp, Codec, DecodeError};

#[derive(Debug, Default)]
pub struct WebpCodec;

impl Codec for WebpCodec {
    fn name(&self) -> &'static str {
        "webp"
    }

    fn matches_signature(&self, data: &[u8]) -> bool {
        is_webp(data)
    }

    fn decode(&self, data: &[u8]) -> Result<RgbaImage, DecodeError> {
        let img = image::load_from_memory_with_format(data, ImageFormat::WebP)
            .map_err(|e| DecodeError::from_image(self.name(), e))?;
        ensure_dimensions(img.into_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_decodes_lossless_webp() {
        let src = RgbaImage::from_pixel(5, 4, Rgba([40, 80, 120, 255]));
        let mut data = Vec::new();
        src.write_to(&mut std::io::Cursor::new(&mut data), ImageFormat::WebP)
            .unwrap();

        assert!(WebpCodec.matches_signature(&data));
        let decoded = WebpCodec.decode(&data).unwrap();
        assert_eq!(decoded.dimensions(), (5, 4));
        assert_eq!(decoded.get_pixel(4, 3), &Rgba([40, 80, 120, 255]));
    }
}
