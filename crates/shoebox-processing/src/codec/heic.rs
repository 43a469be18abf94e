use image::RgbaImage;

use super::{has_ftyp_brand, Codec, DecodeError, HEIC_BRANDS};

/// HEIC/HEIF stills through libheif (`heic` feature).
///
/// The codec owns the libheif handle for as long as the dispatcher that
/// registered it lives. Container transforms (`irot`/`imir`) are ignored
/// during decode because orientation is applied from EXIF afterwards.
pub struct HeicCodec {
    #[cfg(feature = "heic")]
    lib: libheif_rs::LibHeif,
}

impl HeicCodec {
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "heic")]
            lib: libheif_rs::LibHeif::new(),
        }
    }
}

impl Default for HeicCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HeicCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeicCodec")
            .field("native", &cfg!(feature = "heic"))
            .finish()
    }
}

impl Codec for HeicCodec {
    fn name(&self) -> &'static str {
        "heic"
    }

    fn matches_signature(&self, data: &[u8]) -> bool {
        has_ftyp_brand(data, HEIC_BRANDS)
    }

    #[cfg(feature = "heic")]
    fn decode(&self, data: &[u8]) -> Result<RgbaImage, DecodeError> {
        use libheif_rs::{ColorSpace, DecodingOptions, HeifContext, RgbChroma};

        let malformed = |e: libheif_rs::HeifError| DecodeError::Malformed {
            format: "heic",
            reason: e.to_string(),
        };

        let ctx = HeifContext::read_from_bytes(data).map_err(malformed)?;
        let handle = ctx.primary_image_handle().map_err(malformed)?;

        let mut options = DecodingOptions::new();
        if let Some(options) = options.as_mut() {
            options.set_ignore_transformations(true);
        }
        let decoded = self
            .lib
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgba), options)
            .map_err(malformed)?;

        let planes = decoded.planes();
        let plane = planes.interleaved.ok_or(DecodeError::Malformed {
            format: "heic",
            reason: "decoder returned no interleaved plane".to_string(),
        })?;

        let (width, height) = (plane.width, plane.height);
        let row_len = width as usize * 4;
        let mut pixels = Vec::with_capacity(row_len * height as usize);
        for row in plane.data.chunks(plane.stride).take(height as usize) {
            let row = row.get(..row_len).ok_or(DecodeError::Truncated)?;
            pixels.extend_from_slice(row);
        }

        let img = RgbaImage::from_raw(width, height, pixels).ok_or(DecodeError::Truncated)?;
        super::ensure_dimensions(img)
    }

    #[cfg(not(feature = "heic"))]
    fn decode(&self, _data: &[u8]) -> Result<RgbaImage, DecodeError> {
        Err(DecodeError::Unsupported {
            format: self.name(),
        })
    }
}
