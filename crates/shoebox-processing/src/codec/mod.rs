//! Codec dispatch
//!
//! Every supported container decodes to the same canonical buffer: 8-bit
//! RGBA, row-major, stride `width * 4` ([`image::RgbaImage`]). Formats with
//! a dedicated codec (WebP, AVIF, HEIC) are chosen by file extension and must
//! carry a matching container signature; everything else goes through the
//! general raster codec, which sniffs the format itself.

mod avif;
mod dispatcher;
mod heic;
mod raster;
mod sniff;
mod webp;

use image::RgbaImage;

pub use avif::AvifCodec;
pub use dispatcher::CodecDispatcher;
pub use heic::HeicCodec;
pub use raster::RasterCodec;
pub use sniff::{has_ftyp_brand, is_webp, AVIF_BRANDS, HEIC_BRANDS};
pub use webp::WebpCodec;

/// A decoder for one family of containers.
pub trait Codec: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Whether `data` carries this codec's container signature. The general
    /// raster codec accepts anything and lets the decoder decide.
    fn matches_signature(&self, data: &[u8]) -> bool;

    fn decode(&self, data: &[u8]) -> Result<RgbaImage, DecodeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("image data is empty or truncated")]
    Truncated,

    #[error("file content is not a valid {expected} container")]
    SignatureMismatch { expected: &'static str },

    #[error("{format} decoding is not available in this build")]
    Unsupported { format: &'static str },

    #[error("image format could not be recognised")]
    UnknownFormat,

    #[error("image has invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("failed to decode {format} image: {reason}")]
    Malformed { format: &'static str, reason: String },
}

impl DecodeError {
    pub(crate) fn from_image(format: &'static str, err: image::ImageError) -> Self {
        use image::error::{ImageError, UnsupportedErrorKind};

        match err {
            ImageError::IoError(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                DecodeError::Truncated
            }
            ImageError::Unsupported(ref unsupported) => match unsupported.kind() {
                UnsupportedErrorKind::Format(_) => DecodeError::UnknownFormat,
                _ => DecodeError::Malformed {
                    format,
                    reason: err.to_string(),
                },
            },
            other => DecodeError::Malformed {
                format,
                reason: other.to_string(),
            },
        }
    }
}

/// Rejects zero-sized buffers, which some decoders hand back for garbage input.
pub(crate) fn ensure_dimensions(img: RgbaImage) -> Result<RgbaImage, DecodeError> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions { width, height });
    }
    Ok(img)
}
