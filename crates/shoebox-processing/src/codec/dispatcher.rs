use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use image::RgbaImage;

use super::{AvifCodec, Codec, DecodeError, HeicCodec, RasterCodec, WebpCodec};

/// Routes bytes to a codec by file extension.
///
/// Built once and shared (it is `Send + Sync`); codecs that hold native
/// resources release them when the dispatcher is dropped.
pub struct CodecDispatcher {
    by_extension: HashMap<String, Arc<dyn Codec>>,
    fallback: Arc<dyn Codec>,
}

impl CodecDispatcher {
    /// Registers WebP, AVIF and HEIC codecs; every other extension goes to
    /// the general raster codec.
    pub fn new() -> Self {
        Self {
            by_extension: HashMap::new(),
            fallback: Arc::new(RasterCodec),
        }
        .with_codec(&["webp"], WebpCodec)
        .with_codec(&["avif", "avifs"], AvifCodec)
        .with_codec(&["heic", "heif"], HeicCodec::new())
    }

    /// Registers `codec` for the given extensions (without dots), replacing
    /// any codec previously registered for them.
    pub fn with_codec(mut self, extensions: &[&str], codec: impl Codec + 'static) -> Self {
        let codec: Arc<dyn Codec> = Arc::new(codec);
        for ext in extensions {
            self.by_extension
                .insert(ext.trim_start_matches('.').to_ascii_lowercase(), codec.clone());
        }
        self
    }

    /// The codec that handles `extension`, or `None` when the extension has no
    /// dedicated codec and the general raster codec applies.
    pub fn dedicated_codec(&self, extension: &str) -> Option<&dyn Codec> {
        self.by_extension
            .get(&extension.trim_start_matches('.').to_ascii_lowercase())
            .map(|c| c.as_ref())
    }

    /// Decodes `data` into the canonical RGBA buffer.
    ///
    /// A dedicated codec is only handed data that carries its container
    /// signature; an AVIF named `.webp` fails here instead of deep inside a
    /// decoder.
    pub fn decode(&self, data: &[u8], extension: &str) -> Result<RgbaImage, DecodeError> {
        if data.is_empty() {
            return Err(DecodeError::Truncated);
        }

        let codec = match self.dedicated_codec(extension) {
            Some(codec) => {
                if !codec.matches_signature(data) {
                    return Err(DecodeError::SignatureMismatch {
                        expected: codec.name(),
                    });
                }
                codec
            }
            None => self.fallback.as_ref(),
        };

        tracing::trace!(codec = codec.name(), extension, bytes = data.len(), "Decoding image");
        codec.decode(data)
    }
}

impl Default for CodecDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CodecDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut extensions: Vec<(&str, &str)> = self
            .by_extension
            .iter()
            .map(|(ext, codec)| (ext.as_str(), codec.name()))
            .collect();
        extensions.sort_unstable();
        f.debug_struct("CodecDispatcher")
            .field("codecs", &extensions)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}
