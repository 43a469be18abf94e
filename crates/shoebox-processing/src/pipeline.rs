//! Decode → reorient → derive, for one asset.
//!
//! Everything here is CPU-bound and synchronous; async callers run it on a
//! blocking thread.

use std::time::Instant;

use shoebox_core::{MediaKind, Orientation};

use crate::codec::{CodecDispatcher, DecodeError};
use crate::derivative::{encode_jpeg, generate_thumbnail, EncodeError, Thumbnail, ThumbnailOptions};
use crate::image::reorient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivativeOptions {
    pub thumbnail: ThumbnailOptions,
    /// Quality of the full-size JPEG written next to HEIC originals.
    pub fallback_quality: u8,
}

impl Default for DerivativeOptions {
    fn default() -> Self {
        Self {
            thumbnail: ThumbnailOptions::default(),
            fallback_quality: 95,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// Upright dimensions.
    pub width: u32,
    pub height: u32,
    pub thumbnail: Thumbnail,
    /// Present only for kinds that need a JPEG copy.
    pub fallback_jpeg: Option<Vec<u8>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Logs how far into an asset each stage finished, in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct StageTimer {
    started: Instant,
}

impl StageTimer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    pub fn mark(&self, stage: &'static str) {
        tracing::debug!(stage, elapsed_ms = self.elapsed_ms() as u64, "Stage finished");
    }
}

/// Decodes `data`, brings it upright and builds every derivative `kind`
/// calls for.
pub fn process_image(
    dispatcher: &CodecDispatcher,
    data: &[u8],
    extension: &str,
    kind: MediaKind,
    orientation: Orientation,
    options: &DerivativeOptions,
    timer: StageTimer,
) -> Result<ProcessedImage, ProcessingError> {
    let decoded = dispatcher.decode(data, extension)?;
    timer.mark("decode");

    let upright = reorient(decoded, orientation);
    timer.mark("reorient");

    let fallback_jpeg = if kind.needs_fallback_jpeg() {
        let jpeg = encode_jpeg(&upright, options.fallback_quality)?;
        timer.mark("fallback_encode");
        Some(jpeg)
    } else {
        None
    };

    let thumbnail = generate_thumbnail(&upright, &options.thumbnail)?;
    timer.mark("thumbnail");

    Ok(ProcessedImage {
        width: upright.width(),
        height: upright.height(),
        thumbnail,
        fallback_jpeg,
    })
}
