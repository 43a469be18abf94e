//! Pixel-side half of the ingest pipeline.
//!
//! Bytes come in, and out come the capture metadata, an upright RGBA buffer
//! and the derivatives the library serves: a small JPEG thumbnail, its
//! ThumbHash placeholder and, for HEIC originals, a full-size JPEG copy.
//! Nothing in this crate touches the filesystem or the database.

pub mod codec;
pub mod derivative;
pub mod image;
pub mod metadata;
pub mod pipeline;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use codec::{Codec, CodecDispatcher, DecodeError};
pub use derivative::{EncodeError, Thumbnail, ThumbnailOptions};
pub use metadata::extract_metadata;
pub use pipeline::{process_image, DerivativeOptions, ProcessedImage, ProcessingError, StageTimer};
