//! Data models shared across the ingest pipeline
//!
//! Each sub-module covers one concept: content digests, media kinds, capture
//! metadata read from EXIF, stored assets, and the photos and albums that
//! group them.

mod asset;
mod capture;
mod digest;
mod media_kind;
mod photo;

pub use asset::*;
pub use capture::*;
pub use digest::*;
pub use media_kind::*;
pub use photo::*;
