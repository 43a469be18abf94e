//! Database repositories for the data access layer
//!
//! Each repository owns the queries for one table family. Methods ending in
//! `_tx` run inside a caller-supplied transaction; the others use the pool.
//
// Asset, photo and album repositories
pub mod media;
//
// Transaction utilities
pub mod transaction;

pub use media::{AlbumRepository, AssetRepository, PhotoRepository};

/// Converts stored unix seconds back to a timestamp.
pub(crate) fn from_unix(secs: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
