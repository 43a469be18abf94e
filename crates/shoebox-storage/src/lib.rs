//! Shoebox Storage Library
//!
//! Content-addressed files for assets. Every artifact is named after the
//! SHA-256 of the original bytes, so the same upload always lands on the
//! same path.
//!
//! # Layout
//!
//! - originals: `{assets_dir}/{hex}.jpg` or `{assets_dir}/{hex}.heic`
//! - JPEG copies of HEIC originals: `{generated_dir}/{hex}.heic.jpg`
//!
//! File name generation is centralised in the `keys` module.

pub mod factory;
pub mod keys;
pub mod local;
pub mod traits;

pub use factory::create_asset_store;
pub use local::LocalAssetStore;
pub use traits::{AssetStore, StorageError, StorageResult, WriteStage};
