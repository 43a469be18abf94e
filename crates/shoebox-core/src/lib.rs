//! Shoebox Core Library
//!
//! Domain models, error types and configuration shared by every Shoebox
//! component: the processing pipeline, the asset store, the database layer
//! and the ingest orchestrator.

pub mod config;
pub mod error;
pub mod models;

pub use config::IngestConfig;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    AddedAsset, Album, Asset, CaptureMetadata, Digest, DigestParseError, GeoPoint, MediaKind,
    NewAsset, Orientation, Photo,
};
