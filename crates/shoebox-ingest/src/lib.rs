//! Shoebox ingestion orchestrator.
//!
//! [`AssetIngestor`] ties the pipeline together: it hashes uploads, skips
//! bytes the library already has, runs the pixel pipeline from
//! `shoebox-processing`, writes files through `shoebox-storage` and records
//! assets and photos through `shoebox-db`.

pub mod batch;
pub mod ingestor;

pub use batch::{BatchOutcome, UploadFile, UploadTarget};
pub use ingestor::AssetIngestor;
