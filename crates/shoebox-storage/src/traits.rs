//! Asset store abstraction

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use shoebox_core::{AppError, Digest, MediaKind};
use thiserror::Error;

/// Step of a file write that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Create,
    Write,
    Sync,
    /// Moving the written file over its final name.
    Rename,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WriteStage::Create => "create",
            WriteStage::Write => "write",
            WriteStage::Sync => "sync",
            WriteStage::Rename => "rename",
        })
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to {stage} {}: {source}", .path.display())]
    WriteFailed {
        stage: WriteStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("No generated artifact for {0} assets")]
    NoDerivative(&'static str),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => {
                AppError::NotFound(format!("file not found: {}", path.display()))
            }
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Where asset bytes live.
///
/// Originals are the source of truth and must be durable before anything
/// references them, so `write_original` only returns once the data has been
/// synced. Generated files can always be rebuilt from the original and are
/// written without a sync.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Writes the original bytes and syncs them to disk. Rewriting an
    /// existing original replaces it atomically with identical content.
    async fn write_original(
        &self,
        digest: &Digest,
        kind: MediaKind,
        data: &[u8],
    ) -> StorageResult<PathBuf>;

    /// Writes the JPEG copy of an original whose kind needs one.
    async fn write_fallback(
        &self,
        digest: &Digest,
        kind: MediaKind,
        data: &[u8],
    ) -> StorageResult<PathBuf>;

    async fn has_original(&self, digest: &Digest, kind: MediaKind) -> StorageResult<bool>;

    /// Path of the file to serve for an asset. With `prefer_jpeg`, kinds that
    /// have a JPEG copy resolve to it; everything else resolves to the
    /// original.
    async fn resolve(
        &self,
        digest: &Digest,
        kind: MediaKind,
        prefer_jpeg: bool,
    ) -> StorageResult<PathBuf>;
}
