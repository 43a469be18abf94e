use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use shoebox_core::{Digest, MediaKind};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::keys::{fallback_filename, original_filename};
use crate::traits::{AssetStore, StorageError, StorageResult, WriteStage};

/// Asset store on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    assets_dir: PathBuf,
    generated_dir: PathBuf,
}

impl LocalAssetStore {
    /// Creates both directories if they do not exist yet.
    pub async fn new(
        assets_dir: impl Into<PathBuf>,
        generated_dir: impl Into<PathBuf>,
    ) -> StorageResult<Self> {
        let assets_dir = assets_dir.into();
        let generated_dir = generated_dir.into();

        for dir in [&assets_dir, &generated_dir] {
            fs::create_dir_all(dir).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        Ok(Self {
            assets_dir,
            generated_dir,
        })
    }

    pub fn original_path(&self, digest: &Digest, kind: MediaKind) -> PathBuf {
        self.assets_dir.join(original_filename(digest, kind))
    }

    pub fn fallback_path(&self, digest: &Digest, kind: MediaKind) -> Option<PathBuf> {
        fallback_filename(digest, kind).map(|name| self.generated_dir.join(name))
    }

    /// Writes `data` to a temporary file next to `path`, then renames it over
    /// `path`. Readers see the old file or the new one, never a partial
    /// write. With `durable`, the file is synced before the rename and the
    /// directory after it. The temporary file is removed on failure.
    async fn write_file(path: &Path, data: &[u8], durable: bool) -> StorageResult<()> {
        let tmp = temp_path(path);
        let result = Self::write_and_replace(&tmp, path, data, durable).await;
        if result.is_err() {
            let _ = fs::remove_file(&tmp).await;
        }
        result
    }

    async fn write_and_replace(
        tmp: &Path,
        path: &Path,
        data: &[u8],
        durable: bool,
    ) -> StorageResult<()> {
        let failed = |stage: WriteStage| {
            move |source: std::io::Error| StorageError::WriteFailed {
                stage,
                path: path.to_path_buf(),
                source,
            }
        };

        let mut file = fs::File::create(tmp)
            .await
            .map_err(failed(WriteStage::Create))?;

        // flush() waits for tokio's background write so its error is
        // attributed to the write step.
        file.write_all(data)
            .await
            .map_err(failed(WriteStage::Write))?;
        file.flush().await.map_err(failed(WriteStage::Write))?;
        if durable {
            file.sync_all().await.map_err(failed(WriteStage::Sync))?;
        }
        drop(file);

        fs::rename(tmp, path)
            .await
            .map_err(failed(WriteStage::Rename))?;

        if durable {
            sync_parent(path).await.map_err(failed(WriteStage::Sync))?;
        }
        Ok(())
    }
}

/// Unique name in the same directory as `path`, so the rename stays on one
/// filesystem.
fn temp_path(path: &Path) -> PathBuf {
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}-{}.tmp", name, std::process::id(), seq))
}

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

#[cfg(unix)]
async fn sync_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(dir) => fs::File::open(dir).await?.sync_all().await,
        None => Ok(()),
    }
}

#[cfg(not(unix))]
async fn sync_parent(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn write_original(
        &self,
        digest: &Digest,
        kind: MediaKind,
        data: &[u8],
    ) -> StorageResult<PathBuf> {
        let path = self.original_path(digest, kind);
        let start = Instant::now();

        Self::write_file(&path, data, true).await?;

        tracing::debug!(
            path = %path.display(),
            digest = %digest,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Original written and synced"
        );
        Ok(path)
    }

    async fn write_fallback(
        &self,
        digest: &Digest,
        kind: MediaKind,
        data: &[u8],
    ) -> StorageResult<PathBuf> {
        let path = self
            .fallback_path(digest, kind)
            .ok_or(StorageError::NoDerivative(kind.as_str()))?;

        Self::write_file(&path, data, false).await?;

        tracing::debug!(
            path = %path.display(),
            digest = %digest,
            size_bytes = data.len(),
            "Fallback JPEG written"
        );
        Ok(path)
    }

    async fn has_original(&self, digest: &Digest, kind: MediaKind) -> StorageResult<bool> {
        Ok(fs::try_exists(self.original_path(digest, kind)).await?)
    }

    async fn resolve(
        &self,
        digest: &Digest,
        kind: MediaKind,
        prefer_jpeg: bool,
    ) -> StorageResult<PathBuf> {
        let path = match self.fallback_path(digest, kind) {
            Some(fallback) if prefer_jpeg => fallback,
            _ => self.original_path(digest, kind),
        };

        if !fs::try_exists(&path).await? {
            return Err(StorageError::NotFound(path));
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tempfile::tempdir;

    async fn store(root: &Path) -> LocalAssetStore {
        LocalAssetStore::new(root.join("assets"), root.join("generated"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_new_creates_directories() {
        let dir = tempdir().unwrap();
        store(dir.path()).await;
        assert!(dir.path().join("assets").is_dir());
        assert!(dir.path().join("generated").is_dir());
    }

    #[tokio::test]
    async fn test_write_original_uses_content_address() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;
        let data = b"original bytes";
        let digest = Digest::of(data);

        let path = store
            .write_original(&digest, MediaKind::Jpg, data)
            .await
            .unwrap();

        assert_eq!(
            path,
            dir.path()
                .join("assets")
                .join(format!("{}.jpg", digest.to_hex()))
        );
        assert_eq!(std::fs::read(&path).unwrap(), data);
        assert!(store.has_original(&digest, MediaKind::Jpg).await.unwrap());
        assert!(!store.has_original(&digest, MediaKind::Heic).await.unwrap());
    }

    #[tokio::test]
    async fn test_rewrite_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;
        let data = b"same bytes twice";
        let digest = Digest::of(data);

        let first = store.write_original(&digest, MediaKind::Jpg, data).await.unwrap();
        let second = store.write_original(&digest, MediaKind::Jpg, data).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), data);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rewrite_never_exposes_partial_original() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;
        let data: Vec<u8> = (0..4 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
        let digest = Digest::of(&data);
        let path = store
            .write_original(&digest, MediaKind::Jpg, &data)
            .await
            .unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let reader = {
            let done = Arc::clone(&done);
            let path = path.clone();
            let len = data.len();
            tokio::task::spawn_blocking(move || {
                let mut reads = 0;
                while reads == 0 || !done.load(Ordering::SeqCst) {
                    assert_eq!(std::fs::read(&path).unwrap().len(), len);
                    reads += 1;
                }
            })
        };

        let writers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let data = data.clone();
                tokio::spawn(async move {
                    store
                        .write_original(&digest, MediaKind::Jpg, &data)
                        .await
                        .unwrap()
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }
        done.store(true, Ordering::SeqCst);
        reader.await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), data);
        // No temporary files left behind.
        assert_eq!(std::fs::read_dir(dir.path().join("assets")).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_failed_rename_reports_stage_and_cleans_up() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;
        let digest = Digest::of(b"data");

        // A non-empty directory where the original should go.
        let target = store.original_path(&digest, MediaKind::Jpg);
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("occupied"), b"x").unwrap();

        let err = store
            .write_original(&digest, MediaKind::Jpg, b"data")
            .await
            .unwrap_err();
        match err {
            StorageError::WriteFailed { stage, path, .. } => {
                assert_eq!(stage, WriteStage::Rename);
                assert_eq!(path, target);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(std::fs::read_dir(dir.path().join("assets")).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_fallback_only_for_heic() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;
        let digest = Digest::of(b"heic");

        let path = store
            .write_fallback(&digest, MediaKind::Heic, b"jpeg bytes")
            .await
            .unwrap();
        assert_eq!(
            path,
            dir.path()
                .join("generated")
                .join(format!("{}.heic.jpg", digest.to_hex()))
        );

        let err = store
            .write_fallback(&digest, MediaKind::Jpg, b"jpeg bytes")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NoDerivative("jpg")));
    }

    #[tokio::test]
    async fn test_resolve_prefers_jpeg_copy() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;
        let digest = Digest::of(b"heic original");

        let original = store
            .write_original(&digest, MediaKind::Heic, b"heic original")
            .await
            .unwrap();
        let fallback = store
            .write_fallback(&digest, MediaKind::Heic, b"jpeg")
            .await
            .unwrap();

        assert_eq!(store.resolve(&digest, MediaKind::Heic, true).await.unwrap(), fallback);
        assert_eq!(store.resolve(&digest, MediaKind::Heic, false).await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_resolve_plain_raster_ignores_preference() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;
        let digest = Digest::of(b"jpg original");
        let original = store
            .write_original(&digest, MediaKind::Jpg, b"jpg original")
            .await
            .unwrap();

        assert_eq!(store.resolve(&digest, MediaKind::Jpg, true).await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_resolve_missing_file() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;
        let result = store.resolve(&Digest::of(b"nothing"), MediaKind::Jpg, false).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_write_failure_reports_stage() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;

        // Replace the assets directory with a plain file so create() fails.
        std::fs::remove_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets"), b"not a directory").unwrap();

        let digest = Digest::of(b"data");
        let err = store
            .write_original(&digest, MediaKind::Jpg, b"data")
            .await
            .unwrap_err();
        match err {
            StorageError::WriteFailed { stage, path, .. } => {
                assert_eq!(stage, WriteStage::Create);
                assert!(path.ends_with(format!("{}.jpg", digest.to_hex())));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
