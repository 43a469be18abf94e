//! Single-asset ingestion: hash, dedup, process, store.

use std::sync::Arc;

use bytes::Bytes;
use shoebox_core::models::extension_of;
use shoebox_core::{AddedAsset, AppError, Digest, IngestConfig, MediaKind, NewAsset};
use shoebox_db::{setup_database, AlbumRepository, AssetRepository, PhotoRepository};
use shoebox_processing::{
    extract_metadata, process_image, CodecDispatcher, DerivativeOptions, ProcessingError,
    StageTimer, ThumbnailOptions,
};
use shoebox_storage::{create_asset_store, AssetStore};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex;

/// Outcome of the work done for one file before any row is written.
#[derive(Debug, Clone)]
pub(crate) enum PreparedAsset {
    /// Same bytes are already in the library.
    Existing(AddedAsset),
    /// Original (and fallback) written; the row is still to be inserted.
    New(NewAsset),
}

/// Turns uploaded bytes into stored assets.
///
/// Owns the codec dispatcher, the asset store and the repositories. The
/// write gate serialises this process's write transactions; SQLite has a
/// single writer and a deferred transaction that reads before it writes
/// cannot be upgraded while another one commits.
pub struct AssetIngestor {
    pub(crate) config: IngestConfig,
    pub(crate) options: DerivativeOptions,
    pub(crate) dispatcher: Arc<CodecDispatcher>,
    pub(crate) store: Arc<dyn AssetStore>,
    pub(crate) pool: SqlitePool,
    pub(crate) assets: AssetRepository,
    pub(crate) photos: PhotoRepository,
    pub(crate) albums: AlbumRepository,
    pub(crate) write_gate: Mutex<()>,
}

impl AssetIngestor {
    /// Fails with `InvalidInput` when `config` does not validate.
    pub fn new(
        config: IngestConfig,
        pool: SqlitePool,
        store: Arc<dyn AssetStore>,
        dispatcher: CodecDispatcher,
    ) -> Result<Self, AppError> {
        config
            .validate()
            .map_err(|e| AppError::InvalidInput(format!("Invalid configuration: {}", e)))?;

        let options = DerivativeOptions {
            thumbnail: ThumbnailOptions {
                max_edge: config.thumbnail_size,
                quality: config.thumbnail_quality,
            },
            fallback_quality: config.fallback_jpeg_quality,
        };

        Ok(Self {
            config,
            options,
            dispatcher: Arc::new(dispatcher),
            store,
            assets: AssetRepository::new(pool.clone()),
            photos: PhotoRepository::new(pool.clone()),
            albums: AlbumRepository::new(pool.clone()),
            pool,
            write_gate: Mutex::new(()),
        })
    }

    /// Opens the database and the asset store described by `config`.
    pub async fn from_config(config: IngestConfig) -> Result<Self, AppError> {
        let pool = setup_database(&config).await?;
        let store = create_asset_store(&config).await?;
        tracing::info!(
            assets_dir = %config.assets_dir.display(),
            generated_dir = %config.generated_dir.display(),
            "Asset ingestor ready"
        );
        Self::new(config, pool, store, CodecDispatcher::new())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn store(&self) -> &Arc<dyn AssetStore> {
        &self.store
    }

    pub fn assets(&self) -> &AssetRepository {
        &self.assets
    }

    pub fn photos(&self) -> &PhotoRepository {
        &self.photos
    }

    pub fn albums(&self) -> &AlbumRepository {
        &self.albums
    }

    /// Adds one file inside the caller's transaction.
    ///
    /// Known bytes return the stored asset without decoding anything. New
    /// bytes are decoded, written to disk and inserted; the insert ignores a
    /// row that a concurrent upload of the same bytes committed first.
    #[tracing::instrument(skip(self, tx, data), fields(size_bytes = data.len()))]
    pub async fn add_asset(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        data: Bytes,
        filename: &str,
    ) -> Result<AddedAsset, AppError> {
        self.check_size(&data, filename)?;
        let digest = Digest::of(&data);

        if let Some(existing) = self.assets.get_tx(tx, &digest).await? {
            tracing::debug!(digest = %digest, "Asset already stored, skipping processing");
            return Ok(AddedAsset::from_existing(&existing));
        }

        let asset = self.build_asset(digest, data, filename).await?;
        self.insert_prepared(tx, PreparedAsset::New(asset)).await
    }

    /// For unknown bytes, does all the processing and file writing. Touches
    /// the database only to look the digest up. Size and digest are checked
    /// by the caller.
    pub(crate) async fn prepare_digest(
        &self,
        digest: Digest,
        data: Bytes,
        filename: &str,
    ) -> Result<PreparedAsset, AppError> {
        if let Some(existing) = self.assets.get(&digest).await? {
            tracing::debug!(digest = %digest, "Asset already stored, skipping processing");
            return Ok(PreparedAsset::Existing(AddedAsset::from_existing(&existing)));
        }

        Ok(PreparedAsset::New(
            self.build_asset(digest, data, filename).await?,
        ))
    }

    /// Inserts the row for a prepared asset.
    pub(crate) async fn insert_prepared(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        prepared: PreparedAsset,
    ) -> Result<AddedAsset, AppError> {
        let asset = match prepared {
            PreparedAsset::Existing(added) => return Ok(added),
            PreparedAsset::New(asset) => asset,
        };

        if !self.assets.insert_tx(tx, &asset).await? {
            tracing::debug!(
                digest = %asset.digest,
                "Asset row inserted concurrently, keeping existing row"
            );
        }

        Ok(AddedAsset {
            digest: asset.digest,
            kind: asset.kind,
            taken_at: asset.capture.taken_at,
            location: asset.capture.location,
            deduplicated: false,
        })
    }

    pub(crate) fn check_size(&self, data: &[u8], filename: &str) -> Result<(), AppError> {
        if data.len() > self.config.max_upload_size_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "{} is {} bytes, the limit is {} bytes",
                filename,
                data.len(),
                self.config.max_upload_size_bytes
            )));
        }
        Ok(())
    }

    /// Runs the pixel pipeline on a blocking thread, then writes the
    /// original (synced) and, when there is one, the JPEG fallback.
    async fn build_asset(
        &self,
        digest: Digest,
        data: Bytes,
        filename: &str,
    ) -> Result<NewAsset, AppError> {
        let timer = StageTimer::start();
        let kind = MediaKind::from_filename(filename);
        let extension = extension_of(filename).unwrap_or_default();

        let dispatcher = Arc::clone(&self.dispatcher);
        let options = self.options;
        let bytes = data.clone();
        let (capture, processed) = tokio::task::spawn_blocking(move || {
            let capture = extract_metadata(&bytes);
            timer.mark("metadata");
            let processed = process_image(
                &dispatcher,
                &bytes,
                &extension,
                kind,
                capture.orientation,
                &options,
                timer,
            )?;
            Ok::<_, ProcessingError>((capture, processed))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Image processing task failed: {}", e)))?
        .map_err(|e| processing_error(e, filename))?;

        self.store.write_original(&digest, kind, &data).await?;
        timer.mark("save");

        if let Some(jpeg) = &processed.fallback_jpeg {
            self.store.write_fallback(&digest, kind, jpeg).await?;
            timer.mark("fallback_save");
        }

        tracing::info!(
            digest = %digest,
            kind = kind.as_str(),
            width = processed.width,
            height = processed.height,
            orientation = capture.orientation.exif_value(),
            has_location = capture.location.is_some(),
            duration_ms = timer.elapsed_ms() as u64,
            "Asset processed"
        );

        Ok(NewAsset {
            digest,
            kind,
            original_filename: filename.to_string(),
            thumbnail: processed.thumbnail.jpeg,
            thumbhash: processed.thumbnail.thumbhash,
            capture,
        })
    }
}

fn processing_error(err: ProcessingError, filename: &str) -> AppError {
    match err {
        ProcessingError::Decode(e) => {
            tracing::warn!(filename, error = %e, "Rejected undecodable upload");
            AppError::UnsupportedMedia(format!("{}: {}", filename, e))
        }
        ProcessingError::Encode(e) => AppError::ImageProcessing(format!("{}: {}", filename, e)),
    }
}
