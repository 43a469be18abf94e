//! Multi-file uploads.
//!
//! A batch is the set of files sent in one upload request. Every file ends
//! up in the same photo, and every row the batch writes lands in a single
//! transaction: assets, the photo, the photo-asset links and the album link.
//!
//! Decoding and file writes happen before the transaction opens, so a batch
//! that fails late can leave files on disk without rows. Those files are
//! named by digest and a retry reuses them.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use bytes::Bytes;
use shoebox_core::{AddedAsset, AppError, Digest};
use shoebox_db::TransactionGuard;
use sqlx::{Sqlite, Transaction};

use crate::ingestor::AssetIngestor;

/// Where the photo built from a batch goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    /// The uploader's library. Reuses the photo that already holds these
    /// assets, or creates one.
    Library,
    /// Like `Library`, and the photo is added to the album.
    Album(i64),
    /// Append every asset to this photo. Only its owner can.
    Photo(i64),
}

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// Reads a file from disk, keeping its base name.
    pub async fn from_path(path: &Path) -> Result<Self, AppError> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            AppError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::InvalidInput(format!("{} is not a file", path.display())))?;
        Ok(Self::new(filename, data))
    }
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub photo_id: i64,
    /// A new photo was created for this batch.
    pub created_photo: bool,
    /// One entry per distinct file content, in upload order.
    pub assets: Vec<AddedAsset>,
}

impl AssetIngestor {
    /// Single-file upload.
    pub async fn upload(
        &self,
        owner: Option<i64>,
        target: UploadTarget,
        file: UploadFile,
    ) -> Result<BatchOutcome, AppError> {
        self.upload_batch(owner, target, vec![file]).await
    }

    /// Ingests `files` as one photo for `owner` (`None` for album guests).
    ///
    /// Fails with `Conflict` when the files already belong to more than one
    /// photo of the owner, in which case nothing is committed.
    #[tracing::instrument(skip(self, files), fields(file_count = files.len()))]
    pub async fn upload_batch(
        &self,
        owner: Option<i64>,
        target: UploadTarget,
        files: Vec<UploadFile>,
    ) -> Result<BatchOutcome, AppError> {
        if files.is_empty() {
            return Err(AppError::InvalidInput("Upload contains no files".to_string()));
        }

        let mut seen = HashSet::new();
        let mut prepared = Vec::with_capacity(files.len());
        for file in files {
            self.check_size(&file.data, &file.filename)?;
            let digest = Digest::of(&file.data);
            if !seen.insert(digest) {
                tracing::debug!(
                    digest = %digest,
                    filename = %file.filename,
                    "Duplicate file in batch"
                );
                continue;
            }
            prepared.push(self.prepare_digest(digest, file.data, &file.filename).await?);
        }

        let _gate = self.write_gate.lock().await;
        let mut guard = TransactionGuard::begin(&self.pool).await?;
        let tx = guard.transaction()?;

        self.check_target(tx, owner, target).await?;

        let mut assets = Vec::with_capacity(prepared.len());
        for asset in prepared {
            assets.push(self.insert_prepared(tx, asset).await?);
        }

        let (photo_id, created_photo) = match target {
            UploadTarget::Photo(id) => (id, false),
            UploadTarget::Library | UploadTarget::Album(_) => {
                self.resolve_photo(tx, owner, &assets).await?
            }
        };

        for asset in &assets {
            self.photos.add_asset_tx(tx, photo_id, &asset.digest).await?;
        }
        if let UploadTarget::Album(album_id) = target {
            self.albums.add_photo_tx(tx, album_id, photo_id).await?;
        }

        guard.commit().await?;

        tracing::info!(
            photo_id,
            created_photo,
            asset_count = assets.len(),
            new_assets = assets.iter().filter(|a| !a.deduplicated).count(),
            "Upload committed"
        );

        Ok(BatchOutcome {
            photo_id,
            created_photo,
            assets,
        })
    }

    async fn check_target(
        &self,
        tx: &mut Transaction<'static, Sqlite>,
        owner: Option<i64>,
        target: UploadTarget,
    ) -> Result<(), AppError> {
        match target {
            UploadTarget::Library => Ok(()),
            UploadTarget::Album(id) => match self.albums.get_tx(tx, id).await? {
                Some(_) => Ok(()),
                None => Err(AppError::NotFound(format!("album {} not found", id))),
            },
            UploadTarget::Photo(id) => match self.photos.get_tx(tx, id).await? {
                Some(photo) if owner.is_some() && photo.owner == owner => Ok(()),
                _ => Err(AppError::NotFound(format!("photo {} not found", id))),
            },
        }
    }

    /// The photo of `owner` these assets belong to, creating one when none
    /// of them belongs to a photo yet. Returns the id and whether it is new.
    /// Guest uploads always get a new photo.
    async fn resolve_photo(
        &self,
        tx: &mut Transaction<'static, Sqlite>,
        owner: Option<i64>,
        assets: &[AddedAsset],
    ) -> Result<(i64, bool), AppError> {
        let mut existing = BTreeSet::new();
        if let Some(user) = owner {
            for asset in assets {
                let ids = self
                    .photos
                    .photos_for_asset_tx(tx, &asset.digest, Some(user))
                    .await?;
                if ids.len() > 1 {
                    return Err(AppError::Conflict(format!(
                        "asset {} belongs to {} photos",
                        asset.digest,
                        ids.len()
                    )));
                }
                existing.extend(ids);
            }
        }

        let existing: Vec<i64> = existing.into_iter().collect();
        match existing.as_slice() {
            [] => {
                let primary = assets
                    .first()
                    .ok_or_else(|| AppError::Internal("batch has no assets".to_string()))?;
                let photo = self.photos.create_tx(tx, owner, &primary.digest).await?;
                Ok((photo.id, true))
            }
            [id] => Ok((*id, false)),
            many => Err(AppError::Conflict(format!(
                "files belong to {} different photos: {:?}",
                many.len(),
                many
            ))),
        }
    }
}
