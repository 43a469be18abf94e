//! Photo repository: `photos` and the `photo_assets` link table.

use shoebox_core::{AppError, Digest, Photo};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::db::from_unix;

/// Row type for the photos table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct PhotoRow {
    pub id: i64,
    pub owner: Option<i64>,
    pub primary_asset: Vec<u8>,
    pub created_at: i64,
}

impl PhotoRow {
    pub fn into_photo(self) -> Result<Photo, AppError> {
        let primary_asset = Digest::try_from(self.primary_asset.as_slice())
            .map_err(|e| AppError::Internal(format!("corrupt photo asset key: {}", e)))?;
        Ok(Photo {
            id: self.id,
            owner: self.owner,
            primary_asset,
            created_at: from_unix(self.created_at),
        })
    }
}

#[derive(Clone)]
pub struct PhotoRepository {
    pool: SqlitePool,
}

impl PhotoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a photo whose primary asset is `primary_asset`. The asset is
    /// not linked; call [`Self::add_asset_tx`] for that.
    #[tracing::instrument(skip(self, tx), fields(db.table = "photos", primary_asset = %primary_asset))]
    pub async fn create_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        owner: Option<i64>,
        primary_asset: &Digest,
    ) -> Result<Photo, AppError> {
        let row: PhotoRow = sqlx::query_as::<Sqlite, PhotoRow>(
            r#"
            INSERT INTO photos (owner, primary_asset, created_at)
            VALUES (?, ?, ?)
            RETURNING id, owner, primary_asset, created_at
            "#,
        )
        .bind(owner)
        .bind(&primary_asset.as_bytes()[..])
        .bind(chrono::Utc::now().timestamp())
        .fetch_one(&mut **tx)
        .await?;
        row.into_photo()
    }

    /// Link an asset to a photo. Linking twice is a no-op.
    #[tracing::instrument(skip(self, tx), fields(db.table = "photo_assets", db.record_id = photo_id, digest = %digest))]
    pub async fn add_asset_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        photo_id: i64,
        digest: &Digest,
    ) -> Result<(), AppError> {
        sqlx::query("INSERT OR IGNORE INTO photo_assets (photo_id, asset_id) VALUES (?, ?)")
            .bind(photo_id)
            .bind(&digest.as_bytes()[..])
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Ids of the photos of `owner` that contain `digest`. Guest photos have
    /// no owner and never match, not even for `None`.
    #[tracing::instrument(skip(self, tx), fields(db.table = "photo_assets", digest = %digest))]
    pub async fn photos_for_asset_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        digest: &Digest,
        owner: Option<i64>,
    ) -> Result<Vec<i64>, AppError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT photos.id
            FROM photos
            JOIN photo_assets ON photo_assets.photo_id = photos.id
            WHERE photo_assets.asset_id = ? AND photos.owner = ?
            ORDER BY photos.id
            "#,
        )
        .bind(&digest.as_bytes()[..])
        .bind(owner)
        .fetch_all(&mut **tx)
        .await?;
        Ok(ids)
    }

    #[tracing::instrument(skip(self, tx), fields(db.table = "photos", db.record_id = id))]
    pub async fn get_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
    ) -> Result<Option<Photo>, AppError> {
        let row: Option<PhotoRow> = sqlx::query_as::<Sqlite, PhotoRow>(
            "SELECT id, owner, primary_asset, created_at FROM photos WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        row.map(PhotoRow::into_photo).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "photos", db.record_id = id))]
    pub async fn get(&self, id: i64) -> Result<Option<Photo>, AppError> {
        let row: Option<PhotoRow> = sqlx::query_as::<Sqlite, PhotoRow>(
            "SELECT id, owner, primary_asset, created_at FROM photos WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(PhotoRow::into_photo).transpose()
    }

    /// Digests linked to a photo, in link order.
    #[tracing::instrument(skip(self), fields(db.table = "photo_assets", db.record_id = photo_id))]
    pub async fn assets(&self, photo_id: i64) -> Result<Vec<Digest>, AppError> {
        let rows: Vec<Vec<u8>> = sqlx::query_scalar(
            "SELECT asset_id FROM photo_assets WHERE photo_id = ? ORDER BY rowid",
        )
        .bind(photo_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|bytes| {
                Digest::try_from(bytes.as_slice())
                    .map_err(|e| AppError::Internal(format!("corrupt photo asset key: {}", e)))
            })
            .collect()
    }

    #[tracing::instrument(skip(self), fields(db.table = "photos"))]
    pub async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM photos")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AssetRepository;
    use shoebox_core::{CaptureMetadata, MediaKind, NewAsset};

    async fn setup() -> (tempfile::TempDir, SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("photos.db").display());
        let pool = crate::connect(&url, 2).await.unwrap();
        (dir, pool)
    }

    async fn insert_asset(tx: &mut Transaction<'_, Sqlite>, pool: &SqlitePool, bytes: &[u8]) -> Digest {
        let asset = NewAsset {
            digest: Digest::of(bytes),
            kind: MediaKind::Jpg,
            original_filename: "a.jpg".to_string(),
            thumbnail: vec![],
            thumbhash: vec![],
            capture: CaptureMetadata::default(),
        };
        AssetRepository::new(pool.clone())
            .insert_tx(tx, &asset)
            .await
            .unwrap();
        asset.digest
    }

    #[tokio::test]
    async fn test_create_and_link() {
        let (_dir, pool) = setup().await;
        let photos = PhotoRepository::new(pool.clone());

        let mut tx = pool.begin().await.unwrap();
        let heic = insert_asset(&mut tx, &pool, b"heic").await;
        let jpg = insert_asset(&mut tx, &pool, b"jpg").await;
        let photo = photos.create_tx(&mut tx, Some(7), &heic).await.unwrap();
        photos.add_asset_tx(&mut tx, photo.id, &heic).await.unwrap();
        photos.add_asset_tx(&mut tx, photo.id, &jpg).await.unwrap();
        photos.add_asset_tx(&mut tx, photo.id, &jpg).await.unwrap();
        tx.commit().await.unwrap();

        let stored = photos.get(photo.id).await.unwrap().unwrap();
        assert_eq!(stored.owner, Some(7));
        assert_eq!(stored.primary_asset, heic);
        assert_eq!(photos.assets(photo.id).await.unwrap(), vec![heic, jpg]);
    }

    #[tokio::test]
    async fn test_photos_for_asset_is_scoped_to_owner() {
        let (_dir, pool) = setup().await;
        let photos = PhotoRepository::new(pool.clone());

        let mut tx = pool.begin().await.unwrap();
        let digest = insert_asset(&mut tx, &pool, b"shared").await;
        let mine = photos.create_tx(&mut tx, Some(1), &digest).await.unwrap();
        photos.add_asset_tx(&mut tx, mine.id, &digest).await.unwrap();
        let guest = photos.create_tx(&mut tx, None, &digest).await.unwrap();
        photos.add_asset_tx(&mut tx, guest.id, &digest).await.unwrap();

        assert_eq!(
            photos.photos_for_asset_tx(&mut tx, &digest, Some(1)).await.unwrap(),
            vec![mine.id]
        );
        assert!(photos
            .photos_for_asset_tx(&mut tx, &digest, None)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(photos.get_tx(&mut tx, guest.id).await.unwrap().unwrap().owner, None);
        assert!(photos
            .photos_for_asset_tx(&mut tx, &digest, Some(2))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_photo_requires_existing_asset() {
        let (_dir, pool) = setup().await;
        let photos = PhotoRepository::new(pool.clone());

        let mut tx = pool.begin().await.unwrap();
        let result = photos
            .create_tx(&mut tx, Some(1), &Digest::of(b"missing"))
            .await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
