//! Album repository: `albums` and the `album_photos` link table.

use shoebox_core::{AppError, Album};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::db::from_unix;

#[derive(Debug, sqlx::FromRow)]
pub struct AlbumRow {
    pub id: i64,
    pub owner: i64,
    pub name: String,
    pub url_slug: String,
    pub created_at: i64,
}

impl From<AlbumRow> for Album {
    fn from(row: AlbumRow) -> Self {
        Album {
            id: row.id,
            owner: row.owner,
            name: row.name,
            url_slug: row.url_slug,
            created_at: from_unix(row.created_at),
        }
    }
}

#[derive(Clone)]
pub struct AlbumRepository {
    pool: SqlitePool,
}

impl AlbumRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "albums"))]
    pub async fn create(&self, owner: i64, name: &str, url_slug: &str) -> Result<Album, AppError> {
        let row: AlbumRow = sqlx::query_as::<Sqlite, AlbumRow>(
            r#"
            INSERT INTO albums (owner, name, url_slug, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, owner, name, url_slug, created_at
            "#,
        )
        .bind(owner)
        .bind(name)
        .bind(url_slug)
        .bind(chrono::Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("album slug '{}' is already taken", url_slug))
            }
            other => AppError::Database(other),
        })?;

        tracing::info!(album_id = row.id, owner, "Album created");
        Ok(row.into())
    }

    #[tracing::instrument(skip(self), fields(db.table = "albums", db.record_id = id))]
    pub async fn get(&self, id: i64) -> Result<Option<Album>, AppError> {
        let row: Option<AlbumRow> = sqlx::query_as::<Sqlite, AlbumRow>(
            "SELECT id, owner, name, url_slug, created_at FROM albums WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Album::from))
    }

    #[tracing::instrument(skip(self, tx), fields(db.table = "albums", db.record_id = id))]
    pub async fn get_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
    ) -> Result<Option<Album>, AppError> {
        let row: Option<AlbumRow> = sqlx::query_as::<Sqlite, AlbumRow>(
            "SELECT id, owner, name, url_slug, created_at FROM albums WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row.map(Album::from))
    }

    /// Add a photo to an album. Adding it twice is a no-op.
    #[tracing::instrument(skip(self, tx), fields(db.table = "album_photos", db.record_id = album_id))]
    pub async fn add_photo_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        album_id: i64,
        photo_id: i64,
    ) -> Result<(), AppError> {
        sqlx::query("INSERT OR IGNORE INTO album_photos (album_id, photo_id) VALUES (?, ?)")
            .bind(album_id)
            .bind(photo_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Photo ids in an album, oldest first.
    #[tracing::instrument(skip(self), fields(db.table = "album_photos", db.record_id = album_id))]
    pub async fn photos(&self, album_id: i64) -> Result<Vec<i64>, AppError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT photo_id FROM album_photos WHERE album_id = ? ORDER BY photo_id",
        )
        .bind(album_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AssetRepository, PhotoRepository};
    use shoebox_core::{CaptureMetadata, Digest, MediaKind, NewAsset};

    async fn pool() -> (tempfile::TempDir, SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("albums.db").display());
        let pool = crate::connect(&url, 2).await.unwrap();
        (dir, pool)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_dir, pool) = pool().await;
        let albums = AlbumRepository::new(pool);

        let album = albums.create(3, "Holiday", "holiday-2023").await.unwrap();
        let stored = albums.get(album.id).await.unwrap().unwrap();
        assert_eq!(stored.owner, 3);
        assert_eq!(stored.name, "Holiday");
        assert_eq!(stored.url_slug, "holiday-2023");
        assert!(albums.get(album.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict() {
        let (_dir, pool) = pool().await;
        let albums = AlbumRepository::new(pool);

        albums.create(1, "A", "same").await.unwrap();
        let err = albums.create(2, "B", "same").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_add_photo_is_idempotent() {
        let (_dir, pool) = pool().await;
        let albums = AlbumRepository::new(pool.clone());
        let photos = PhotoRepository::new(pool.clone());
        let album = albums.create(1, "Trip", "trip").await.unwrap();

        let asset = NewAsset {
            digest: Digest::of(b"album photo"),
            kind: MediaKind::Jpg,
            original_filename: "a.jpg".to_string(),
            thumbnail: vec![],
            thumbhash: vec![],
            capture: CaptureMetadata::default(),
        };

        let mut tx = pool.begin().await.unwrap();
        AssetRepository::new(pool.clone())
            .insert_tx(&mut tx, &asset)
            .await
            .unwrap();
        let photo = photos.create_tx(&mut tx, None, &asset.digest).await.unwrap();
        albums.add_photo_tx(&mut tx, album.id, photo.id).await.unwrap();
        albums.add_photo_tx(&mut tx, album.id, photo.id).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(albums.photos(album.id).await.unwrap(), vec![photo.id]);
    }
}
