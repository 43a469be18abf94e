//! Asset repository: the `assets` table, one row per unique original.

use shoebox_core::{AppError, Asset, Digest, GeoPoint, MediaKind, NewAsset};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::db::from_unix;

const ASSET_COLUMNS: &str = "sha256, created_at, original_filename, kind, thumbnail, thumbhash, \
     date_taken, latitude, longitude, altitude";

/// Row type for the assets table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct AssetRow {
    pub sha256: Vec<u8>,
    pub created_at: i64,
    pub original_filename: String,
    pub kind: MediaKind,
    pub thumbnail: Vec<u8>,
    pub thumbhash: Vec<u8>,
    pub date_taken: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
}

impl AssetRow {
    pub fn into_asset(self) -> Result<Asset, AppError> {
        let digest = Digest::try_from(self.sha256.as_slice())
            .map_err(|e| AppError::Internal(format!("corrupt asset key: {}", e)))?;

        let location = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
                altitude: self.altitude,
            }),
            _ => None,
        };

        Ok(Asset {
            digest,
            kind: self.kind,
            original_filename: self.original_filename,
            created_at: from_unix(self.created_at),
            thumbnail: self.thumbnail,
            thumbhash: self.thumbhash,
            taken_at: self.date_taken.map(from_unix),
            location,
        })
    }
}

#[derive(Clone)]
pub struct AssetRepository {
    pool: SqlitePool,
}

impl AssetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", digest = %digest))]
    pub async fn exists(&self, digest: &Digest) -> Result<bool, AppError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM assets WHERE sha256 = ?")
            .bind(&digest.as_bytes()[..])
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    #[tracing::instrument(skip(self, tx), fields(db.table = "assets", digest = %digest))]
    pub async fn exists_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        digest: &Digest,
    ) -> Result<bool, AppError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM assets WHERE sha256 = ?")
            .bind(&digest.as_bytes()[..])
            .fetch_optional(&mut **tx)
            .await?;
        Ok(found.is_some())
    }

    /// Fetch an asset by digest.
    #[tracing::instrument(skip(self), fields(db.table = "assets", digest = %digest))]
    pub async fn get(&self, digest: &Digest) -> Result<Option<Asset>, AppError> {
        let row: Option<AssetRow> = sqlx::query_as::<Sqlite, AssetRow>(&format!(
            "SELECT {} FROM assets WHERE sha256 = ?",
            ASSET_COLUMNS
        ))
        .bind(&digest.as_bytes()[..])
        .fetch_optional(&self.pool)
        .await?;
        row.map(AssetRow::into_asset).transpose()
    }

    /// Fetch an asset by digest within a transaction.
    #[tracing::instrument(skip(self, tx), fields(db.table = "assets", digest = %digest))]
    pub async fn get_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        digest: &Digest,
    ) -> Result<Option<Asset>, AppError> {
        let row: Option<AssetRow> = sqlx::query_as::<Sqlite, AssetRow>(&format!(
            "SELECT {} FROM assets WHERE sha256 = ?",
            ASSET_COLUMNS
        ))
        .bind(&digest.as_bytes()[..])
        .fetch_optional(&mut **tx)
        .await?;
        row.map(AssetRow::into_asset).transpose()
    }

    /// Insert an asset row unless one with the same digest exists. Returns
    /// whether a row was inserted.
    #[tracing::instrument(
        skip(self, tx, asset),
        fields(db.table = "assets", digest = %asset.digest, kind = asset.kind.as_str())
    )]
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        asset: &NewAsset,
    ) -> Result<bool, AppError> {
        let location = asset.capture.location;
        let result = sqlx::query(&format!(
            "INSERT OR IGNORE INTO assets ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            ASSET_COLUMNS
        ))
        .bind(&asset.digest.as_bytes()[..])
        .bind(chrono::Utc::now().timestamp())
        .bind(&asset.original_filename)
        .bind(asset.kind)
        .bind(&asset.thumbnail)
        .bind(&asset.thumbhash)
        .bind(asset.capture.taken_at.map(|t| t.timestamp()))
        .bind(location.map(|l| l.latitude))
        .bind(location.map(|l| l.longitude))
        .bind(location.and_then(|l| l.altitude))
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets"))]
    pub async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
