//! Configuration module
//!
//! Settings for the ingest pipeline, loaded from the environment. Binaries
//! load `.env` before calling [`IngestConfig::from_env`].

use std::env;
use std::path::{Path, PathBuf};

const DATABASE_URL: &str = "sqlite://shoebox.db";
const ASSETS_DIR: &str = "assets";
const GENERATED_DIR: &str = "generated";
const THUMBNAIL_SIZE: u32 = 512;
const THUMBNAIL_QUALITY: u8 = 75;
const FALLBACK_JPEG_QUALITY: u8 = 95;
const MAX_UPLOAD_SIZE_MB: usize = 100;
const DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    /// Originals, named `<hex digest><kind extension>`.
    pub assets_dir: PathBuf,
    /// Generated files such as the JPEG copy of HEIC originals.
    pub generated_dir: PathBuf,
    /// Cap on the longer edge of thumbnails, in pixels.
    pub thumbnail_size: u32,
    pub thumbnail_quality: u8,
    pub fallback_jpeg_quality: u8,
    pub max_upload_size_bytes: usize,
    pub environment: String,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be a valid number"))?;

        let config = Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| DATABASE_URL.to_string()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| DB_MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(DB_MAX_CONNECTIONS),
            assets_dir: env::var("ASSETS_DIR")
                .unwrap_or_else(|_| ASSETS_DIR.to_string())
                .into(),
            generated_dir: env::var("GENERATED_DIR")
                .unwrap_or_else(|_| GENERATED_DIR.to_string())
                .into(),
            thumbnail_size: env::var("THUMBNAIL_SIZE")
                .unwrap_or_else(|_| THUMBNAIL_SIZE.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("THUMBNAIL_SIZE must be a valid number"))?,
            thumbnail_quality: env::var("THUMBNAIL_QUALITY")
                .unwrap_or_else(|_| THUMBNAIL_QUALITY.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("THUMBNAIL_QUALITY must be a number from 1 to 100"))?,
            fallback_jpeg_quality: env::var("FALLBACK_JPEG_QUALITY")
                .unwrap_or_else(|_| FALLBACK_JPEG_QUALITY.to_string())
                .parse()
                .map_err(|_| {
                    anyhow::anyhow!("FALLBACK_JPEG_QUALITY must be a number from 1 to 100")
                })?,
            max_upload_size_bytes: max_upload_size_mb
                .checked_mul(1024 * 1024)
                .ok_or_else(|| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large"))?,
            environment: env::var("ENVIRONMENT")
                .or_else(|_| env::var("APP_ENV"))
                .unwrap_or_else(|_| "development".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// A config keeping the database and both directories under `root`.
    pub fn for_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            database_url: format!("sqlite://{}", root.join("shoebox.db").display()),
            db_max_connections: DB_MAX_CONNECTIONS,
            assets_dir: root.join(ASSETS_DIR),
            generated_dir: root.join(GENERATED_DIR),
            thumbnail_size: THUMBNAIL_SIZE,
            thumbnail_quality: THUMBNAIL_QUALITY,
            fallback_jpeg_quality: FALLBACK_JPEG_QUALITY,
            max_upload_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            environment: "development".to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("sqlite:") {
            anyhow::bail!("DATABASE_URL must be a sqlite: URL");
        }
        if self.thumbnail_size == 0 {
            anyhow::bail!("THUMBNAIL_SIZE must be greater than zero");
        }
        for (name, quality) in [
            ("THUMBNAIL_QUALITY", self.thumbnail_quality),
            ("FALLBACK_JPEG_QUALITY", self.fallback_jpeg_quality),
        ] {
            if !(1..=100).contains(&quality) {
                anyhow::bail!("{} must be between 1 and 100, got {}", name, quality);
            }
        }
        if self.max_upload_size_bytes == 0 {
            anyhow::bail!("MAX_UPLOAD_SIZE_MB must be greater than zero");
        }
        if self.assets_dir == self.generated_dir {
            anyhow::bail!("ASSETS_DIR and GENERATED_DIR must be different directories");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_root_defaults_are_valid() {
        let config = IngestConfig::for_root("/srv/shoebox");
        assert!(config.validate().is_ok());
        assert_eq!(config.database_url, "sqlite:///srv/shoebox/shoebox.db");
        assert_eq!(config.assets_dir, PathBuf::from("/srv/shoebox/assets"));
        assert_eq!(config.generated_dir, PathBuf::from("/srv/shoebox/generated"));
        assert_eq!(config.thumbnail_size, 512);
        assert_eq!(config.thumbnail_quality, 75);
        assert_eq!(config.fallback_jpeg_quality, 95);
    }

    #[test]
    fn test_validate_rejects_non_sqlite_url() {
        let mut config = IngestConfig::for_root("/tmp/x");
        config.database_url = "postgres://localhost/shoebox".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_quality() {
        let mut config = IngestConfig::for_root("/tmp/x");
        config.fallback_jpeg_quality = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("FALLBACK_JPEG_QUALITY"));

        let mut config = IngestConfig::for_root("/tmp/x");
        config.thumbnail_quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_shared_directories() {
        let mut config = IngestConfig::for_root("/tmp/x");
        config.generated_dir = config.assets_dir.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_thumbnail_size() {
        let mut config = IngestConfig::for_root("/tmp/x");
        config.thumbnail_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("THUMBNAIL_SIZE"));
    }

    #[test]
    fn test_is_production() {
        let mut config = IngestConfig::for_root("/tmp/x");
        assert!(!config.is_production());
        config.environment = "Production".to_string();
        assert!(config.is_production());
    }
}
