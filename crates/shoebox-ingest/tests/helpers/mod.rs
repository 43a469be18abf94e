//! Test helpers: an ingestor over an isolated SQLite database and asset
//! root inside a temporary directory.
//!
//! Run from workspace root: `cargo test -p shoebox-ingest`.

#![allow(dead_code)]

pub mod codecs;

use std::path::Path;

use shoebox_core::IngestConfig;
use shoebox_db::setup_database;
use shoebox_ingest::AssetIngestor;
use shoebox_processing::CodecDispatcher;
use shoebox_storage::create_asset_store;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Ingestor plus the directory that owns its files.
pub struct TestIngest {
    pub ingestor: AssetIngestor,
    pub config: IngestConfig,
    pub _root: TempDir,
}

impl TestIngest {
    pub fn pool(&self) -> &SqlitePool {
        self.ingestor.pool()
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(self.pool())
            .await
            .unwrap()
    }

    pub fn assets_dir(&self) -> &Path {
        &self.config.assets_dir
    }

    pub fn generated_dir(&self) -> &Path {
        &self.config.generated_dir
    }
}

/// File names in `dir`, sorted.
pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub async fn setup() -> TestIngest {
    setup_with(CodecDispatcher::new(), |_| {}).await
}

/// Setup with a custom dispatcher and config tweaks.
pub async fn setup_with(
    dispatcher: CodecDispatcher,
    configure: impl FnOnce(&mut IngestConfig),
) -> TestIngest {
    let root = tempfile::tempdir().unwrap();
    let mut config = IngestConfig::for_root(root.path());
    configure(&mut config);

    let pool = setup_database(&config).await.unwrap();
    let store = create_asset_store(&config).await.unwrap();

    TestIngest {
        ingestor: AssetIngestor::new(config.clone(), pool, store, dispatcher).unwrap(),
        config,
        _root: root,
    }
}
