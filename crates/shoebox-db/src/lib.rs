//! Shoebox database layer: SQLite pool setup, migrations and repositories.

pub mod db;
pub mod setup;

pub use db::transaction::TransactionGuard;
pub use db::{AlbumRepository, AssetRepository, PhotoRepository};
pub use setup::{connect, setup_database};
