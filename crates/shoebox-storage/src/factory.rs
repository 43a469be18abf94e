use std::sync::Arc;

use shoebox_core::IngestConfig;

use crate::{AssetStore, LocalAssetStore, StorageResult};

/// Builds the asset store described by `config`.
pub async fn create_asset_store(config: &IngestConfig) -> StorageResult<Arc<dyn AssetStore>> {
    let store = LocalAssetStore::new(&config.assets_dir, &config.generated_dir).await?;
    Ok(Arc::new(store))
}
