use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CaptureMetadata, Digest, GeoPoint, MediaKind};

/// A stored asset row: one unique set of original bytes plus its derivatives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub digest: Digest,
    pub kind: MediaKind,
    pub original_filename: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub thumbnail: Vec<u8>,
    #[serde(skip)]
    pub thumbhash: Vec<u8>,
    pub taken_at: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
}

/// Everything needed to insert an asset row.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub digest: Digest,
    pub kind: MediaKind,
    pub original_filename: String,
    pub thumbnail: Vec<u8>,
    pub thumbhash: Vec<u8>,
    pub capture: CaptureMetadata,
}

/// Result of adding one file to the library.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddedAsset {
    pub digest: Digest,
    pub kind: MediaKind,
    pub taken_at: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
    /// The bytes were already stored; nothing was decoded or written.
    pub deduplicated: bool,
}

impl AddedAsset {
    pub fn from_existing(asset: &Asset) -> Self {
        Self {
            digest: asset.digest,
            kind: asset.kind,
            taken_at: asset.taken_at,
            location: asset.location,
            deduplicated: true,
        }
    }
}
