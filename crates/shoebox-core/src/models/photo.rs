use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Digest;

/// A logical photo: a group of assets (for example a HEIC and the JPEG a
/// phone exported next to it) shown as one item in a library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    /// `None` for photos uploaded by album guests.
    pub owner: Option<i64>,
    pub primary_asset: Digest,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub owner: i64,
    pub name: String,
    pub url_slug: String,
    pub created_at: DateTime<Utc>,
}
