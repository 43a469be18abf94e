use serde::{Deserialize, Serialize};

/// Storage kind of an asset, derived from the uploaded file's extension.
///
/// Every plain raster format (JPEG, PNG, GIF, WebP, AVIF, ...) is stored under
/// the `jpg` kind; only HEIC/HEIF containers get their own kind because they
/// are the only originals that need a browser-friendly JPEG copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Jpg,
    Heic,
}

impl MediaKind {
    /// Kind for a file name; the extension is matched case-insensitively.
    pub fn from_filename(filename: &str) -> Self {
        match extension_of(filename).as_deref() {
            Some("heic") | Some("heif") => MediaKind::Heic,
            _ => MediaKind::Jpg,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Jpg => "jpg",
            MediaKind::Heic => "heic",
        }
    }

    /// Extension (with leading dot) of the stored original.
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Jpg => ".jpg",
            MediaKind::Heic => ".heic",
        }
    }

    /// Whether originals of this kind get a generated JPEG copy next to them.
    pub fn needs_fallback_jpeg(&self) -> bool {
        matches!(self, MediaKind::Heic)
    }
}

/// Lowercased extension of `filename` without the dot, if it has one.
pub fn extension_of(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
