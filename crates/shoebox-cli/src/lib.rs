//! Report types printed by the `shoebox` binary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shoebox_core::{AddedAsset, Digest, GeoPoint, MediaKind};
use shoebox_ingest::BatchOutcome;
use shoebox_processing::extract_metadata;

/// What the pipeline would read from a file, without storing anything.
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub filename: String,
    pub digest: Digest,
    pub kind: MediaKind,
    pub size_bytes: usize,
    /// EXIF orientation code, 1 to 8.
    pub orientation: u32,
    pub taken_at: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
}

impl InspectReport {
    pub fn from_bytes(filename: &str, data: &[u8]) -> Self {
        let capture = extract_metadata(data);
        Self {
            filename: filename.to_string(),
            digest: Digest::of(data),
            kind: MediaKind::from_filename(filename),
            size_bytes: data.len(),
            orientation: capture.orientation.exif_value(),
            taken_at: capture.taken_at,
            location: capture.location,
        }
    }
}

/// One ingested file.
#[derive(Debug, Serialize)]
pub struct IngestReport {
    pub file: String,
    pub photo_id: i64,
    pub created_photo: bool,
    #[serde(flatten)]
    pub asset: AddedAsset,
}

impl IngestReport {
    /// `None` when the outcome holds no asset.
    pub fn new(file: impl Into<String>, outcome: BatchOutcome) -> Option<Self> {
        let asset = outcome.assets.into_iter().next()?;
        Some(Self {
            file: file.into(),
            photo_id: outcome.photo_id,
            created_photo: outcome.created_photo,
            asset,
        })
    }
}

/// Initialize tracing for the CLI. `RUST_LOG` overrides the default filter;
/// `json` switches to one JSON object per line.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("shoebox=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shoebox_processing::testing::{corner_image, jpeg_bytes, png_bytes, with_exif, ExifFixture};

    #[test]
    fn test_inspect_plain_png() {
        let data = png_bytes(&corner_image(4, 4));
        let report = InspectReport::from_bytes("tiny.png", &data);

        assert_eq!(report.kind, MediaKind::Jpg);
        assert_eq!(report.digest, Digest::of(&data));
        assert_eq!(report.orientation, 1);
        assert!(report.taken_at.is_none());
        assert!(report.location.is_none());
    }

    #[test]
    fn test_inspect_reads_exif() {
        let data = with_exif(
            &jpeg_bytes(&corner_image(8, 4), 80),
            &ExifFixture {
                orientation: Some(8),
                date_time: Some("2019:12:31 23:59:59"),
                gps: None,
            },
        );
        let report = InspectReport::from_bytes("IMG_0002.HEIC", &data);

        assert_eq!(report.kind, MediaKind::Heic);
        assert_eq!(report.orientation, 8);
        assert_eq!(
            report.taken_at,
            Some(Utc.with_ymd_and_hms(2019, 12, 31, 23, 59, 59).unwrap())
        );
    }

    #[test]
    fn test_ingest_report_serializes_flat() {
        let digest = Digest::of(b"x");
        let report = IngestReport::new(
            "a.jpg",
            BatchOutcome {
                photo_id: 7,
                created_photo: true,
                assets: vec![AddedAsset {
                    digest,
                    kind: MediaKind::Jpg,
                    taken_at: None,
                    location: None,
                    deduplicated: false,
                }],
            },
        )
        .unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["photo_id"], 7);
        assert_eq!(json["digest"], digest.to_hex());
        assert_eq!(json["kind"], "jpg");
        assert_eq!(json["deduplicated"], false);
    }

    #[test]
    fn test_ingest_report_without_assets() {
        let outcome = BatchOutcome {
            photo_id: 1,
            created_photo: false,
            assets: vec![],
        };
        assert!(IngestReport::new("a.jpg", outcome).is_none());
    }
}
