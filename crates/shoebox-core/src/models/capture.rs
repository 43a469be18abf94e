use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// EXIF orientation tag values 1..=8.
///
/// The variant names describe the transform needed to bring stored pixels
/// upright. Unknown or missing tags are treated as [`Orientation::Normal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Normal,
    MirrorHorizontal,
    Rotate180,
    MirrorVertical,
    MirrorHorizontalRotate270,
    Rotate90,
    MirrorHorizontalRotate90,
    Rotate270,
}

impl Orientation {
    pub const ALL: [Orientation; 8] = [
        Orientation::Normal,
        Orientation::MirrorHorizontal,
        Orientation::Rotate180,
        Orientation::MirrorVertical,
        Orientation::MirrorHorizontalRotate270,
        Orientation::Rotate90,
        Orientation::MirrorHorizontalRotate90,
        Orientation::Rotate270,
    ];

    /// Maps a raw EXIF value; anything outside 1..=8 yields `None`.
    pub fn from_exif(value: u32) -> Option<Self> {
        match value {
            1 => Some(Orientation::Normal),
            2 => Some(Orientation::MirrorHorizontal),
            3 => Some(Orientation::Rotate180),
            4 => Some(Orientation::MirrorVertical),
            5 => Some(Orientation::MirrorHorizontalRotate270),
            6 => Some(Orientation::Rotate90),
            7 => Some(Orientation::MirrorHorizontalRotate90),
            8 => Some(Orientation::Rotate270),
            _ => None,
        }
    }

    pub fn exif_value(&self) -> u32 {
        match self {
            Orientation::Normal => 1,
            Orientation::MirrorHorizontal => 2,
            Orientation::Rotate180 => 3,
            Orientation::MirrorVertical => 4,
            Orientation::MirrorHorizontalRotate270 => 5,
            Orientation::Rotate90 => 6,
            Orientation::MirrorHorizontalRotate90 => 7,
            Orientation::Rotate270 => 8,
        }
    }

    /// True for the four orientations whose upright image has width and
    /// height swapped relative to the stored pixels.
    pub fn swaps_dimensions(&self) -> bool {
        matches!(
            self,
            Orientation::MirrorHorizontalRotate270
                | Orientation::Rotate90
                | Orientation::MirrorHorizontalRotate90
                | Orientation::Rotate270
        )
    }
}

/// GPS position in decimal degrees, negative for south and west.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

/// What the EXIF block says about how and where a picture was taken. Every
/// field is optional in practice; absence is never an error.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CaptureMetadata {
    pub orientation: Orientation,
    pub taken_at: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_exif_values_are_consistent() {
        for orientation in Orientation::ALL {
            assert_eq!(
                Orientation::from_exif(orientation.exif_value()),
                Some(orientation)
            );
        }
        assert_eq!(Orientation::from_exif(0), None);
        assert_eq!(Orientation::from_exif(9), None);
    }

    #[test]
    fn test_swapping_orientations() {
        let swapping: Vec<u32> = Orientation::ALL
            .iter()
            .filter(|o| o.swaps_dimensions())
            .map(|o| o.exif_value())
            .collect();
        assert_eq!(swapping, vec![5, 6, 7, 8]);
    }

    #[test]
    fn test_default_capture_metadata_is_empty() {
        let meta = CaptureMetadata::default();
        assert_eq!(meta.orientation, Orientation::Normal);
        assert!(meta.taken_at.is_none());
        assert!(meta.location.is_none());
    }
}
