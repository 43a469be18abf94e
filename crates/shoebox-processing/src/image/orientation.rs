//! EXIF orientation normalisation.
//!
//! Each non-identity orientation is described as a walk: where source pixel
//! (0, 0) lands in the output, and which way the output cursor moves for
//! one step along a source row (`dx`) and one step down a source column
//! (`dy`). Copying every source pixel along that walk produces the upright
//! image in a single pass, whatever the transform.

use image::RgbaImage;
use shoebox_core::Orientation;

/// Which end of an output axis a walk starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Near,
    Far,
}

impl Edge {
    fn start(self, len: u32) -> i64 {
        match self {
            Edge::Near => 0,
            Edge::Far => i64::from(len) - 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Walk {
    pub origin: (Edge, Edge),
    pub dx: (i64, i64),
    pub dy: (i64, i64),
}

impl Walk {
    /// A source row maps onto an output column when `dx` has no horizontal
    /// component; width and height trade places.
    pub fn swaps_dimensions(&self) -> bool {
        self.dx.0 == 0
    }
}

/// The walk for `orientation`, or `None` when pixels are already upright.
pub fn walk_for(orientation: Orientation) -> Option<Walk> {
    use Edge::{Far, Near};

    let (origin, dx, dy) = match orientation {
        Orientation::Normal => return None,
        Orientation::MirrorHorizontal => ((Far, Near), (-1, 0), (0, 1)),
        Orientation::Rotate180 => ((Far, Far), (-1, 0), (0, -1)),
        Orientation::MirrorVertical => ((Near, Far), (1, 0), (0, -1)),
        Orientation::MirrorHorizontalRotate270 => ((Near, Near), (0, 1), (1, 0)),
        Orientation::Rotate90 => ((Far, Near), (0, 1), (-1, 0)),
        Orientation::MirrorHorizontalRotate90 => ((Far, Far), (0, -1), (-1, 0)),
        Orientation::Rotate270 => ((Near, Far), (0, -1), (1, 0)),
    };
    Some(Walk { origin, dx, dy })
}

/// Rewrites `img` so that it displays upright.
///
/// The identity orientation hands the buffer back untouched; every other
/// orientation allocates exactly one output buffer.
pub fn reorient(img: RgbaImage, orientation: Orientation) -> RgbaImage {
    let Some(walk) = walk_for(orientation) else {
        return img;
    };

    let (width, height) = img.dimensions();
    let (out_width, out_height) = if walk.swaps_dimensions() {
        (height, width)
    } else {
        (width, height)
    };

    let mut out = RgbaImage::new(out_width, out_height);
    let start_x = walk.origin.0.start(out_width);
    let start_y = walk.origin.1.start(out_height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let (x, y) = (i64::from(x), i64::from(y));
        let out_x = start_x + walk.dx.0 * x + walk.dy.0 * y;
        let out_y = start_y + walk.dx.1 * x + walk.dy.1 * y;
        out.put_pixel(out_x as u32, out_y as u32, *pixel);
    }

    tracing::trace!(
        orientation = orientation.exif_value(),
        width = out_width,
        height = out_height,
        "Reoriented image"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{corner_image, BLUE, GREEN, RED, WHITE};
    use image::{imageops, Rgba};

    fn corners(img: &RgbaImage) -> [Rgba<u8>; 4] {
        let (w, h) = img.dimensions();
        [
            *img.get_pixel(0, 0),
            *img.get_pixel(w - 1, 0),
            *img.get_pixel(0, h - 1),
            *img.get_pixel(w - 1, h - 1),
        ]
    }

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 40) as u8, (y * 60) as u8, (x + y) as u8, 255])
        })
    }

    #[test]
    fn test_identity_reuses_buffer() {
        let img = corner_image(4, 3);
        let ptr = img.as_raw().as_ptr();
        let out = reorient(img, Orientation::Normal);
        assert_eq!(out.as_raw().as_ptr(), ptr);
        assert_eq!(corners(&out), [RED, GREEN, BLUE, WHITE]);
    }

    #[test]
    fn test_corner_placement_for_every_orientation() {
        // Source corners, in order TL, TR, BL, BR: red, green, blue, white.
        let expected = [
            (Orientation::MirrorHorizontal, [GREEN, RED, WHITE, BLUE]),
            (Orientation::Rotate180, [WHITE, BLUE, GREEN, RED]),
            (Orientation::MirrorVertical, [BLUE, WHITE, RED, GREEN]),
            (Orientation::MirrorHorizontalRotate270, [RED, BLUE, GREEN, WHITE]),
            (Orientation::Rotate90, [BLUE, RED, WHITE, GREEN]),
            (Orientation::MirrorHorizontalRotate90, [WHITE, GREEN, BLUE, RED]),
            (Orientation::Rotate270, [GREEN, WHITE, RED, BLUE]),
        ];

        for (orientation, corners_after) in expected {
            let out = reorient(corner_image(4, 3), orientation);
            assert_eq!(corners(&out), corners_after, "{:?}", orientation);
        }
    }

    #[test]
    fn test_swapping_orientations_swap_dimensions() {
        for orientation in Orientation::ALL {
            let out = reorient(corner_image(5, 2), orientation);
            let expected = if orientation.swaps_dimensions() {
                (2, 5)
            } else {
                (5, 2)
            };
            assert_eq!(out.dimensions(), expected, "{:?}", orientation);
            assert_eq!(
                walk_for(orientation).map(|w| w.swaps_dimensions()).unwrap_or(false),
                orientation.swaps_dimensions()
            );
        }
    }

    #[test]
    fn test_matches_imageops_rotations_and_flips() {
        let src = gradient(5, 3);
        let cases = [
            (Orientation::MirrorHorizontal, imageops::flip_horizontal(&src)),
            (Orientation::Rotate180, imageops::rotate180(&src)),
            (Orientation::MirrorVertical, imageops::flip_vertical(&src)),
            (
                Orientation::MirrorHorizontalRotate270,
                imageops::flip_horizontal(&imageops::rotate90(&src)),
            ),
            (Orientation::Rotate90, imageops::rotate90(&src)),
            (
                Orientation::MirrorHorizontalRotate90,
                imageops::flip_horizontal(&imageops::rotate270(&src)),
            ),
            (Orientation::Rotate270, imageops::rotate270(&src)),
        ];

        for (orientation, expected) in cases {
            assert_eq!(reorient(src.clone(), orientation), expected, "{:?}", orientation);
        }
    }

    #[test]
    fn test_single_pixel_image() {
        let src = RgbaImage::from_pixel(1, 1, RED);
        for orientation in Orientation::ALL {
            assert_eq!(reorient(src.clone(), orientation).get_pixel(0, 0), &RED);
        }
    }
}
