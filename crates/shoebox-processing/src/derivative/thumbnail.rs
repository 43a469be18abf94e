use image::{imageops, RgbaImage};

use super::{encode_jpeg, resize_srgb, EncodeError};

/// ThumbHash only accepts images up to 100x100.
pub const THUMBHASH_MAX_EDGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailOptions {
    /// Upper bound for the longer edge.
    pub max_edge: u32,
    pub quality: u8,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            max_edge: 512,
            quality: 75,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub jpeg: Vec<u8>,
    pub thumbhash: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Size that fits `width` x `height` inside `max_edge` without upscaling,
/// keeping the aspect ratio. Neither edge drops below one pixel.
pub fn thumbnail_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let max_edge = max_edge.max(1);
    let longest = width.max(height);
    if longest <= max_edge || longest == 0 {
        return (width, height);
    }

    let scale = f64::from(max_edge) / f64::from(longest);
    let scaled = |edge: u32| ((f64::from(edge) * scale).round() as u32).clamp(1, max_edge);
    (scaled(width), scaled(height))
}

/// Downscales the upright image, encodes it as JPEG and hashes it.
pub fn generate_thumbnail(
    img: &RgbaImage,
    options: &ThumbnailOptions,
) -> Result<Thumbnail, EncodeError> {
    let (width, height) = thumbnail_dimensions(img.width(), img.height(), options.max_edge);
    let small = resize_srgb(img, width, height);

    Ok(Thumbnail {
        jpeg: encode_jpeg(&small, options.quality)?,
        thumbhash: thumbhash_of(&small),
        width,
        height,
    })
}

/// ThumbHash of `img`, box-reduced first when it exceeds 100x100.
pub fn thumbhash_of(img: &RgbaImage) -> Vec<u8> {
    let (width, height) = thumbnail_dimensions(img.width(), img.height(), THUMBHASH_MAX_EDGE);
    if (width, height) == img.dimensions() {
        return thumbhash::rgba_to_thumb_hash(width as usize, height as usize, img.as_raw());
    }

    let reduced = imageops::thumbnail(img, width, height);
    thumbhash::rgba_to_thumb_hash(width as usize, height as usize, reduced.as_raw())
}
