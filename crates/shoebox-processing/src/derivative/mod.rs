//! Derived artifacts: the JPEG thumbnail, its ThumbHash placeholder and the
//! full-size JPEG copy served for HEIC originals.

mod encode;
mod resize;
mod thumbnail;

pub use encode::{encode_jpeg, EncodeError};
pub use resize::resize_srgb;
pub use thumbnail::{
    generate_thumbnail, thumbhash_of, thumbnail_dimensions, Thumbnail, ThumbnailOptions,
    THUMBHASH_MAX_EDGE,
};
