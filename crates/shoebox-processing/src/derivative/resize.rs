//! Gamma-correct resampling.
//!
//! Filtering happens in linear light: channels are decoded from sRGB to
//! linear `f32`, resampled with a triangle filter, and encoded back. Alpha
//! is resampled as-is.

use std::sync::OnceLock;

use image::imageops::{self, FilterType};
use image::{Rgba, Rgba32FImage, RgbaImage};

fn srgb_to_linear_table() -> &'static [f32; 256] {
    static TABLE: OnceLock<[f32; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0.0; 256];
        for (i, v) in table.iter_mut().enumerate() {
            let c = i as f32 / 255.0;
            *v = if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            };
        }
        table
    })
}

fn linear_to_srgb(v: f32) -> u8 {
    let v = v.clamp(0.0, 1.0);
    let c = if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    };
    (c * 255.0).round() as u8
}

/// Resizes `img` to exactly `width` x `height`.
pub fn resize_srgb(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }

    let table = srgb_to_linear_table();
    let linear = Rgba32FImage::from_fn(img.width(), img.height(), |x, y| {
        let Rgba([r, g, b, a]) = *img.get_pixel(x, y);
        Rgba([
            table[r as usize],
            table[g as usize],
            table[b as usize],
            f32::from(a) / 255.0,
        ])
    });

    let resized = imageops::resize(&linear, width, height, FilterType::Triangle);

    RgbaImage::from_fn(width, height, |x, y| {
        let Rgba([r, g, b, a]) = *resized.get_pixel(x, y);
        Rgba([
            linear_to_srgb(r),
            linear_to_srgb(g),
            linear_to_srgb(b),
            (a.clamp(0.0, 1.0) * 255.0).round() as u8,
        ])
    })
}
