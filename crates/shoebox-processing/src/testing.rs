//! Fixture builders for tests in this crate and downstream crates
//! (`test-support` feature).
//!
//! EXIF-bearing JPEGs are produced by encoding a plain JPEG and splicing a
//! hand-built APP1 segment with a little-endian TIFF block in right after
//! the SOI marker.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const GRAY: Rgba<u8> = Rgba([128, 128, 128, 255]);

/// Gray image with red, green, blue and white top-left, top-right,
/// bottom-left and bottom-right corners.
pub fn corner_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        match (x == 0, x == width - 1, y == 0, y == height - 1) {
            (true, _, true, _) => RED,
            (_, true, true, _) => GREEN,
            (true, _, _, true) => BLUE,
            (_, true, _, true) => WHITE,
            _ => GRAY,
        }
    })
}

pub fn png_bytes(img: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("png encoding");
    out
}

pub fn jpeg_bytes(img: &RgbaImage, quality: u8) -> Vec<u8> {
    crate::derivative::encode_jpeg(img, quality).expect("jpeg encoding")
}

/// An ISO-BMFF `ftyp` box, the first box of HEIC and AVIF files.
pub fn ftyp_box(major: &[u8; 4], compatible: &[&[u8; 4]]) -> Vec<u8> {
    let size = 16 + 4 * compatible.len();
    let mut out = Vec::with_capacity(size);
    out.extend_from_slice(&(size as u32).to_be_bytes());
    out.extend_from_slice(b"ftyp");
    out.extend_from_slice(major);
    out.extend_from_slice(&[0, 0, 0, 0]);
    for brand in compatible {
        out.extend_from_slice(&brand[..]);
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct ExifFixture {
    pub orientation: Option<u16>,
    /// `YYYY:MM:DD HH:MM:SS`, written to the IFD0 DateTime tag.
    pub date_time: Option<&'static str>,
    pub gps: Option<GpsFixture>,
}

#[derive(Debug, Clone)]
pub struct GpsFixture {
    /// Whole degrees, minutes, seconds.
    pub latitude: [u32; 3],
    pub latitude_ref: &'static str,
    pub longitude: [u32; 3],
    pub longitude_ref: &'static str,
    /// Metres and reference byte (1 = below sea level).
    pub altitude: Option<(u32, u8)>,
}

/// `jpeg` with an APP1 EXIF segment describing `fixture`.
pub fn with_exif(jpeg: &[u8], fixture: &ExifFixture) -> Vec<u8> {
    with_exif_payload(jpeg, &tiff_block(fixture))
}

/// `jpeg` with an APP1 EXIF segment holding `tiff` as is, well-formed or not.
pub fn with_exif_payload(jpeg: &[u8], tiff: &[u8]) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");

    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE1]);
    out.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

const BYTE: u16 = 1;
const ASCII: u16 = 2;
const SHORT: u16 = 3;
const LONG: u16 = 4;
const RATIONAL: u16 = 5;

struct Entry {
    tag: u16,
    kind: u16,
    count: u32,
    value: Vec<u8>,
}

impl Entry {
    fn ascii(tag: u16, text: &str) -> Self {
        let mut value = text.as_bytes().to_vec();
        value.push(0);
        Self {
            tag,
            kind: ASCII,
            count: value.len() as u32,
            value,
        }
    }

    fn rationals(tag: u16, parts: &[(u32, u32)]) -> Self {
        let value = parts
            .iter()
            .flat_map(|(n, d)| n.to_le_bytes().into_iter().chain(d.to_le_bytes()))
            .collect();
        Self {
            tag,
            kind: RATIONAL,
            count: parts.len() as u32,
            value,
        }
    }
}

fn padded(len: usize) -> usize {
    len + len % 2
}

fn ifd_len(entries: &[Entry]) -> usize {
    let out_of_line: usize = entries
        .iter()
        .filter(|e| e.value.len() > 4)
        .map(|e| padded(e.value.len()))
        .sum();
    2 + 12 * entries.len() + 4 + out_of_line
}

/// Appends an IFD at the current end of `tiff`, with out-of-line values
/// stored right after it.
fn write_ifd(tiff: &mut Vec<u8>, entries: &[Entry]) {
    let mut data_offset = tiff.len() + 2 + 12 * entries.len() + 4;
    let mut data = Vec::new();

    tiff.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for entry in entries {
        tiff.extend_from_slice(&entry.tag.to_le_bytes());
        tiff.extend_from_slice(&entry.kind.to_le_bytes());
        tiff.extend_from_slice(&entry.count.to_le_bytes());
        if entry.value.len() <= 4 {
            let mut inline = [0u8; 4];
            inline[..entry.value.len()].copy_from_slice(&entry.value);
            tiff.extend_from_slice(&inline);
        } else {
            tiff.extend_from_slice(&(data_offset as u32).to_le_bytes());
            data.extend_from_slice(&entry.value);
            if entry.value.len() % 2 == 1 {
                data.push(0);
            }
            data_offset += padded(entry.value.len());
        }
    }
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff.extend_from_slice(&data);
}

fn tiff_block(fixture: &ExifFixture) -> Vec<u8> {
    let mut ifd0 = Vec::new();
    if let Some(orientation) = fixture.orientation {
        ifd0.push(Entry {
            tag: 0x0112,
            kind: SHORT,
            count: 1,
            value: orientation.to_le_bytes().to_vec(),
        });
    }
    if let Some(date_time) = fixture.date_time {
        ifd0.push(Entry::ascii(0x0132, date_time));
    }

    let gps = fixture.gps.as_ref().map(|gps| {
        let dms = |v: [u32; 3]| [(v[0], 1), (v[1], 1), (v[2], 1)];
        let mut entries = vec![
            Entry::ascii(0x0001, gps.latitude_ref),
            Entry::rationals(0x0002, &dms(gps.latitude)),
            Entry::ascii(0x0003, gps.longitude_ref),
            Entry::rationals(0x0004, &dms(gps.longitude)),
        ];
        if let Some((metres, reference)) = gps.altitude {
            entries.push(Entry {
                tag: 0x0005,
                kind: BYTE,
                count: 1,
                value: vec![reference],
            });
            entries.push(Entry::rationals(0x0006, &[(metres, 1)]));
        }
        entries
    });

    if gps.is_some() {
        // Placeholder, patched below once IFD0's size is known.
        ifd0.push(Entry {
            tag: 0x8825,
            kind: LONG,
            count: 1,
            value: 0u32.to_le_bytes().to_vec(),
        });
        let gps_offset = 8 + ifd_len(&ifd0);
        if let Some(last) = ifd0.last_mut() {
            last.value = (gps_offset as u32).to_le_bytes().to_vec();
        }
    }

    let mut tiff = b"II*\0".to_vec();
    tiff.extend_from_slice(&8u32.to_le_bytes());
    write_ifd(&mut tiff, &ifd0);
    if let Some(gps) = gps {
        write_ifd(&mut tiff, &gps);
    }
    tiff
}
