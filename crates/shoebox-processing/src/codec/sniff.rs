//! Container signature checks.

/// Brands identifying HEIF containers holding HEVC (or generic HEIF) images.
pub const HEIC_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"hevm", b"hevs", b"mif1", b"msf1",
];

pub const AVIF_BRANDS: &[&[u8; 4]] = &[b"avif", b"avis"];

/// True if `data` opens with an ISO-BMFF `ftyp` box whose major or
/// compatible brands include one of `brands`.
pub fn has_ftyp_brand(data: &[u8], brands: &[&[u8; 4]]) -> bool {
    if data.len() < 16 || &data[4..8] != b"ftyp" {
        return false;
    }
    let size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if size < 16 {
        return false;
    }
    let end = size.min(data.len());

    let major = &data[8..12];
    // data[12..16] is the minor version.
    std::iter::once(major)
        .chain(data[16..end].chunks_exact(4))
        .any(|brand| brands.iter().any(|b| brand == &b[..]))
}

pub fn is_webp(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}
