//! File names for stored artifacts.

use shoebox_core::{Digest, MediaKind};

/// `{hex}.jpg` or `{hex}.heic`.
pub fn original_filename(digest: &Digest, kind: MediaKind) -> String {
    format!("{}{}", digest.to_hex(), kind.extension())
}

/// `{hex}.heic.jpg` for kinds that get a JPEG copy, `None` otherwise.
pub fn fallback_filename(digest: &Digest, kind: MediaKind) -> Option<String> {
    kind.needs_fallback_jpeg()
        .then(|| format!("{}{}.jpg", digest.to_hex(), kind.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_filename() {
        let digest = Digest::of(b"");
        assert_eq!(
            original_filename(&digest, MediaKind::Jpg),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855.jpg"
        );
        assert!(original_filename(&digest, MediaKind::Heic).ends_with("b855.heic"));
    }

    #[test]
    fn test_fallback_filename_only_for_heic() {
        let digest = Digest::of(b"heic bytes");
        assert_eq!(
            fallback_filename(&digest, MediaKind::Heic),
            Some(format!("{}.heic.jpg", digest.to_hex()))
        );
        assert_eq!(fallback_filename(&digest, MediaKind::Jpg), None);
    }
}
