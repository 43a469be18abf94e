//! Capture metadata from EXIF.
//!
//! Extraction never fails: a file without EXIF, or with an EXIF block that
//! cannot be parsed, simply yields [`CaptureMetadata::default`].

use std::io::Cursor;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use exif::{Exif, In, Tag, Value};
use shoebox_core::{CaptureMetadata, GeoPoint, Orientation};

/// Reads orientation, capture time and GPS position from `data`.
///
/// Works on any container kamadak-exif understands (JPEG, TIFF, HEIF, PNG,
/// WebP). A capture time that parses to the Unix epoch and a position whose
/// components are all zero are treated as absent.
pub fn extract_metadata(data: &[u8]) -> CaptureMetadata {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!(error = %e, "No readable EXIF block");
            return CaptureMetadata::default();
        }
    };

    CaptureMetadata {
        orientation: read_orientation(&exif),
        taken_at: read_taken_at(&exif),
        location: read_location(&exif),
    }
}

fn read_orientation(exif: &Exif) -> Orientation {
    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .and_then(Orientation::from_exif)
        .unwrap_or_default()
}

fn read_taken_at(exif: &Exif) -> Option<DateTime<Utc>> {
    let candidates = [
        (Tag::DateTimeOriginal, Tag::OffsetTimeOriginal),
        (Tag::DateTimeDigitized, Tag::OffsetTimeDigitized),
        (Tag::DateTime, Tag::OffsetTime),
    ];

    candidates.iter().find_map(|&(time_tag, offset_tag)| {
        let raw = ascii(exif, time_tag)?;
        let dt = exif::DateTime::from_ascii(raw).ok()?;
        let naive = NaiveDate::from_ymd_opt(i32::from(dt.year), dt.month.into(), dt.day.into())?
            .and_hms_opt(dt.hour.into(), dt.minute.into(), dt.second.into())?;

        // Without an offset tag the wall-clock time is taken as UTC.
        let offset_minutes = ascii(exif, offset_tag).and_then(parse_offset).unwrap_or(0);
        let taken_at = naive.and_utc() - Duration::minutes(offset_minutes);

        (taken_at.timestamp() != 0).then_some(taken_at)
    })
}

fn read_location(exif: &Exif) -> Option<GeoPoint> {
    let latitude = coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S');
    let longitude = coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W');
    let altitude = altitude(exif);

    let any_set = [latitude, longitude, altitude]
        .iter()
        .any(|v| matches!(v, Some(v) if *v != 0.0));
    if !any_set {
        return None;
    }

    Some(GeoPoint {
        latitude: latitude.unwrap_or(0.0),
        longitude: longitude.unwrap_or(0.0),
        altitude,
    })
}

/// Degrees/minutes/seconds rationals folded into signed decimal degrees.
fn coordinate(exif: &Exif, tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let Value::Rational(ref parts) = field.value else {
        return None;
    };

    let mut degrees = 0.0;
    for (part, scale) in parts.iter().zip([1.0, 60.0, 3600.0]) {
        degrees += part.to_f64() / scale;
    }
    if !degrees.is_finite() {
        return None;
    }

    let negative = ascii(exif, ref_tag)
        .and_then(|r| r.first().copied())
        .is_some_and(|r| r.eq_ignore_ascii_case(&negative_ref));
    Some(if negative { -degrees } else { degrees })
}

/// Metres above sea level; reference byte 1 means below.
fn altitude(exif: &Exif) -> Option<f64> {
    let field = exif.get_field(Tag::GPSAltitude, In::PRIMARY)?;
    let Value::Rational(ref parts) = field.value else {
        return None;
    };
    let metres = parts.first()?.to_f64();
    if !metres.is_finite() {
        return None;
    }

    let below = exif
        .get_field(Tag::GPSAltitudeRef, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        == Some(1);
    Some(if below { -metres } else { metres })
}

fn ascii(exif: &Exif, tag: Tag) -> Option<&[u8]> {
    match exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(ref values) => values.first().map(|v| v.as_slice()),
        _ => None,
    }
}

/// Parses `+HH:MM` / `-HH:MM` into minutes east of UTC.
fn parse_offset(raw: &[u8]) -> Option<i64> {
    let text = std::str::from_utf8(raw).ok()?.trim();
    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i64 = hours.parse().ok()?;
    let minutes: i64 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    Some(sign * (hours * 60 + minutes))
}
