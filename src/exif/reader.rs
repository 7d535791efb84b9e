use anyhow::Result;
use nom_exif::*;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// EXIF attributes keyed by tag name.
pub type ExifMap = BTreeMap<String, Value>;

const TAG_ORIENTATION: u16 = 0x0112;

// Basic attributes copied as strings, keyed by their EXIF tag names.
const BASIC_TAGS: &[(&str, u16)] = &[
    ("DateTime", 0x0132),
    ("DateTimeOriginal", 0x9003),
    ("DateTimeDigitized", 0x9004),
    ("ExposureTime", 0x829A),
    ("FNumber", 0x829D),
    ("Flash", 0x9209),
    ("FocalLength", 0x920A),
    ("ImageWidth", 0x0100),
    ("ImageLength", 0x0101),
    ("Make", 0x010F),
    ("Model", 0x0110),
    ("Orientation", TAG_ORIENTATION),
    ("PhotographicSensitivity", 0x8827),
    ("WhiteBalance", 0xA403),
    ("SubSecTime", 0x9290),
    ("SubSecTimeOriginal", 0x9291),
    ("SubSecTimeDigitized", 0x9292),
];

fn parse(path: &Path) -> Result<Option<ExifIter>> {
    if !path.is_file() {
        anyhow::bail!("Image file not found: {}", path.display());
    }
    // Unrecognized containers (PNG, GIF, ...) simply carry no EXIF here.
    let ms = match MediaSource::file_path(path) {
        Ok(ms) => ms,
        Err(e) => {
            log::debug!("Unsupported EXIF container {}: {e}", path.display());
            return Ok(None);
        }
    };
    let mut parser = MediaParser::new();
    match parser.parse(ms) {
        Ok(iter) => Ok(Some(iter)),
        Err(_) => {
            log::debug!("No EXIF data found in {}", path.display());
            Ok(None)
        }
    }
}

/// Read the basic EXIF attributes of an image.
///
/// Files without EXIF data yield an empty map. GPS position, when present,
/// is reported both as the raw rational strings and as decimal
/// `Latitude`/`Longitude` numbers.
pub fn read_exif(path: &Path) -> Result<ExifMap> {
    let mut data = ExifMap::new();
    let Some(iter) = parse(path)? else {
        return Ok(data);
    };

    // Parse GPS info before converting to Exif (consumes the iterator)
    let gps_info = iter.parse_gps_info().ok().flatten();
    let exif: Exif = iter.into();

    for (name, code) in BASIC_TAGS {
        if let Some(val) = exif.get_by_ifd_tag_code(0, *code).and_then(entry_to_string) {
            data.insert((*name).to_string(), Value::String(val));
        }
    }

    if let Some(gps) = gps_info {
        data.insert("GPSLatitude".into(), Value::String(latlng_to_string(&gps.latitude)));
        data.insert("GPSLatitudeRef".into(), Value::String(gps.latitude_ref.to_string()));
        data.insert("GPSLongitude".into(), Value::String(latlng_to_string(&gps.longitude)));
        data.insert("GPSLongitudeRef".into(), Value::String(gps.longitude_ref.to_string()));
        data.insert(
            "GPSAltitude".into(),
            Value::String(format!("{}/{}", gps.altitude.0, gps.altitude.1)),
        );
        data.insert("GPSAltitudeRef".into(), Value::String(gps.altitude_ref.to_string()));

        let lat = latlng_to_decimal(&gps.latitude, gps.latitude_ref);
        let lng = latlng_to_decimal(&gps.longitude, gps.longitude_ref);
        if let (Some(lat), Some(lng)) = (lat, lng) {
            data.insert("Latitude".into(), Value::from(lat));
            data.insert("Longitude".into(), Value::from(lng));
        }
    }

    Ok(data)
}

/// EXIF orientation (1–8) of an image, if recorded.
pub fn read_orientation(path: &Path) -> Option<u32> {
    let iter = parse(path).ok().flatten()?;
    let exif: Exif = iter.into();
    exif.get_by_ifd_tag_code(0, TAG_ORIENTATION)
        .and_then(entry_to_string)
        .and_then(|s| s.parse().ok())
}

/// Convert an EntryValue to an Option<String>.
fn entry_to_string(val: &EntryValue) -> Option<String> {
    let s = val.to_string();
    let s = s.trim().trim_matches('"').to_string();
    if s.is_empty() { None } else { Some(s) }
}

fn latlng_to_string(latlng: &LatLng) -> String {
    format!(
        "{}/{},{}/{},{}/{}",
        latlng.0.0, latlng.0.1, latlng.1.0, latlng.1.1, latlng.2.0, latlng.2.1
    )
}

/// Convert deg/min/sec rationals to signed decimal degrees.
///
/// `None` when any denominator is zero.
pub(crate) fn dms_to_decimal(dms: [(u32, u32); 3], reference: char) -> Option<f64> {
    if dms.iter().any(|(_, den)| *den == 0) {
        return None;
    }
    let [d, m, s] = dms.map(|(num, den)| num as f64 / den as f64);
    let coord = d + m / 60.0 + s / 3600.0;

    if reference == 'S' || reference == 'W' {
        Some(-coord)
    } else {
        Some(coord)
    }
}

fn latlng_to_decimal(latlng: &LatLng, reference: char) -> Option<f64> {
    dms_to_decimal(
        [
            (latlng.0.0, latlng.0.1),
            (latlng.1.0, latlng.1.1),
            (latlng.2.0, latlng.2.1),
        ],
        reference,
    )
}
