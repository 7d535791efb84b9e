//! Hand-built EXIF JPEGs for tests.

use std::path::Path;

fn entry(out: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: [u8; 4]) {
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&value);
}

fn rationals(out: &mut Vec<u8>, values: [(u32, u32); 3]) {
    for (num, den) in values {
        out.extend_from_slice(&num.to_le_bytes());
        out.extend_from_slice(&den.to_le_bytes());
    }
}

/// Little-endian TIFF block: IFD0 with Make "AB", the given orientation and
/// a GPS IFD at 37°30'N 122°15'E.
fn tiff(orientation: u16) -> Vec<u8> {
    const ASCII: u16 = 2;
    const SHORT: u16 = 3;
    const LONG: u16 = 4;
    const RATIONAL: u16 = 5;
    // header (8) + IFD0 (2 + 3*12 + 4)
    const GPS_IFD: u32 = 50;
    // GPS IFD (2 + 4*12 + 4)
    const LAT: u32 = GPS_IFD + 54;
    const LNG: u32 = LAT + 24;

    let mut t = Vec::new();
    t.extend_from_slice(b"II");
    t.extend_from_slice(&42u16.to_le_bytes());
    t.extend_from_slice(&8u32.to_le_bytes());

    t.extend_from_slice(&3u16.to_le_bytes());
    entry(&mut t, 0x010F, ASCII, 3, *b"AB\0\0");
    let [lo, hi] = orientation.to_le_bytes();
    entry(&mut t, 0x0112, SHORT, 1, [lo, hi, 0, 0]);
    entry(&mut t, 0x8825, LONG, 1, GPS_IFD.to_le_bytes());
    t.extend_from_slice(&0u32.to_le_bytes());

    t.extend_from_slice(&4u16.to_le_bytes());
    entry(&mut t, 0x0001, ASCII, 2, *b"N\0\0\0");
    entry(&mut t, 0x0002, RATIONAL, 3, LAT.to_le_bytes());
    entry(&mut t, 0x0003, ASCII, 2, *b"E\0\0\0");
    entry(&mut t, 0x0004, RATIONAL, 3, LNG.to_le_bytes());
    t.extend_from_slice(&0u32.to_le_bytes());

    rationals(&mut t, [(37, 1), (30, 1), (0, 1)]);
    rationals(&mut t, [(122, 1), (15, 1), (0, 1)]);
    t
}

/// Write a `width` x `height` JPEG carrying an APP1 Exif segment.
pub(crate) fn write_exif_jpeg(path: &Path, width: u32, height: u32, orientation: u16) {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([120, 40, 200]),
    ));
    let jpeg = crate::media::compression::encode_jpeg(&img, 90).unwrap();

    let tiff = tiff(orientation);
    let mut app1 = vec![0xFF, 0xE1];
    app1.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    app1.extend_from_slice(b"Exif\0\0");
    app1.extend_from_slice(&tiff);

    // SOI, then APP1, then the rest of the encoded stream
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    std::fs::write(path, out).unwrap();
}
