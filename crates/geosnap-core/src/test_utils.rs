//! In-process image fixtures for unit tests.
//!
//! Images are encoded with the `image` crate and, when EXIF is wanted, an APP1
//! segment produced by kamadak-exif's writer is spliced in after the SOI marker.

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;

fn encode(format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::new(8, 8));
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode fixture image");
    buf
}

/// An 8x8 JPEG without EXIF.
pub(crate) fn plain_jpeg() -> Vec<u8> {
    encode(ImageFormat::Jpeg)
}

/// An 8x8 PNG without EXIF.
pub(crate) fn plain_png() -> Vec<u8> {
    encode(ImageFormat::Png)
}

/// An 8x8 JPEG carrying the given EXIF fields plus a camera make.
pub(crate) fn jpeg_with_fields(fields: &[Field]) -> Vec<u8> {
    let make = Field {
        tag: Tag::Make,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![b"DJI".to_vec()]),
    };
    let mut writer = Writer::new();
    writer.push_field(&make);
    for field in fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).expect("write exif fixture");
    jpeg_with_exif_payload(&tiff.into_inner())
}

/// An 8x8 JPEG whose Exif segment has a TIFF header pointing past its end.
pub(crate) fn jpeg_with_corrupt_exif() -> Vec<u8> {
    let mut tiff = b"MM\0*".to_vec();
    tiff.extend_from_slice(&0x7FFF_FFF0u32.to_be_bytes());
    tiff.extend_from_slice(b"garbage garbage garbage");
    jpeg_with_exif_payload(&tiff)
}

/// Splice an APP1 Exif segment holding `tiff` in after SOI.
fn jpeg_with_exif_payload(tiff: &[u8]) -> Vec<u8> {
    let jpeg = plain_jpeg();
    let segment_len = (2 + 6 + tiff.len()) as u16;

    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// A degrees/minutes/seconds triple as EXIF rationals.
pub(crate) fn dms(parts: [(u32, u32); 3]) -> Value {
    Value::Rational(parts.iter().map(|&(num, denom)| Rational { num, denom }).collect())
}

/// Build a GPS field in the primary IFD.
pub(crate) fn gps_field(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

/// A hemisphere reference field ("N", "S", "E", "W").
pub(crate) fn gps_ref(tag: Tag, hemisphere: &str) -> Field {
    gps_field(tag, Value::Ascii(vec![hemisphere.as_bytes().to_vec()]))
}

/// A JPEG geotagged with whole-degree latitude/longitude values.
pub(crate) fn geotagged_jpeg(lat: u32, lat_ref: &str, lon: u32, lon_ref: &str) -> Vec<u8> {
    jpeg_with_fields(&[
        gps_ref(Tag::GPSLatitudeRef, lat_ref),
        gps_field(Tag::GPSLatitude, dms([(lat, 1), (0, 1), (0, 1)])),
        gps_ref(Tag::GPSLongitudeRef, lon_ref),
        gps_field(Tag::GPSLongitude, dms([(lon, 1), (0, 1), (0, 1)])),
    ])
}
