//! EXIF metadata reading.
//!
//! Turns image bytes into a [`RawTagSet`]: tag names mapped to untyped values,
//! with the GPS IFD nested under a single `GPSInfo` key. Tag codes are named
//! through constant tables; unknown codes keep their numeric form.

use exif::{Context, In, Reader, Value};
use std::collections::BTreeMap;
use std::io::Cursor;

use super::decode;
use crate::error::{ExtractError, ExtractResult};

/// Key under which GPS sub-tags are nested.
pub const GPS_INFO: &str = "GPSInfo";

/// GPS IFD tag names indexed by tag code (EXIF 2.32, GPS attribute table).
const GPS_TAG_NAMES: [&str; 32] = [
    "GPSVersionID",
    "GPSLatitudeRef",
    "GPSLatitude",
    "GPSLongitudeRef",
    "GPSLongitude",
    "GPSAltitudeRef",
    "GPSAltitude",
    "GPSTimeStamp",
    "GPSSatellites",
    "GPSStatus",
    "GPSMeasureMode",
    "GPSDOP",
    "GPSSpeedRef",
    "GPSSpeed",
    "GPSTrackRef",
    "GPSTrack",
    "GPSImgDirectionRef",
    "GPSImgDirection",
    "GPSMapDatum",
    "GPSDestLatitudeRef",
    "GPSDestLatitude",
    "GPSDestLongitudeRef",
    "GPSDestLongitude",
    "GPSDestBearingRef",
    "GPSDestBearing",
    "GPSDestDistanceRef",
    "GPSDestDistance",
    "GPSProcessingMethod",
    "GPSAreaInformation",
    "GPSDateStamp",
    "GPSDifferential",
    "GPSHPositioningError",
];

/// Resolve a GPS tag code to its name, falling back to the decimal code.
pub fn gps_tag_name(code: u16) -> String {
    GPS_TAG_NAMES
        .get(code as usize)
        .map(|name| (*name).to_string())
        .unwrap_or_else(|| code.to_string())
}

/// An untyped metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// ASCII string (first component, NUL-trimmed)
    Text(String),
    /// Signed or unsigned integer components
    Integers(Vec<i64>),
    /// `(numerator, denominator)` pairs, unreduced and unchecked
    Rationals(Vec<(i64, i64)>),
    /// Already-resolved floating values
    Floats(Vec<f64>),
    /// Opaque bytes
    Bytes(Vec<u8>),
    /// Nested tag dictionary (only used for `GPSInfo`)
    Group(BTreeMap<String, TagValue>),
    /// A value type the reader does not understand
    Unknown,
}

impl From<&Value> for TagValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Byte(v) => TagValue::Bytes(v.clone()),
            Value::Undefined(v, _) => TagValue::Bytes(v.clone()),
            Value::Ascii(v) => {
                let text = v
                    .first()
                    .map(|s| String::from_utf8_lossy(s).trim_end_matches('\0').to_string())
                    .unwrap_or_default();
                TagValue::Text(text)
            }
            Value::Short(v) => TagValue::Integers(v.iter().map(|&x| x as i64).collect()),
            Value::Long(v) => TagValue::Integers(v.iter().map(|&x| x as i64).collect()),
            Value::SByte(v) => TagValue::Integers(v.iter().map(|&x| x as i64).collect()),
            Value::SShort(v) => TagValue::Integers(v.iter().map(|&x| x as i64).collect()),
            Value::SLong(v) => TagValue::Integers(v.iter().map(|&x| x as i64).collect()),
            Value::Rational(v) => {
                TagValue::Rationals(v.iter().map(|r| (r.num as i64, r.denom as i64)).collect())
            }
            Value::SRational(v) => {
                TagValue::Rationals(v.iter().map(|r| (r.num as i64, r.denom as i64)).collect())
            }
            Value::Float(v) => TagValue::Floats(v.iter().map(|&x| x as f64).collect()),
            Value::Double(v) => TagValue::Floats(v.clone()),
            #[allow(unreachable_patterns)]
            _ => TagValue::Unknown,
        }
    }
}

/// Tag dictionary of one image's primary IFD.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTagSet {
    tags: BTreeMap<String, TagValue>,
}

impl RawTagSet {
    /// Build directly from named tags.
    pub fn from_tags(tags: BTreeMap<String, TagValue>) -> Self {
        Self { tags }
    }

    /// Look up a top-level tag by name.
    pub fn get(&self, name: &str) -> Option<&TagValue> {
        self.tags.get(name)
    }

    /// The nested GPS dictionary, if the image has one.
    pub fn gps_info(&self) -> Option<&BTreeMap<String, TagValue>> {
        match self.tags.get(GPS_INFO) {
            Some(TagValue::Group(gps)) if !gps.is_empty() => Some(gps),
            _ => None,
        }
    }

    /// Number of top-level tags (`GPSInfo` counts as one).
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether no tags were found.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Reads the EXIF block of an image.
pub struct MetadataReader;

impl MetadataReader {
    /// Read the tag set of an in-memory image.
    ///
    /// Returns `Ok(None)` when the image has no EXIF block or the block has no
    /// GPS sub-IFD. Fails with `UnreadableImage` when the bytes are not an image
    /// and with `MalformedCoordinate` when an EXIF block is present but corrupt.
    pub fn read(bytes: &[u8], file: &str) -> ExtractResult<Option<RawTagSet>> {
        let probed = decode::probe(bytes).map_err(|message| ExtractError::UnreadableImage {
            file: file.to_string(),
            message,
        })?;
        tracing::trace!(
            "  Probe {}: {} {}x{}",
            file,
            decode::format_to_string(probed.format),
            probed.width,
            probed.height
        );

        let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return Ok(None),
            Err(e) => {
                return Err(ExtractError::MalformedCoordinate {
                    file: file.to_string(),
                    message: format!("unparsable EXIF block: {e}"),
                })
            }
        };

        let mut tags = BTreeMap::new();
        let mut gps = BTreeMap::new();
        for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
            let value = TagValue::from(&field.value);
            if matches!(field.tag.context(), Context::Gps) {
                gps.insert(gps_tag_name(field.tag.number()), value);
            } else {
                let name = if field.tag.description().is_some() {
                    field.tag.to_string()
                } else {
                    field.tag.number().to_string()
                };
                tags.insert(name, value);
            }
        }

        if gps.is_empty() {
            return Ok(None);
        }
        tags.insert(GPS_INFO.to_string(), TagValue::Group(gps));
        Ok(Some(RawTagSet { tags }))
    }
}
