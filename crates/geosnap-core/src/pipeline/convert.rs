//! GPS block to signed decimal degrees.
//!
//! `decimal = degrees + minutes / 60 + seconds / 3600`, negated for the
//! southern and western hemispheres. Each of the three components must
//! resolve on its own: a plain number is used as is, a rational needs a
//! non-zero denominator, anything else makes the whole conversion fail.

use std::collections::BTreeMap;

use super::metadata::{RawTagSet, TagValue};
use crate::error::{ExtractError, ExtractResult};
use crate::types::Coordinate;

/// The four GPS keys needed to place an image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpsBlock {
    pub latitude: Option<TagValue>,
    pub latitude_ref: Option<TagValue>,
    pub longitude: Option<TagValue>,
    pub longitude_ref: Option<TagValue>,
}

impl GpsBlock {
    /// Pick the position keys out of a `GPSInfo` dictionary.
    ///
    /// Returns `None` when neither magnitude is present: the image has a GPS
    /// IFD (altitude, timestamp, ...) but no position, which is "no GPS data".
    pub fn from_gps_info(gps: &BTreeMap<String, TagValue>) -> Option<Self> {
        let block = Self {
            latitude: gps.get("GPSLatitude").cloned(),
            latitude_ref: gps.get("GPSLatitudeRef").cloned(),
            longitude: gps.get("GPSLongitude").cloned(),
            longitude_ref: gps.get("GPSLongitudeRef").cloned(),
        };
        if block.latitude.is_none() && block.longitude.is_none() {
            None
        } else {
            Some(block)
        }
    }

    /// Same as [`from_gps_info`](Self::from_gps_info), starting from a full tag set.
    pub fn from_tags(tags: &RawTagSet) -> Option<Self> {
        tags.gps_info().and_then(Self::from_gps_info)
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn name(self) -> &'static str {
        match self {
            Axis::Latitude => "latitude",
            Axis::Longitude => "longitude",
        }
    }

    fn limit(self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }

    /// Sign for a hemisphere letter, or `None` if the letter belongs to the other axis.
    fn sign(self, hemisphere: char) -> Option<f64> {
        match (self, hemisphere) {
            (Axis::Latitude, 'N') | (Axis::Longitude, 'E') => Some(1.0),
            (Axis::Latitude, 'S') | (Axis::Longitude, 'W') => Some(-1.0),
            _ => None,
        }
    }
}

const COMPONENT_NAMES: [&str; 3] = ["degrees", "minutes", "seconds"];

/// Converts GPS blocks into coordinates.
pub struct CoordinateConverter;

impl CoordinateConverter {
    /// Convert a GPS block into a coordinate for `filename`.
    ///
    /// Fails with `MalformedCoordinate` when a magnitude or hemisphere is
    /// missing or unusable. Deterministic: the same block always yields the
    /// same bits.
    pub fn convert(block: &GpsBlock, filename: &str) -> ExtractResult<Coordinate> {
        let malformed = |message: String| ExtractError::MalformedCoordinate {
            file: filename.to_string(),
            message,
        };

        let latitude = Self::signed_degrees(
            block.latitude.as_ref(),
            block.latitude_ref.as_ref(),
            Axis::Latitude,
        )
        .map_err(&malformed)?;
        let longitude = Self::signed_degrees(
            block.longitude.as_ref(),
            block.longitude_ref.as_ref(),
            Axis::Longitude,
        )
        .map_err(&malformed)?;

        Ok(Coordinate::new(filename, latitude, longitude))
    }

    /// Resolve a degrees/minutes/seconds value to unsigned decimal degrees.
    pub fn to_decimal_degrees(value: &TagValue) -> Result<f64, String> {
        let components: Vec<Result<f64, String>> = match value {
            TagValue::Rationals(pairs) => pairs
                .iter()
                .map(|&(num, den)| Self::resolve_ratio(num, den))
                .collect(),
            TagValue::Floats(values) => values.iter().map(|&v| Self::resolve_float(v)).collect(),
            TagValue::Integers(values) => values.iter().map(|&v| Ok(v as f64)).collect(),
            other => {
                return Err(format!(
                    "expected rational degrees/minutes/seconds, found {}",
                    Self::kind(other)
                ))
            }
        };

        if components.len() < 3 {
            return Err(format!(
                "expected 3 components (degrees, minutes, seconds), found {}",
                components.len()
            ));
        }

        let mut resolved = [0.0f64; 3];
        for (slot, (component, name)) in resolved
            .iter_mut()
            .zip(components.into_iter().zip(COMPONENT_NAMES))
        {
            *slot = component.map_err(|e| format!("{name}: {e}"))?;
        }

        let [degrees, minutes, seconds] = resolved;
        Ok(degrees + minutes / 60.0 + seconds / 3600.0)
    }

    fn signed_degrees(
        magnitude: Option<&TagValue>,
        hemisphere: Option<&TagValue>,
        axis: Axis,
    ) -> Result<f64, String> {
        let magnitude = magnitude.ok_or_else(|| format!("missing {}", axis.name()))?;
        let hemisphere = hemisphere
            .and_then(Self::hemisphere_letter)
            .ok_or_else(|| format!("missing {} hemisphere", axis.name()))?;
        let sign = axis.sign(hemisphere).ok_or_else(|| {
            format!(
                "invalid {} hemisphere '{}'",
                axis.name(),
                hemisphere
            )
        })?;

        let degrees = Self::to_decimal_degrees(magnitude)
            .map_err(|e| format!("{}: {}", axis.name(), e))?
            .abs();
        if degrees > axis.limit() {
            return Err(format!(
                "{} {} out of range (max {})",
                axis.name(),
                degrees,
                axis.limit()
            ));
        }
        Ok(sign * degrees)
    }

    fn hemisphere_letter(value: &TagValue) -> Option<char> {
        let text = match value {
            TagValue::Text(s) => s.clone(),
            TagValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            _ => return None,
        };
        text.trim()
            .trim_end_matches('\0')
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
    }

    fn resolve_ratio(num: i64, den: i64) -> Result<f64, String> {
        if den == 0 {
            return Err(format!("zero denominator ({num}/0)"));
        }
        Ok(num as f64 / den as f64)
    }

    fn resolve_float(value: f64) -> Result<f64, String> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(format!("non-finite value {value}"))
        }
    }

    fn kind(value: &TagValue) -> &'static str {
        match value {
            TagValue::Text(_) => "text",
            TagValue::Integers(_) => "integers",
            TagValue::Rationals(_) => "rationals",
            TagValue::Floats(_) => "floats",
            TagValue::Bytes(_) => "bytes",
            TagValue::Group(_) => "a tag group",
            TagValue::Unknown => "an unknown value type",
        }
    }
}
