//! Core data types shared by the extraction pipeline and the exporters.

use serde::{Deserialize, Serialize};

/// A geotagged image: display file name plus signed decimal degrees.
///
/// Latitude is in `[-90, 90]`, longitude in `[-180, 180]`. Values carry the
/// full precision of the conversion; nothing is rounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Display file name of the source image
    pub filename: String,

    /// Latitude in decimal degrees (south is negative)
    pub latitude: f64,

    /// Longitude in decimal degrees (west is negative)
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate.
    pub fn new(filename: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            filename: filename.into(),
            latitude,
            longitude,
        }
    }

    /// The point in geometry order `(x, y) = (longitude, latitude)`.
    pub fn xy(&self) -> (f64, f64) {
        (self.longitude, self.latitude)
    }
}

/// Ordered, frozen result of one extraction batch.
///
/// Entries appear in the order their images were presented to the
/// orchestrator. There is no way to append once the set is built; a new batch
/// produces a new set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoordinateSet {
    coordinates: Vec<Coordinate>,
}

impl CoordinateSet {
    /// An empty set (zero features).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of coordinates.
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    /// Whether the set has no coordinates.
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Iterate in batch order.
    pub fn iter(&self) -> std::slice::Iter<'_, Coordinate> {
        self.coordinates.iter()
    }

    /// Borrow as a slice.
    pub fn as_slice(&self) -> &[Coordinate] {
        &self.coordinates
    }

    /// Bounding box as `(min_lon, min_lat, max_lon, max_lat)`, or `None` when empty.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.coordinates.first()?;
        let init = (
            first.longitude,
            first.latitude,
            first.longitude,
            first.latitude,
        );
        Some(self.coordinates.iter().fold(
            init,
            |(min_x, min_y, max_x, max_y), c| {
                (
                    min_x.min(c.longitude),
                    min_y.min(c.latitude),
                    max_x.max(c.longitude),
                    max_y.max(c.latitude),
                )
            },
        ))
    }
}

impl From<Vec<Coordinate>> for CoordinateSet {
    fn from(coordinates: Vec<Coordinate>) -> Self {
        Self { coordinates }
    }
}

impl FromIterator<Coordinate> for CoordinateSet {
    fn from_iter<I: IntoIterator<Item = Coordinate>>(iter: I) -> Self {
        Self {
            coordinates: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CoordinateSet {
    type Item = &'a Coordinate;
    type IntoIter = std::slice::Iter<'a, Coordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.coordinates.iter()
    }
}

/// Why an item did not contribute a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Extension is not in the accepted list
    UnsupportedExtension,
    /// Bytes could not be read or decoded as an image
    UnreadableImage(String),
    /// Image decodes but carries no GPS position
    NoGpsData,
    /// GPS block present but unusable
    Malformed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnsupportedExtension => write!(f, "skipped: unsupported file type"),
            SkipReason::UnreadableImage(msg) => write!(f, "unreadable image: {msg}"),
            SkipReason::NoGpsData => write!(f, "no GPS data"),
            SkipReason::Malformed(msg) => write!(f, "unparsable GPS data: {msg}"),
        }
    }
}

/// Outcome of one batch item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    /// A coordinate was produced
    Extracted {
        latitude: f64,
        longitude: f64,
    },
    /// The item was skipped
    Skipped(SkipReason),
}

/// Report line for one batch item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Position in the input batch (0-based)
    pub index: usize,

    /// Display file name
    pub filename: String,

    /// What happened
    #[serde(flatten)]
    pub status: ItemStatus,
}

/// Structured per-batch report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// Items in the batch
    pub total: usize,

    /// Items fully handled (equal to `total` unless cancelled)
    pub processed: usize,

    /// Items that produced a coordinate
    pub succeeded: usize,

    /// Items skipped for any reason
    pub skipped: usize,

    /// Whether the batch stopped early on request
    pub cancelled: bool,

    /// One line per processed item, in input order
    pub items: Vec<ItemOutcome>,
}

impl ExtractionReport {
    /// Whether the batch yielded zero coordinates.
    pub fn is_empty(&self) -> bool {
        self.succeeded == 0
    }

    /// Skipped items with their reasons, in input order.
    pub fn skipped_items(&self) -> impl Iterator<Item = (&str, &SkipReason)> {
        self.items.iter().filter_map(|item| match &item.status {
            ItemStatus::Skipped(reason) => Some((item.filename.as_str(), reason)),
            ItemStatus::Extracted { .. } => None,
        })
    }
}

/// Incremental progress of a running batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractProgress {
    /// Items finished so far
    pub processed: usize,

    /// Items in the batch
    pub total: usize,
}
