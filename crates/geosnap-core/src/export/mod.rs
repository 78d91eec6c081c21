//! Export serializers.
//!
//! Each serializer is a stateless transform from a frozen [`CoordinateSet`]
//! to an [`ExportBundle`]: one or more named byte payloads sharing a file
//! stem. Bundles can be kept in memory (archives, web responses) or written
//! to a directory.
//!
//! Point geometry is always `(x, y) = (longitude, latitude)`; only the
//! tabular format keeps the `filename,latitude,longitude` row order.

mod dbf;
mod kml;
mod shapefile;
mod tabular;

pub use kml::KmlSerializer;
pub use shapefile::{ShapefileSerializer, WGS84_PRJ};
pub use tabular::CsvSerializer;

use std::path::{Path, PathBuf};

use crate::error::{ExportError, ExportResult};
use crate::types::CoordinateSet;

/// A supported export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExportFormat {
    /// `filename,latitude,longitude` text table
    Csv,
    /// KML placemarks
    Kml,
    /// ESRI shapefile set (`.shp`, `.shx`, `.dbf`, `.prj`)
    Shapefile,
}

impl ExportFormat {
    /// Every format, in canonical order.
    pub const ALL: [ExportFormat; 3] = [Self::Csv, Self::Kml, Self::Shapefile];

    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "kml" => Some(Self::Kml),
            "shp" | "shapefile" => Some(Self::Shapefile),
            _ => None,
        }
    }

    /// Short name, as used in config files.
    pub fn name(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Kml => "kml",
            Self::Shapefile => "shp",
        }
    }

    /// File extensions produced by this format.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Csv => &["csv"],
            Self::Kml => &["kml"],
            Self::Shapefile => &["shp", "shx", "dbf", "prj"],
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A non-empty, duplicate-free set of formats to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSelection {
    formats: Vec<ExportFormat>,
}

impl FormatSelection {
    /// Build a selection; fails with `NoFormatSelected` when empty.
    pub fn new(formats: impl IntoIterator<Item = ExportFormat>) -> ExportResult<Self> {
        let mut formats: Vec<_> = formats.into_iter().collect();
        formats.sort();
        formats.dedup();
        if formats.is_empty() {
            return Err(ExportError::NoFormatSelected);
        }
        Ok(Self { formats })
    }

    /// Build a selection from format names such as `["csv", "shp"]`.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> ExportResult<Self> {
        let formats = names
            .iter()
            .map(|name| {
                ExportFormat::parse(name.as_ref())
                    .ok_or_else(|| ExportError::UnknownFormat(name.as_ref().to_string()))
            })
            .collect::<ExportResult<Vec<_>>>()?;
        Self::new(formats)
    }

    /// All three formats.
    pub fn all() -> Self {
        Self {
            formats: ExportFormat::ALL.to_vec(),
        }
    }

    /// Selected formats in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = ExportFormat> + '_ {
        self.formats.iter().copied()
    }

    /// Whether a format is selected.
    pub fn contains(&self, format: ExportFormat) -> bool {
        self.formats.contains(&format)
    }
}

/// Named byte payloads produced by one serializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    /// Format that produced the bundle
    pub format: ExportFormat,
    /// Shared file stem, e.g. `coordinates`
    pub base_name: String,
    /// `(extension, bytes)` pairs in canonical order
    pub files: Vec<(&'static str, Vec<u8>)>,
}

impl ExportBundle {
    /// Payload for an extension, if the bundle has one.
    pub fn get(&self, extension: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, bytes)| bytes.as_slice())
    }

    /// File name for an extension, e.g. `coordinates.shx`.
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.base_name, extension)
    }

    /// All file names in the bundle.
    pub fn file_names(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|(ext, _)| self.file_name(ext))
            .collect()
    }

    /// Total payload size in bytes.
    pub fn size(&self) -> usize {
        self.files.iter().map(|(_, bytes)| bytes.len()).sum()
    }

    /// Write every payload into `dir`, creating it if needed.
    ///
    /// Existing files with the same names are overwritten.
    pub fn write_to(&self, dir: &Path) -> ExportResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut written = Vec::with_capacity(self.files.len());
        for (ext, bytes) in &self.files {
            let path = dir.join(self.file_name(ext));
            std::fs::write(&path, bytes).map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::debug!("Wrote {:?} ({} bytes)", path, bytes.len());
            written.push(path);
        }
        Ok(written)
    }
}

/// A stateless export serializer.
pub trait Serializer: Send + Sync {
    /// The format this serializer produces.
    fn format(&self) -> ExportFormat;

    /// Serialize the set. Never mutates `coords`; an empty set yields valid,
    /// zero-feature output.
    fn serialize(&self, coords: &CoordinateSet, base_name: &str) -> ExportResult<ExportBundle>;
}

/// The serializer for a format.
pub fn serializer_for(format: ExportFormat) -> Box<dyn Serializer> {
    match format {
        ExportFormat::Csv => Box::new(CsvSerializer),
        ExportFormat::Kml => Box::new(KmlSerializer),
        ExportFormat::Shapefile => Box::new(ShapefileSerializer),
    }
}

/// Serialize into in-memory bundles, one result per selected format.
///
/// A failing format does not stop its siblings.
pub fn export_in_memory(
    coords: &CoordinateSet,
    selection: &FormatSelection,
    base_name: &str,
) -> Vec<(ExportFormat, ExportResult<ExportBundle>)> {
    selection
        .iter()
        .map(|format| {
            let result = serializer_for(format).serialize(coords, base_name);
            if let Err(e) = &result {
                tracing::warn!("{} export failed: {}", format, e);
            }
            (format, result)
        })
        .collect()
}

/// Serialize and write into `dir`, one result per selected format.
///
/// A failing format does not stop its siblings.
pub fn export_to_dir(
    coords: &CoordinateSet,
    selection: &FormatSelection,
    base_name: &str,
    dir: &Path,
) -> Vec<(ExportFormat, ExportResult<Vec<PathBuf>>)> {
    export_in_memory(coords, selection, base_name)
        .into_iter()
        .map(|(format, bundle)| {
            let result = bundle.and_then(|bundle| bundle.write_to(dir));
            if let Err(e) = &result {
                tracing::warn!("{} export to {:?} failed: {}", format, dir, e);
            }
            (format, result)
        })
        .collect()
}

/// Render a coordinate component in full precision.
///
/// Shortest representation that round-trips, always with a decimal point:
/// `12.5`, `-1.25`, `1.0`.
pub fn format_degrees(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}
