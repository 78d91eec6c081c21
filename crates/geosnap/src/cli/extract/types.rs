//! CLI enum types for the extract command: export format and preview format.

use clap::ValueEnum;
use geosnap_core::{ExportFormat, OutputFormat as CoreOutputFormat};

/// Export formats selectable on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormatArg {
    /// filename,latitude,longitude table
    Csv,
    /// KML point placemarks
    Kml,
    /// ESRI shapefile set (.shp, .shx, .dbf, .prj)
    #[value(alias = "shapefile")]
    Shp,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Csv => ExportFormat::Csv,
            ExportFormatArg::Kml => ExportFormat::Kml,
            ExportFormatArg::Shp => ExportFormat::Shapefile,
        }
    }
}

/// Stdout preview formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PreviewFormat {
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<PreviewFormat> for CoreOutputFormat {
    fn from(format: PreviewFormat) -> Self {
        match format {
            PreviewFormat::Json => CoreOutputFormat::Json,
            PreviewFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

impl std::fmt::Display for PreviewFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreviewFormat::Json => write!(f, "json"),
            PreviewFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}
