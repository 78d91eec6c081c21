//! GeoSnap Core - GPS coordinate extraction and GIS export library.
//!
//! GeoSnap reads the EXIF GPS block of geotagged photos (typically drone
//! frames), converts it to signed decimal degrees, and exports the resulting
//! point set as CSV, KML, or an ESRI shapefile set.
//!
//! # Architecture
//!
//! ```text
//! Images → Validate → Read EXIF → Convert DMS → CoordinateSet → CSV / KML / SHP
//! ```
//!
//! Per-item failures never abort a batch: each skipped image carries a
//! [`SkipReason`] in the [`ExtractionReport`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use geosnap_core::{Config, FormatSelection, GeoSnap};
//!
//! #[tokio::main]
//! async fn main() -> geosnap_core::Result<()> {
//!     let geosnap = GeoSnap::new(Config::load()?)?;
//!
//!     let extraction = geosnap.extract_paths(&["./flight-01".into()]).await?;
//!     println!("{} geotagged", extraction.report.succeeded);
//!
//!     let selection = FormatSelection::all();
//!     for (format, result) in geosnap.export_to_dir(&extraction.coordinates, &selection, "./out".as_ref()) {
//!         println!("{format}: {:?}", result?);
//!     }
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    ConfigError, ExportError, ExportResult, ExtractError, ExtractResult, GeoSnapError, Result,
};
pub use export::{ExportBundle, ExportFormat, FormatSelection, Serializer};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{CancellationToken, Extraction, Extractor, ImageSource};
pub use types::{
    Coordinate, CoordinateSet, ExtractProgress, ExtractionReport, ItemOutcome, ItemStatus,
    SkipReason,
};

use std::path::{Path, PathBuf};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GeoSnap - the main entry point: extraction plus export with one config.
pub struct GeoSnap {
    config: Config,
    extractor: Extractor,
}

impl GeoSnap {
    /// Create a new GeoSnap instance with the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        tracing::debug!("Initializing GeoSnap v{}", VERSION);
        let extractor = Extractor::new(&config);
        Ok(Self { config, extractor })
    }

    /// Create a new GeoSnap instance from the config file (or defaults).
    pub fn with_defaults() -> Result<Self> {
        Self::new(Config::load()?)
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the underlying orchestrator.
    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Discover and extract the images under `paths`.
    ///
    /// Fails only when an input path itself cannot be enumerated.
    pub async fn extract_paths(&self, paths: &[PathBuf]) -> Result<Extraction> {
        let batch = self.extractor.discover(paths)?;
        Ok(self.extractor.extract(batch).await)
    }

    /// Extract an already-assembled batch (paths or in-memory bytes).
    pub async fn extract(&self, batch: Vec<ImageSource>) -> Extraction {
        self.extractor.extract(batch).await
    }

    /// The formats configured under `[export]`.
    pub fn default_formats(&self) -> ExportResult<FormatSelection> {
        FormatSelection::from_names(&self.config.export.formats)
    }

    /// Serialize into in-memory bundles named after `export.base_name`.
    pub fn export_in_memory(
        &self,
        coords: &CoordinateSet,
        selection: &FormatSelection,
    ) -> Vec<(ExportFormat, ExportResult<ExportBundle>)> {
        export::export_in_memory(coords, selection, &self.config.export.base_name)
    }

    /// Serialize and write into `dir`, named after `export.base_name`.
    pub fn export_to_dir(
        &self,
        coords: &CoordinateSet,
        selection: &FormatSelection,
        dir: &Path,
    ) -> Vec<(ExportFormat, ExportResult<Vec<PathBuf>>)> {
        export::export_to_dir(coords, selection, &self.config.export.base_name, dir)
    }
}
