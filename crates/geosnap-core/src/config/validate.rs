//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::export::ExportFormat;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        let base = self.export.base_name.trim();
        if base.is_empty() || base.contains(['/', '\\']) {
            return Err(ConfigError::ValidationError(
                "export.base_name must be a plain, non-empty file stem".into(),
            ));
        }
        for name in &self.export.formats {
            if ExportFormat::parse(name).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "export.formats contains unknown format '{name}' (expected csv, kml or shp)"
                )));
            }
        }
        if !matches!(self.output.format.as_str(), "json" | "jsonl") {
            return Err(ConfigError::ValidationError(
                "output.format must be \"json\" or \"jsonl\"".into(),
            ));
        }
        Ok(())
    }
}
