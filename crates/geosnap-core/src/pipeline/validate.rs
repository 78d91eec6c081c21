//! Cheap checks run on raw bytes before the image container is parsed.

use crate::config::LimitsConfig;

/// Rejects inputs that are too large or clearly not images.
#[derive(Debug, Clone)]
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Maximum accepted input size in bytes.
    pub fn max_bytes(&self) -> u64 {
        self.limits.max_file_size_mb * 1024 * 1024
    }

    /// Check a size reported by the filesystem before reading the file.
    pub fn check_size(&self, len: u64) -> Result<(), String> {
        if len > self.max_bytes() {
            return Err(format!(
                "file too large ({}MB > {}MB)",
                len / (1024 * 1024),
                self.limits.max_file_size_mb
            ));
        }
        Ok(())
    }

    /// Validate an in-memory image before probing it.
    ///
    /// Checks:
    /// - Size is within limits
    /// - Header matches a known image signature
    pub fn validate(&self, bytes: &[u8]) -> Result<(), String> {
        self.check_size(bytes.len() as u64)?;

        if bytes.len() < 4 {
            return Err("file too small to be a valid image".to_string());
        }
        if !Self::is_valid_image_header(bytes) {
            return Err("unrecognized image format (invalid magic bytes)".to_string());
        }
        Ok(())
    }

    /// Check if the leading bytes match a known image format.
    fn is_valid_image_header(header: &[u8]) -> bool {
        if header.len() < 4 {
            return false;
        }

        // JPEG: FF D8 FF
        if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return true;
        }

        // PNG: 89 50 4E 47
        if header.starts_with(&[0x89, b'P', b'N', b'G']) {
            return true;
        }

        // WebP: RIFF....WEBP
        if header.starts_with(b"RIFF") {
            return header.len() < 12 || &header[8..12] == b"WEBP";
        }

        // TIFF: II*\0 or MM\0*
        if header.starts_with(&[b'I', b'I', 0x2A, 0x00])
            || header.starts_with(&[b'M', b'M', 0x00, 0x2A])
        {
            return true;
        }

        // HEIF/AVIF: ftyp box at offset 4
        header.len() >= 12 && &header[4..8] == b"ftyp"
    }
}
