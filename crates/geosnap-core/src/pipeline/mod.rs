//! Coordinate extraction pipeline.
//!
//! This module contains all the stages of the extraction pipeline:
//! - **discovery**: Turn input paths into an ordered batch
//! - **validate**: Size and signature checks on raw bytes
//! - **decode**: Probe the image container header
//! - **metadata**: Read EXIF tags, GPS IFD nested under `GPSInfo`
//! - **convert**: Degrees/minutes/seconds to signed decimal degrees
//! - **processor**: Orchestrates the batch with bounded parallelism

pub mod convert;
pub mod decode;
pub mod discovery;
pub mod metadata;
pub mod processor;
pub mod validate;

// Re-exports for convenient access
pub use convert::{CoordinateConverter, GpsBlock};
pub use decode::ProbedImage;
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use metadata::{MetadataReader, RawTagSet, TagValue};
pub use processor::{
    cancellation_token, is_cancelled, CancellationToken, Extraction, Extractor, ImageSource,
    SourceData,
};
pub use validate::Validator;
