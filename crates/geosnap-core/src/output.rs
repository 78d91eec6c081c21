//! JSON and JSONL rendering of coordinate sets and batch reports.
//!
//! Used for the stdout preview when no export directory is given, and for
//! the standalone report file.

use serde::Serialize;
use std::io::{self, Write};

use crate::config::OutputConfig;
use crate::types::{CoordinateSet, ExtractionReport};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON document (array for sets)
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Writes coordinates and reports as JSON or JSONL.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer.
    ///
    /// `pretty` only affects the JSON format; JSONL is always one object per line.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    /// Create a writer from the `[output]` config section.
    ///
    /// Unknown format names fall back to JSON; config validation rejects them
    /// before this point.
    pub fn from_config(writer: W, config: &OutputConfig) -> Self {
        let format = OutputFormat::parse(&config.format).unwrap_or(OutputFormat::Json);
        Self::new(writer, format, config.pretty)
    }

    /// Write a coordinate set: an array for JSON, one coordinate per line for JSONL.
    pub fn write_coordinates(&mut self, coords: &CoordinateSet) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                self.write_value(coords)?;
                self.items_written += coords.len();
            }
            OutputFormat::JsonLines => {
                for coord in coords {
                    self.write_line(coord)?;
                    self.items_written += 1;
                }
            }
        }
        Ok(())
    }

    /// Write a batch report: one document for JSON, one outcome per line for JSONL.
    pub fn write_report(&mut self, report: &ExtractionReport) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                self.write_value(report)?;
                self.items_written += 1;
            }
            OutputFormat::JsonLines => {
                for item in &report.items {
                    self.write_line(item)?;
                    self.items_written += 1;
                }
            }
        }
        Ok(())
    }

    /// Get the number of items written.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_value<T: Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, value).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, value).map_err(io::Error::other)?;
        }
        writeln!(self.writer)
    }

    fn write_line<T: Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        // JSONL is never pretty-printed (one object per line)
        serde_json::to_writer(&mut self.writer, value).map_err(io::Error::other)?;
        writeln!(self.writer)
    }
}

/// Serialize a report to a pretty JSON string.
pub fn report_to_json(report: &ExtractionReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
