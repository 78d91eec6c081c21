//! Comma-separated table: `filename,latitude,longitude`.

use super::{format_degrees, ExportBundle, ExportFormat, Serializer};
use crate::error::{ExportError, ExportResult};
use crate::types::CoordinateSet;

const HEADER: [&str; 3] = ["filename", "latitude", "longitude"];

/// UTF-8 CSV, one row per coordinate in set order, `\n` line endings.
pub struct CsvSerializer;

impl CsvSerializer {
    /// Encode the table without wrapping it in a bundle.
    pub fn encode(coords: &CoordinateSet) -> ExportResult<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer
            .write_record(HEADER)
            .map_err(|e| ExportError::Csv(e.to_string()))?;
        for coord in coords {
            let latitude = format_degrees(coord.latitude);
            let longitude = format_degrees(coord.longitude);
            writer
                .write_record([coord.filename.as_str(), latitude.as_str(), longitude.as_str()])
                .map_err(|e| ExportError::Csv(e.to_string()))?;
        }

        writer
            .into_inner()
            .map_err(|e| ExportError::Csv(e.error().to_string()))
    }
}

impl Serializer for CsvSerializer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn serialize(&self, coords: &CoordinateSet, base_name: &str) -> ExportResult<ExportBundle> {
        Ok(ExportBundle {
            format: ExportFormat::Csv,
            base_name: base_name.to_string(),
            files: vec![("csv", Self::encode(coords)?)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coordinate;

    fn encode(coords: Vec<Coordinate>) -> String {
        String::from_utf8(CsvSerializer::encode(&CoordinateSet::from(coords)).unwrap()).unwrap()
    }

    #[test]
    fn test_single_row_exact_output() {
        let text = encode(vec![Coordinate::new("img1.jpg", 12.5, -1.25)]);
        assert_eq!(text, "filename,latitude,longitude\nimg1.jpg,12.5,-1.25\n");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["filename,latitude,longitude", "img1.jpg,12.5,-1.25"]);
    }

    #[test]
    fn test_rows_keep_set_order_and_lat_lon_order() {
        let text = encode(vec![
            Coordinate::new("b.jpg", -10.5, 20.25),
            Coordinate::new("a.jpg", 1.0, 2.0),
        ]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "b.jpg,-10.5,20.25");
        assert_eq!(lines[2], "a.jpg,1.0,2.0");
    }

    #[test]
    fn test_full_precision_kept() {
        let lat = 47.0 + 22.0 / 60.0 + 5.5 / 3600.0;
        let text = encode(vec![Coordinate::new("p.jpg", lat, 8.0)]);
        let row = text.lines().nth(1).unwrap();
        let parsed: f64 = row.split(',').nth(1).unwrap().parse().unwrap();
        assert_eq!(parsed.to_bits(), lat.to_bits());
    }

    #[test]
    fn test_awkward_filenames_are_quoted() {
        let text = encode(vec![
            Coordinate::new("flight 1, pass \"A\".jpg", 1.0, 2.0),
            Coordinate::new("bücher.jpg", 3.0, 4.0),
        ]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "\"flight 1, pass \"\"A\"\".jpg\",1.0,2.0");
        assert_eq!(lines[2], "bücher.jpg,3.0,4.0");
    }

    #[test]
    fn test_empty_set_is_header_only() {
        assert_eq!(encode(Vec::new()), "filename,latitude,longitude\n");
    }
}
