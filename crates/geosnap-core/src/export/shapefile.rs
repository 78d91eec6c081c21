//! ESRI shapefile set: point geometry, index, attributes, projection.

use std::io::Cursor;

use shapefile::{Point, ShapeWriter};

use super::dbf;
use super::{ExportBundle, ExportFormat, Serializer};
use crate::error::{ExportError, ExportResult};
use crate::types::CoordinateSet;

/// WGS 84 geographic coordinate system (EPSG:4326) in ESRI WKT.
pub const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["Degree",0.017453292519943295]]"#;

/// Header offset of the little-endian shape type.
const SHAPE_TYPE_OFFSET: usize = 32;
const SHAPE_POINT: i32 = 1;

/// Attribute column holding the image file name.
const FILENAME_FIELD: &str = "filename";

/// Point shapefile with a `filename` attribute, in WGS 84.
pub struct ShapefileSerializer;

impl ShapefileSerializer {
    /// Encode the `.shp` and `.shx` payloads, x = longitude and y = latitude.
    pub fn encode_geometry(coords: &CoordinateSet) -> ExportResult<(Vec<u8>, Vec<u8>)> {
        let mut shp = Cursor::new(Vec::new());
        let mut shx = Cursor::new(Vec::new());
        {
            // Headers are finalized when the writer drops
            let mut writer = ShapeWriter::with_shx(&mut shp, &mut shx);
            for coord in coords.iter() {
                let (x, y) = coord.xy();
                writer
                    .write_shape(&Point::new(x, y))
                    .map_err(|e| ExportError::Shapefile(e.to_string()))?;
            }
        }
        let mut shp = shp.into_inner();
        let mut shx = shx.into_inner();

        // With no records the writer leaves the null shape type; a
        // zero-feature set still declares point geometry.
        if coords.is_empty() {
            for file in [&mut shp, &mut shx] {
                if file.len() < SHAPE_TYPE_OFFSET + 4 {
                    return Err(ExportError::Shapefile("truncated header".to_string()));
                }
                file[SHAPE_TYPE_OFFSET..SHAPE_TYPE_OFFSET + 4]
                    .copy_from_slice(&SHAPE_POINT.to_le_bytes());
            }
        }

        Ok((shp, shx))
    }
}

impl Serializer for ShapefileSerializer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Shapefile
    }

    fn serialize(&self, coords: &CoordinateSet, base_name: &str) -> ExportResult<ExportBundle> {
        let (shp, shx) = Self::encode_geometry(coords)?;
        let names: Vec<&str> = coords.iter().map(|c| c.filename.as_str()).collect();
        let dbf = dbf::encode_text_column(FILENAME_FIELD, &names).map_err(ExportError::Shapefile)?;

        Ok(ExportBundle {
            format: ExportFormat::Shapefile,
            base_name: base_name.to_string(),
            files: vec![
                ("shp", shp),
                ("shx", shx),
                ("dbf", dbf),
                ("prj", WGS84_PRJ.as_bytes().to_vec()),
            ],
        })
    }
}
