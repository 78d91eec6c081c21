//! KML 2.2 document with one named point placemark per coordinate.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{format_degrees, ExportBundle, ExportFormat, Serializer};
use crate::error::{ExportError, ExportResult};
use crate::types::{Coordinate, CoordinateSet};

const KML_NS: &str = "http://www.opengis.net/kml/2.2";

/// KML point placemarks; `<coordinates>` is rendered as `lon,lat`.
pub struct KmlSerializer;

type XmlWriter = Writer<Vec<u8>>;

impl KmlSerializer {
    /// Encode the document without wrapping it in a bundle.
    pub fn encode(coords: &CoordinateSet, document_name: &str) -> ExportResult<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        emit(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;
        emit(
            &mut writer,
            Event::Start(BytesStart::new("kml").with_attributes([("xmlns", KML_NS)])),
        )?;
        emit(&mut writer, Event::Start(BytesStart::new("Document")))?;
        text_element(&mut writer, "name", document_name)?;

        for coord in coords {
            placemark(&mut writer, coord)?;
        }

        emit(&mut writer, Event::End(BytesEnd::new("Document")))?;
        emit(&mut writer, Event::End(BytesEnd::new("kml")))?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }
}

impl Serializer for KmlSerializer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Kml
    }

    fn serialize(&self, coords: &CoordinateSet, base_name: &str) -> ExportResult<ExportBundle> {
        Ok(ExportBundle {
            format: ExportFormat::Kml,
            base_name: base_name.to_string(),
            files: vec![("kml", Self::encode(coords, base_name)?)],
        })
    }
}

fn placemark(writer: &mut XmlWriter, coord: &Coordinate) -> ExportResult<()> {
    let (x, y) = coord.xy();
    emit(writer, Event::Start(BytesStart::new("Placemark")))?;
    text_element(writer, "name", &coord.filename)?;
    emit(writer, Event::Start(BytesStart::new("Point")))?;
    text_element(
        writer,
        "coordinates",
        &format!("{},{}", format_degrees(x), format_degrees(y)),
    )?;
    emit(writer, Event::End(BytesEnd::new("Point")))?;
    emit(writer, Event::End(BytesEnd::new("Placemark")))
}

fn text_element(writer: &mut XmlWriter, tag: &str, text: &str) -> ExportResult<()> {
    emit(writer, Event::Start(BytesStart::new(tag)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(tag)))
}

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> ExportResult<()> {
    writer
        .write_event(event)
        .map_err(|e| ExportError::Xml(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::Reader;

    fn encode(coords: Vec<Coordinate>) -> String {
        let bytes = KmlSerializer::encode(&CoordinateSet::from(coords), "coordinates").unwrap();
        String::from_utf8(bytes).unwrap()
    }

    /// Parse the document back, returning `(placemark names, coordinate texts)`.
    fn parse(doc: &str) -> (Vec<String>, Vec<String>) {
        let mut reader = Reader::from_str(doc);
        let mut names = Vec::new();
        let mut coords = Vec::new();
        let mut path: Vec<String> = Vec::new();
        loop {
            match reader.read_event().expect("well-formed KML") {
                Event::Start(e) => {
                    path.push(String::from_utf8(e.name().as_ref().to_vec()).unwrap());
                }
                Event::End(_) => {
                    path.pop();
                }
                Event::Text(t) => {
                    let text = t.unescape().unwrap().into_owned();
                    match path.as_slice() {
                        [.., p, n] if p == "Placemark" && n == "name" => names.push(text),
                        [.., n] if n == "coordinates" => coords.push(text),
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        (names, coords)
    }

    #[test]
    fn test_coordinates_are_lon_lat() {
        let doc = encode(vec![Coordinate::new("img1.jpg", 12.5, -1.25)]);
        assert!(doc.contains("<coordinates>-1.25,12.5</coordinates>"));

        let (names, coords) = parse(&doc);
        assert_eq!(names, vec!["img1.jpg"]);
        assert_eq!(coords, vec!["-1.25,12.5"]);
    }

    #[test]
    fn test_document_header() {
        let doc = encode(Vec::new());
        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(doc.contains("<kml xmlns=\"http://www.opengis.net/kml/2.2\">"));
        assert!(doc.contains("<name>coordinates</name>"));
    }

    #[test]
    fn test_one_placemark_per_coordinate_in_order() {
        let doc = encode(vec![
            Coordinate::new("a.jpg", 1.0, 2.0),
            Coordinate::new("b.jpg", -10.5, 20.25),
            Coordinate::new("c.jpg", 0.5, -179.5),
        ]);
        let (names, coords) = parse(&doc);
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
        assert_eq!(coords, vec!["2.0,1.0", "20.25,-10.5", "-179.5,0.5"]);
    }

    #[test]
    fn test_names_are_escaped() {
        let doc = encode(vec![Coordinate::new("<b>&co.jpg", 1.0, 2.0)]);
        assert!(!doc.contains("<b>&co"));
        assert!(doc.contains("&lt;b&gt;&amp;co.jpg"));

        let (names, _) = parse(&doc);
        assert_eq!(names, vec!["<b>&co.jpg"]);
    }

    #[test]
    fn test_empty_set_is_valid_document() {
        let doc = encode(Vec::new());
        let (names, coords) = parse(&doc);
        assert!(names.is_empty());
        assert!(coords.is_empty());
        assert!(doc.contains("</Document>"));
    }
}
