//! dBase III attribute table with a single character field.

use std::io::{Cursor, Write};

use dbase::{FieldIOError, FieldName, FieldWriter, TableWriterBuilder, WritableRecord};

/// Default width of a character field.
const MIN_FIELD_WIDTH: usize = 50;

/// Widest character field dBase III allows.
const MAX_FIELD_WIDTH: usize = 254;

/// One row of the table: a single text value.
struct TextRecord<'a>(&'a str);

impl WritableRecord for TextRecord<'_> {
    fn write_using<'w, W: Write>(
        &self,
        field_writer: &mut FieldWriter<'w, W>,
    ) -> Result<(), FieldIOError> {
        field_writer.write_next_field_value(&self.0)
    }
}

/// Encode a one-column table of character values.
///
/// The column is as wide as the longest value (at least 50, at most 254
/// bytes); longer values are truncated on a character boundary.
pub(crate) fn encode_text_column(field_name: &str, values: &[&str]) -> Result<Vec<u8>, String> {
    if field_name.is_empty() || field_name.len() > 10 || !field_name.is_ascii() {
        return Err(format!("invalid dBase field name '{field_name}'"));
    }
    let name = FieldName::try_from(field_name).map_err(|e| e.to_string())?;

    let width = values
        .iter()
        .map(|v| v.len())
        .max()
        .unwrap_or(0)
        .clamp(MIN_FIELD_WIDTH, MAX_FIELD_WIDTH);

    let mut out = Cursor::new(Vec::new());
    {
        let mut writer = TableWriterBuilder::new()
            .add_character_field(name, width as u8)
            .build_with_dest(&mut out);
        for value in values {
            writer
                .write_record(&TextRecord(truncate(value, width)))
                .map_err(|e| e.to_string())?;
        }
        writer.close().map_err(|e| e.to_string())?;
    }
    Ok(out.into_inner())
}

fn truncate(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
