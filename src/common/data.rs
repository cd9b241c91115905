use std::path::Path;

use geo::MultiPolygon;
use polars::prelude::*;
use shapefile::{
    dbase::{FieldName, FieldValue, Record, TableWriterBuilder},
    Reader, Shape, Writer,
};

use crate::{common::{geo_to_shp, shp_to_geo}, error::{Error, Result}};

/// dBase limits field names to 10 bytes.
const MAX_FIELD_NAME: usize = 10;

/// Reads all polygon shapes + attribute records from a given `.shp` file path.
pub(crate) fn read_shapefile(path: &Path) -> Result<(Vec<MultiPolygon<f64>>, Vec<Record>)> {
    let mut reader = Reader::from_path(path)
        .map_err(|e| Error::unsupported(path, format!("failed to open shapefile: {e}")))?;

    let mut shapes = Vec::new();
    let mut records = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result
            .map_err(|e| Error::unsupported(path, format!("error reading shape+record: {e}")))?;
        let shape = match shape {
            Shape::Polygon(polygon) => shp_to_geo(&polygon),
            Shape::NullShape => MultiPolygon(Vec::new()),
            other => return Err(Error::unsupported(path, format!("found non-Polygon shape: {:?}", other.shapetype()))),
        };
        shapes.push(shape);
        records.push(record);
    }

    Ok((shapes, records))
}

/// Kind of attribute column inferred from dBase values.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ColumnKind { Text, Number, Bool }

fn value_kind(value: &FieldValue) -> Option<ColumnKind> {
    match value {
        FieldValue::Character(Some(_)) => Some(ColumnKind::Text),
        FieldValue::Numeric(Some(_))
        | FieldValue::Float(Some(_))
        | FieldValue::Integer(_)
        | FieldValue::Double(_)
        | FieldValue::Currency(_) => Some(ColumnKind::Number),
        FieldValue::Logical(Some(_)) => Some(ColumnKind::Bool),
        _ => None,
    }
}

fn as_number(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Numeric(n) => *n,
        FieldValue::Float(f) => f.map(f64::from),
        FieldValue::Integer(i) => Some(f64::from(*i)),
        FieldValue::Double(d) | FieldValue::Currency(d) => Some(*d),
        _ => None,
    }
}

/// Convert dBase records to a DataFrame. Field names are sorted; the column type
/// is taken from the first non-null value and mismatching values become null.
pub(crate) fn records_to_dataframe(records: &[Record]) -> Result<DataFrame> {
    let Some(first) = records.first() else { return Ok(DataFrame::empty()) };

    let mut names = first.clone().into_iter()
        .map(|(name, _)| name)
        .collect::<Vec<_>>();
    names.sort();

    let columns = names.iter()
        .map(|name| {
            let values = records.iter().map(|record| record.get(name)).collect::<Vec<_>>();
            let kind = values.iter()
                .find_map(|value| value.and_then(value_kind))
                .unwrap_or(ColumnKind::Text);

            match kind {
                ColumnKind::Text => Column::new(name.as_str().into(), values.iter()
                    .map(|value| match value {
                        Some(FieldValue::Character(Some(s))) => Some(s.trim().to_string()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()),
                ColumnKind::Number => Column::new(name.as_str().into(), values.iter()
                    .map(|value| value.and_then(as_number))
                    .collect::<Vec<_>>()),
                ColumnKind::Bool => Column::new(name.as_str().into(), values.iter()
                    .map(|value| match value {
                        Some(FieldValue::Logical(b)) => *b,
                        _ => None,
                    })
                    .collect::<Vec<_>>()),
            }
        })
        .collect::<Vec<_>>();

    Ok(DataFrame::new(columns)?)
}

/// Truncate a column name to a valid dBase field name.
fn field_name(name: &str) -> Result<(String, FieldName)> {
    let truncated = name.char_indices()
        .take_while(|&(i, c)| i + c.len_utf8() <= MAX_FIELD_NAME)
        .map(|(_, c)| c)
        .collect::<String>();
    let field = FieldName::try_from(truncated.as_str())
        .map_err(|e| Error::MissingAttribute(format!("invalid dBase field name {name:?}: {e:?}")))?;
    Ok((truncated, field))
}

/// Writes shapes + the attribute DataFrame to a `.shp`/`.shx`/`.dbf` triple.
pub(crate) fn write_shapefile(path: &Path, shapes: &[MultiPolygon<f64>], data: &DataFrame) -> Result<()> {
    let mut builder = TableWriterBuilder::new();
    let mut fields = Vec::with_capacity(data.width());
    for column in data.get_columns() {
        let (name, field) = field_name(column.name().as_str())?;
        let kind = match column.dtype() {
            DataType::String => {
                let width = column.str()?.into_iter()
                    .map(|s| s.map_or(0, str::len))
                    .max()
                    .unwrap_or(0)
                    .clamp(1, 254);
                builder = builder.add_character_field(field, width as u8);
                ColumnKind::Text
            }
            DataType::Boolean => {
                builder = builder.add_logical_field(field);
                ColumnKind::Bool
            }
            DataType::Float64 | DataType::Float32
            | DataType::Int64 | DataType::Int32 | DataType::Int16 | DataType::Int8
            | DataType::UInt64 | DataType::UInt32 | DataType::UInt16 | DataType::UInt8 => {
                builder = builder.add_numeric_field(field, 24, 6);
                ColumnKind::Number
            }
            other => return Err(Error::unsupported(path, format!("cannot write column {:?} of type {other}", column.name()))),
        };
        fields.push((name, kind, column));
    }

    let mut writer = Writer::from_path(path, builder)
        .map_err(|e| Error::unsupported(path, format!("failed to create shapefile: {e}")))?;

    for (i, shape) in shapes.iter().enumerate() {
        let mut record = Record::default();
        for (name, kind, column) in &fields {
            let value = column.get(i)?;
            let value = match kind {
                ColumnKind::Text => FieldValue::Character(value.get_str().map(str::to_string)),
                ColumnKind::Number => FieldValue::Numeric(value.extract::<f64>()),
                ColumnKind::Bool => FieldValue::Logical(match value {
                    AnyValue::Boolean(b) => Some(b),
                    _ => None,
                }),
            };
            record.insert(name.clone(), value);
        }
        writer.write_shape_and_record(&geo_to_shp(shape), &record)
            .map_err(|e| Error::unsupported(path, format!("failed to write shape {i}: {e}")))?;
    }

    Ok(())
}
