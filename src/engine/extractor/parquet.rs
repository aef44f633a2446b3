//! Parquet extraction (§4.3).
//!
//! Parquet's schema and row-group index live in a footer at the *end* of the
//! file, so there is no way to start emitting rows before the whole byte
//! range is available — unlike CSV/JSON Lines, this extractor buffers the
//! full payload and parses once at `at_eof`, matching how
//! `nikhilsinhaparseable-parseable` and `nguyenthdat-forensics-tools` treat
//! Parquet input (always a fully-materialized byte buffer, never a
//! streaming token parser).

use super::{ColumnTable, ExtractBatch, Extractor};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::value::{FieldEvent, RawField};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;

pub struct ParquetExtractor {
    columns: ColumnTable,
    buffer: Vec<u8>,
    parsed: bool,
}

impl ParquetExtractor {
    pub fn new() -> Self {
        Self {
            columns: ColumnTable::default(),
            buffer: Vec::new(),
            parsed: false,
        }
    }
}

impl Default for ParquetExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn scalar_field_to_raw(field: &Field) -> Option<RawField> {
    match field {
        Field::Null => None,
        Field::Bool(b) => Some(RawField::Bool(*b)),
        Field::Byte(v) => Some(RawField::Int(*v as i64)),
        Field::Short(v) => Some(RawField::Int(*v as i64)),
        Field::Int(v) => Some(RawField::Int(*v as i64)),
        Field::Long(v) => Some(RawField::Int(*v)),
        Field::UByte(v) => Some(RawField::Int(*v as i64)),
        Field::UShort(v) => Some(RawField::Int(*v as i64)),
        Field::UInt(v) => Some(RawField::Int(*v as i64)),
        Field::ULong(v) => Some(RawField::Int(*v as i64)),
        Field::Float(v) => Some(RawField::Float(*v as f64)),
        Field::Double(v) => Some(RawField::Float(*v)),
        Field::Str(s) => Some(RawField::Bytes(s.clone().into_bytes())),
        Field::Bytes(b) => Some(RawField::Bytes(b.data().to_vec())),
        // Logical date/timestamp/decimal types: rendered via their `Display`
        // impl rather than re-derived arithmetic, then re-classified as text
        // (Date/DateTime/Numeric) by the same lattice CSV values go through.
        Field::Date(_) | Field::TimestampMillis(_) | Field::TimestampMicros(_) | Field::Decimal(_) => {
            Some(RawField::Bytes(field.to_string().into_bytes()))
        }
        Field::Group(_) | Field::ListInternal(_) | Field::MapInternal(_) => None,
    }
}

/// Flatten one named Parquet field under `prefix`, recursing into struct
/// (`Group`) columns up to depth 3 and reducing list/map columns to a single
/// length-only `<path>[]` column, mirroring `flatten_json`'s rules exactly.
fn flatten_parquet(prefix: &str, field: &Field, depth: u32, out: &mut Vec<(String, RawField)>) {
    match field {
        Field::Group(row) if depth < 3 => {
            for (name, child) in row.get_column_iter() {
                let path = format!("{prefix}.{name}");
                flatten_parquet(&path, child, depth + 1, out);
            }
        }
        Field::Group(_) => {
            out.push((prefix.to_string(), RawField::Bytes(field.to_string().into_bytes())));
        }
        Field::ListInternal(list) => {
            out.push((format!("{prefix}[]"), RawField::Int(list.elements().len() as i64)));
        }
        Field::MapInternal(map) => {
            out.push((format!("{prefix}[]"), RawField::Int(map.entries().len() as i64)));
        }
        other => out.push((prefix.to_string(), scalar_field_to_raw(other).unwrap_or(RawField::Null))),
    }
}

impl Extractor for ParquetExtractor {
    fn feed(&mut self, chunk: &[u8], at_eof: bool) -> EngineResult<ExtractBatch> {
        self.buffer.extend_from_slice(chunk);
        let mut batch = ExtractBatch::default();
        if !at_eof || self.parsed {
            return Ok(batch);
        }
        self.parsed = true;

        let bytes = bytes::Bytes::from(std::mem::take(&mut self.buffer));
        let reader = SerializedFileReader::new(bytes)
            .map_err(|e| EngineError::MalformedHeader(format!("invalid parquet file: {e}")))?;

        let mut row_index: u64 = 1;
        for row_result in reader
            .get_row_iter(None)
            .map_err(|e| EngineError::MalformedHeader(format!("parquet row iterator: {e}")))?
        {
            let row = match row_result {
                Ok(r) => r,
                Err(_) => {
                    batch.malformed_rows += 1;
                    continue;
                }
            };
            for (name, field) in row.get_column_iter() {
                let mut fields = Vec::new();
                flatten_parquet(name, field, 0, &mut fields);
                for (path, raw) in fields {
                    let (id, is_new) = self.columns.ensure(&path);
                    if is_new {
                        batch.new_columns.push((id, path));
                    }
                    batch.events.push(FieldEvent {
                        row_index,
                        column_id: id,
                        value: raw,
                    });
                }
            }
            row_index += 1;
        }

        Ok(batch)
    }

    fn column_names(&self) -> &[String] {
        self.columns.names()
    }
}
