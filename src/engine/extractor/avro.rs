//! Avro Object Container File extraction (§4.3).
//!
//! Same buffer-then-parse-at-eof shape as the Parquet extractor: Avro's
//! block structure is streamable in principle, but `apache_avro::Reader`
//! wants a single `Read` over the whole container (schema header + sync
//! markers), so we hand it one contiguous buffer once the stream ends. No
//! repo in the retrieval pack exercises Avro; this dependency is a
//! deliberate pack-gap addition, recorded in DESIGN.md.

use super::{ColumnTable, ExtractBatch, Extractor};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::value::{FieldEvent, RawField};
use apache_avro::types::Value;
use apache_avro::Reader;

pub struct AvroExtractor {
    columns: ColumnTable,
    buffer: Vec<u8>,
    parsed: bool,
}

impl AvroExtractor {
    pub fn new() -> Self {
        Self {
            columns: ColumnTable::default(),
            buffer: Vec::new(),
            parsed: false,
        }
    }
}

impl Default for AvroExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Unwrap a (possibly nested) Avro union down to its active variant.
fn deref_union(value: &Value) -> &Value {
    match value {
        Value::Union(_, inner) => deref_union(inner),
        other => other,
    }
}

fn flatten_avro(prefix: &str, value: &Value, depth: u32, out: &mut Vec<(String, RawField)>) {
    let value = deref_union(value);
    match value {
        Value::Null => out.push((prefix.to_string(), RawField::Null)),
        Value::Boolean(b) => out.push((prefix.to_string(), RawField::Bool(*b))),
        Value::Int(i) => out.push((prefix.to_string(), RawField::Int(*i as i64))),
        Value::Long(i) => out.push((prefix.to_string(), RawField::Int(*i))),
        Value::Float(f) => out.push((prefix.to_string(), RawField::Float(*f as f64))),
        Value::Double(f) => out.push((prefix.to_string(), RawField::Float(*f))),
        Value::String(s) => out.push((prefix.to_string(), RawField::Bytes(s.clone().into_bytes()))),
        Value::Bytes(b) | Value::Fixed(_, b) => out.push((prefix.to_string(), RawField::Bytes(b.clone()))),
        Value::Enum(_, symbol) => out.push((prefix.to_string(), RawField::Bytes(symbol.clone().into_bytes()))),
        Value::Date(_)
        | Value::TimeMillis(_)
        | Value::TimeMicros(_)
        | Value::TimestampMillis(_)
        | Value::TimestampMicros(_)
        | Value::Decimal(_)
        | Value::Duration(_)
        | Value::Uuid(_) => out.push((prefix.to_string(), RawField::Bytes(format!("{value:?}").into_bytes()))),
        Value::Array(items) => out.push((format!("{prefix}[]"), RawField::Int(items.len() as i64))),
        Value::Map(map) => out.push((format!("{prefix}[]"), RawField::Int(map.len() as i64))),
        Value::Record(fields) if depth < 3 => {
            for (name, child) in fields {
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}.{name}")
                };
                flatten_avro(&path, child, depth + 1, out);
            }
        }
        Value::Record(_) => {
            out.push((prefix.to_string(), RawField::Bytes(format!("{value:?}").into_bytes())));
        }
        Value::Union(..) => unreachable!("unwrapped above"),
    }
}

impl Extractor for AvroExtractor {
    fn feed(&mut self, chunk: &[u8], at_eof: bool) -> EngineResult<ExtractBatch> {
        self.buffer.extend_from_slice(chunk);
        let mut batch = ExtractBatch::default();
        if !at_eof || self.parsed {
            return Ok(batch);
        }
        self.parsed = true;

        let buffer = std::mem::take(&mut self.buffer);
        let reader = Reader::new(&buffer[..])
            .map_err(|e| EngineError::MalformedHeader(format!("invalid avro container: {e}")))?;

        let mut row_index: u64 = 1;
        for value_result in reader {
            let value = match value_result {
                Ok(v) => v,
                Err(_) => {
                    batch.malformed_rows += 1;
                    continue;
                }
            };
            let mut fields = Vec::new();
            flatten_avro("", &value, 0, &mut fields);
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
            row_index += 1;
        }

        Ok(batch)
    }

    fn column_names(&self) -> &[String] {
        self.columns.names()
    }
}
