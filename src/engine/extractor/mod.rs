//! Record Extractor (§4.3): polymorphic over the detected format, all
//! variants producing the same flat stream of [`FieldEvent`]s.
//!
//! Per §9's "polymorphic record extractors -> variant over a common event
//! producer" design note: the session holds one member of a closed set of
//! extractor variants decided at init and never changed, matching the shape
//! `medialab-xan` uses for its own reader-per-format dispatch.

pub mod avro;
pub mod csv;
pub mod json;
pub mod parquet;
pub mod xlsx;

use crate::engine::error::EngineResult;
use crate::engine::value::FieldEvent;

/// Result of feeding one chunk to an extractor.
#[derive(Debug, Default)]
pub struct ExtractBatch {
    pub events: Vec<FieldEvent>,
    /// Columns discovered for the first time during this call, in discovery
    /// order. The session backfills `Null` into these for every row already
    /// processed before they were seen (the "deferred-column policy" of §4.3).
    pub new_columns: Vec<(u32, String)>,
    /// Rows dropped this call due to field-count mismatch, truncated JSON,
    /// etc. Counted toward the profile's `diagnostics.malformed_rows`.
    pub malformed_rows: u64,
    /// Columns that hit a non-UTF-8 byte sequence this call; the session
    /// records a one-time `"encoding"` note on each (§4.9 failure semantics).
    pub encoding_error_columns: Vec<u32>,
}

/// Common "given bytes, yield events" contract every format implements.
pub trait Extractor {
    /// Feed the next chunk. `at_eof` is true on the final call for the
    /// stream (the Session Controller calls it once more with an empty
    /// slice and `at_eof = true` if the last real chunk didn't set it).
    fn feed(&mut self, chunk: &[u8], at_eof: bool) -> EngineResult<ExtractBatch>;

    fn column_names(&self) -> &[String];
}

/// Column-name -> id table shared by the streaming text-based extractors.
/// New names are assigned the next sequential id on first sighting.
#[derive(Debug, Default)]
pub struct ColumnTable {
    names: Vec<String>,
    index: std::collections::HashMap<String, u32>,
}

impl ColumnTable {
    pub fn ensure(&mut self, name: &str) -> (u32, bool) {
        if let Some(&id) = self.index.get(name) {
            return (id, false);
        }
        let id = self.names.len() as u32;
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        (id, true)
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.index.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// The closed set of extractor variants; dispatches to whichever was
/// selected at session init based on the detected/overridden format.
pub enum AnyExtractor {
    Csv(csv::CsvExtractor),
    JsonLines(json::JsonLinesExtractor),
    JsonArray(json::JsonArrayExtractor),
    Parquet(parquet::ParquetExtractor),
    Avro(avro::AvroExtractor),
    Xlsx(xlsx::XlsxExtractor),
}

impl Extractor for AnyExtractor {
    fn feed(&mut self, chunk: &[u8], at_eof: bool) -> EngineResult<ExtractBatch> {
        match self {
            AnyExtractor::Csv(e) => e.feed(chunk, at_eof),
            AnyExtractor::JsonLines(e) => e.feed(chunk, at_eof),
            AnyExtractor::JsonArray(e) => e.feed(chunk, at_eof),
            AnyExtractor::Parquet(e) => e.feed(chunk, at_eof),
            AnyExtractor::Avro(e) => e.feed(chunk, at_eof),
            AnyExtractor::Xlsx(e) => e.feed(chunk, at_eof),
        }
    }

    fn column_names(&self) -> &[String] {
        match self {
            AnyExtractor::Csv(e) => e.column_names(),
            AnyExtractor::JsonLines(e) => e.column_names(),
            AnyExtractor::JsonArray(e) => e.column_names(),
            AnyExtractor::Parquet(e) => e.column_names(),
            AnyExtractor::Avro(e) => e.column_names(),
            AnyExtractor::Xlsx(e) => e.column_names(),
        }
    }
}

/// Flatten one JSON value under `prefix` at the given nesting `depth` into
/// `(dotted_path, RawField)` pairs, per §4.3: objects flatten up to depth 3,
/// deeper subtrees collapse to a JSON-encoded string (length stats only),
/// and arrays never recurse — they contribute a single `<path>[]` length
/// column instead.
pub fn flatten_json(
    value: &serde_json::Value,
    prefix: &str,
    depth: u32,
    out: &mut Vec<(String, crate::engine::value::RawField)>,
) {
    use crate::engine::value::RawField;
    use serde_json::Value;

    match value {
        Value::Null => out.push((prefix.to_string(), RawField::Null)),
        Value::Bool(b) => out.push((prefix.to_string(), RawField::Bool(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                out.push((prefix.to_string(), RawField::Int(i)));
            } else if let Some(f) = n.as_f64() {
                out.push((prefix.to_string(), RawField::Float(f)));
            } else {
                out.push((prefix.to_string(), RawField::Null));
            }
        }
        Value::String(s) => out.push((prefix.to_string(), RawField::Bytes(s.clone().into_bytes()))),
        Value::Array(items) => {
            out.push((format!("{prefix}[]"), RawField::Int(items.len() as i64)));
        }
        Value::Object(map) => {
            if depth >= 3 {
                let encoded = serde_json::to_string(value).unwrap_or_default();
                out.push((prefix.to_string(), RawField::Bytes(encoded.into_bytes())));
                return;
            }
            for (key, child) in map {
                let child_prefix = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_json(child, &child_prefix, depth + 1, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::value::RawField;
    use serde_json::json;

    #[test]
    fn flattens_nested_objects_to_dotted_paths() {
        let v = json!({"user": {"address": {"zip": "12345"}}});
        let mut out = Vec::new();
        flatten_json(&v, "", 0, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, "user.address.zip");
    }

    #[test]
    fn depth_beyond_three_collapses_to_json_string() {
        let v = json!({"a": {"b": {"c": {"d": 1}}}});
        let mut out = Vec::new();
        flatten_json(&v, "", 0, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, "a.b.c");
        assert!(matches!(out[0].1, RawField::Bytes(_)));
    }

    #[test]
    fn arrays_produce_only_a_length_column() {
        let v = json!({"tags": ["a", "b", "c"]});
        let mut out = Vec::new();
        flatten_json(&v, "", 0, &mut out);
        assert_eq!(out, vec![("tags[]".to_string(), RawField::Int(3))]);
    }
}
