//! JSON array / JSON Lines extraction (§4.3).
//!
//! JSON Lines streams naturally: each newline-delimited value is flattened
//! independently as soon as a complete line arrives, carrying any trailing
//! partial line over to the next chunk exactly like the CSV extractor's
//! `carry` buffer. A top-level JSON array's closing bracket can only be
//! known at end-of-stream (no example in the retrieval pack depends on an
//! incremental top-level-array JSON parser), so `JsonArrayExtractor` buffers
//! the whole payload and parses once at `at_eof` — documented in DESIGN.md.

use super::{flatten_json, ColumnTable, ExtractBatch, Extractor};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::value::FieldEvent;

pub struct JsonLinesExtractor {
    columns: ColumnTable,
    carry: Vec<u8>,
    next_row_index: u64,
}

impl JsonLinesExtractor {
    pub fn new() -> Self {
        Self {
            columns: ColumnTable::default(),
            carry: Vec::new(),
            next_row_index: 1,
        }
    }

    fn ingest_line(&mut self, line: &[u8], batch: &mut ExtractBatch) {
        let text = match std::str::from_utf8(line) {
            Ok(t) if !t.trim().is_empty() => t,
            Ok(_) => return,
            Err(_) => {
                batch.malformed_rows += 1;
                return;
            }
        };
        let value: serde_json::Value = match serde_json::from_str(text.trim()) {
            Ok(v) => v,
            Err(_) => {
                batch.malformed_rows += 1;
                return;
            }
        };
        let row_index = self.next_row_index;
        self.next_row_index += 1;
        let mut fields = Vec::new();
        flatten_json(&value, "", 0, &mut fields);
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
}

impl Default for JsonLinesExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for JsonLinesExtractor {
    fn feed(&mut self, chunk: &[u8], at_eof: bool) -> EngineResult<ExtractBatch> {
        self.carry.extend_from_slice(chunk);
        let mut batch = ExtractBatch::default();

        let mut start = 0usize;
        while let Some(pos) = self.carry[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos;
            let line = self.carry[start..end].to_vec();
            self.ingest_line(&line, &mut batch);
            start = end + 1;
        }
        self.carry.drain(0..start);

        if at_eof && !self.carry.is_empty() {
            let line = std::mem::take(&mut self.carry);
            self.ingest_line(&line, &mut batch);
        }

        Ok(batch)
    }

    fn column_names(&self) -> &[String] {
        self.columns.names()
    }
}

pub struct JsonArrayExtractor {
    columns: ColumnTable,
    buffer: Vec<u8>,
    next_row_index: u64,
    parsed: bool,
}

impl JsonArrayExtractor {
    pub fn new() -> Self {
        Self {
            columns: ColumnTable::default(),
            buffer: Vec::new(),
            next_row_index: 1,
            parsed: false,
        }
    }
}

impl Default for JsonArrayExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for JsonArrayExtractor {
    fn feed(&mut self, chunk: &[u8], at_eof: bool) -> EngineResult<ExtractBatch> {
        self.buffer.extend_from_slice(chunk);
        let mut batch = ExtractBatch::default();
        if !at_eof || self.parsed {
            return Ok(batch);
        }
        self.parsed = true;

        let text = std::str::from_utf8(&self.buffer)
            .map_err(|_| EngineError::EncodingError { column: "<document>".to_string() })?;
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| EngineError::MalformedHeader(format!("invalid JSON array: {e}")))?;
        let items = value
            .as_array()
            .ok_or_else(|| EngineError::MalformedHeader("top-level JSON value is not an array".into()))?;

        for item in items {
            let row_index = self.next_row_index;
            self.next_row_index += 1;
            let mut fields = Vec::new();
            flatten_json(item, "", 0, &mut fields);
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
        Ok(batch)
    }

    fn column_names(&self) -> &[String] {
        self.columns.names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::value::RawField;

    #[test]
    fn json_lines_resolves_one_record_per_line() {
        let mut e = JsonLinesExtractor::new();
        let b1 = e.feed(b"{\"a\":1}\n{\"a\":2,\"b\":\"x", false).unwrap();
        assert_eq!(b1.events.len(), 1);
        let b2 = e.feed(b"\"}\n", true).unwrap();
        assert_eq!(b2.events.len(), 2);
        assert_eq!(b2.new_columns.len(), 1);
        assert_eq!(b2.new_columns[0].1, "b");
    }

    #[test]
    fn json_array_parses_at_eof_only() {
        let mut e = JsonArrayExtractor::new();
        let mid = e.feed(b"[{\"a\":1},", false).unwrap();
        assert!(mid.events.is_empty());
        let end = e.feed(b"{\"a\":2}]", true).unwrap();
        assert_eq!(end.events.len(), 2);
        assert_eq!(end.events[0].value, RawField::Int(1));
    }
}
