//! CSV/TSV extraction (§4.3), RFC 4180 compliant, resumable across chunk
//! boundaries.
//!
//! Record splitting is hand-rolled (a quote-toggle scan for unquoted
//! newlines — two consecutive quote bytes inside a quoted field toggle twice
//! and net out to "still quoted", which is exactly RFC 4180's doubled-quote
//! escape) so that a record's bytes are never handed to the parser until
//! they're complete, even when a quoted field spans a chunk boundary. Once a
//! full record's bytes are isolated, field splitting reuses the teacher's
//! `csv` crate, the same dependency the original describe-csv endpoint built on.

use super::{ColumnTable, ExtractBatch, Extractor};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::value::{FieldEvent, RawField};

pub struct CsvExtractor {
    delimiter: u8,
    has_header: bool,
    header_done: bool,
    columns: ColumnTable,
    carry: Vec<u8>,
    in_quotes: bool,
    next_row_index: u64,
    expected_fields: Option<usize>,
}

impl CsvExtractor {
    pub fn new(delimiter: u8, has_header: bool) -> Self {
        Self {
            delimiter,
            has_header,
            header_done: false,
            columns: ColumnTable::default(),
            carry: Vec::new(),
            in_quotes: false,
            next_row_index: 1,
            expected_fields: None,
        }
    }

    /// Split a single isolated record's bytes into fields using the `csv`
    /// crate, so embedded delimiters/quotes within a field are handled
    /// exactly as the teacher's own CSV parsing already does.
    fn split_fields(&self, record: &[u8]) -> EngineResult<Vec<Vec<u8>>> {
        let mut rdr = ::csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(record);
        let mut out = Vec::new();
        let mut records = rdr.byte_records();
        if let Some(rec) = records.next() {
            let rec = rec.map_err(|e| EngineError::MalformedHeader(e.to_string()))?;
            for field in rec.iter() {
                out.push(field.to_vec());
            }
        }
        Ok(out)
    }

    /// Scan `self.carry` for complete records (unquoted newline-terminated),
    /// draining them out. Leaves any trailing partial record in `carry`.
    fn drain_complete_records(&mut self, at_eof: bool) -> Vec<Vec<u8>> {
        let mut records = Vec::new();
        let mut start = 0usize;
        let mut i = 0usize;
        let buf = &self.carry;
        while i < buf.len() {
            match buf[i] {
                b'"' => self.in_quotes = !self.in_quotes,
                b'\n' if !self.in_quotes => {
                    let mut end = i;
                    if end > start && buf[end - 1] == b'\r' {
                        end -= 1;
                    }
                    records.push(buf[start..end].to_vec());
                    start = i + 1;
                }
                _ => {}
            }
            i += 1;
        }
        let consumed = start;
        if at_eof && start < buf.len() {
            let mut end = buf.len();
            if end > start && buf[end - 1] == b'\r' {
                end -= 1;
            }
            if end > start {
                records.push(buf[start..end].to_vec());
            }
            self.carry.clear();
        } else {
            self.carry.drain(0..consumed);
        }
        records
    }
}

impl Extractor for CsvExtractor {
    fn feed(&mut self, chunk: &[u8], at_eof: bool) -> EngineResult<ExtractBatch> {
        self.carry.extend_from_slice(chunk);
        let mut batch = ExtractBatch::default();

        for record in self.drain_complete_records(at_eof) {
            if record.is_empty() {
                continue;
            }

            if std::str::from_utf8(&record).is_err() {
                batch.malformed_rows += 1;
                continue;
            }

            let fields = match self.split_fields(&record) {
                Ok(f) => f,
                Err(_) => {
                    batch.malformed_rows += 1;
                    continue;
                }
            };

            if !self.header_done {
                if self.has_header {
                    for (i, field) in fields.iter().enumerate() {
                        let name = String::from_utf8_lossy(field).trim().to_string();
                        let name = if name.is_empty() { format!("col_{}", i + 1) } else { name };
                        let (id, is_new) = self.columns.ensure(&name);
                        if is_new {
                            batch.new_columns.push((id, name));
                        }
                    }
                    self.expected_fields = Some(fields.len());
                    self.header_done = true;
                    continue;
                } else {
                    for i in 0..fields.len() {
                        let name = format!("col_{}", i + 1);
                        let (id, is_new) = self.columns.ensure(&name);
                        if is_new {
                            batch.new_columns.push((id, name));
                        }
                    }
                    self.expected_fields = Some(fields.len());
                    self.header_done = true;
                    // fall through: this row is also the first data row.
                }
            }

            let expected = self.expected_fields.unwrap_or(fields.len());
            if fields.len() != expected {
                batch.malformed_rows += 1;
                continue;
            }

            let row_index = self.next_row_index;
            self.next_row_index += 1;
            for (i, field) in fields.iter().enumerate() {
                let column_id = i as u32;
                match std::str::from_utf8(field) {
                    Ok(s) => batch.events.push(FieldEvent {
                        row_index,
                        column_id,
                        value: RawField::Bytes(s.as_bytes().to_vec()),
                    }),
                    Err(_) => {
                        if !batch.encoding_error_columns.contains(&column_id) {
                            batch.encoding_error_columns.push(column_id);
                        }
                    }
                }
            }
        }

        Ok(batch)
    }

    fn column_names(&self) -> &[String] {
        self.columns.names()
    }
}
