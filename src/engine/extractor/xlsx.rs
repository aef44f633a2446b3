//! Excel extraction (§4.3), via `calamine`, matching the crate choice of
//! `binhunstatic-qsv`/`BurntSushi-xsv` forks and `medialab-xan`.
//!
//! Like Parquet/Avro, a workbook's shared-strings table and worksheet index
//! require a seekable view of the whole file, so this buffers until
//! `at_eof`. Only the caller-selected sheet (`sheet` in [`SessionConfig`],
//! first sheet if unset) is processed, per §4.3.

use super::{ColumnTable, ExtractBatch, Extractor};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::value::{FieldEvent, RawField};
use calamine::{Data, Reader, Xlsx};
use std::io::Cursor;

pub struct XlsxExtractor {
    columns: ColumnTable,
    buffer: Vec<u8>,
    parsed: bool,
    sheet: Option<String>,
}

impl XlsxExtractor {
    pub fn new(sheet: Option<String>) -> Self {
        Self {
            columns: ColumnTable::default(),
            buffer: Vec::new(),
            parsed: false,
            sheet,
        }
    }
}

fn cell_to_raw(cell: &Data) -> RawField {
    match cell {
        Data::Empty => RawField::Null,
        Data::String(s) => RawField::Bytes(s.clone().into_bytes()),
        Data::Float(f) => RawField::Float(*f),
        Data::Int(i) => RawField::Int(*i),
        Data::Bool(b) => RawField::Bool(*b),
        Data::DateTime(dt) => RawField::Bytes(dt.to_string().into_bytes()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawField::Bytes(s.clone().into_bytes()),
        Data::Error(e) => RawField::Bytes(format!("{e:?}").into_bytes()),
    }
}

impl Extractor for XlsxExtractor {
    fn feed(&mut self, chunk: &[u8], at_eof: bool) -> EngineResult<ExtractBatch> {
        self.buffer.extend_from_slice(chunk);
        let mut batch = ExtractBatch::default();
        if !at_eof || self.parsed {
            return Ok(batch);
        }
        self.parsed = true;

        let buffer = std::mem::take(&mut self.buffer);
        let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(buffer))
            .map_err(|e| EngineError::MalformedHeader(format!("invalid xlsx workbook: {e}")))?;

        let sheet_name = match &self.sheet {
            Some(name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| EngineError::MalformedHeader("workbook has no sheets".into()))?,
        };

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| EngineError::MalformedHeader(format!("sheet {sheet_name} unreadable: {e}")))?;

        let mut rows = range.rows();
        let header_row = match rows.next() {
            Some(r) => r,
            None => return Ok(batch),
        };

        // Merged header cells surface as `Empty` in every column but the
        // first; repeat the last non-empty label across them so a merged
        // "Region" header spanning three columns doesn't become two
        // synthetic columns.
        let mut last_label = String::new();
        for (i, cell) in header_row.iter().enumerate() {
            let label = match cell {
                Data::Empty => last_label.clone(),
                other => format!("{other}"),
            };
            let label = if label.trim().is_empty() {
                format!("col_{}", i + 1)
            } else {
                label
            };
            last_label = label.clone();
            let (id, is_new) = self.columns.ensure(&label);
            if is_new {
                batch.new_columns.push((id, label));
            }
        }

        let mut row_index: u64 = 1;
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i >= self.columns.names().len() {
                    break;
                }
                batch.events.push(FieldEvent {
                    row_index,
                    column_id: i as u32,
                    value: cell_to_raw(cell),
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
