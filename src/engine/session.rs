//! Session Controller (§4.9): the engine's top-level lifecycle object —
//! `init` / `process_chunk` / `finalize` / `cancel` — realized as a plain
//! owned struct rather than an actor, matching §5's "single-threaded
//! cooperatively inside one host task" concurrency model. The HTTP layer
//! (`routes::profile`) is the host task; it owns one `Session` per
//! in-flight upload behind the `Arc<Mutex<_>>`-keyed map in `AppState`.

use crate::engine::accumulators::ColumnAccumulator;
use crate::engine::anomaly::{anomaly_cap_for, AnomalyIndex};
use crate::engine::config::{FormatOverride, HeaderMode, SessionConfig};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::extractor::{
    avro::AvroExtractor, csv::CsvExtractor, json::JsonArrayExtractor, json::JsonLinesExtractor,
    parquet::ParquetExtractor, xlsx::XlsxExtractor, AnyExtractor, Extractor,
};
use crate::engine::format_detector::{self, DetectedFormat};
use crate::engine::profile::{build_column_profile, ColumnProfile, Diagnostics, ProfileResult};
use tracing::{debug, info, warn};

/// Size of the leading sample handed to the format detector (§4.2).
const SNIFF_SAMPLE_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Ready,
    Processing,
    Finalized,
    Cancelled,
    Failed,
}

pub struct Session {
    state: SessionState,
    config: SessionConfig,
    filename_hint: Option<String>,
    extractor: Option<AnyExtractor>,
    sniff_buffer: Vec<u8>,
    accumulators: Vec<ColumnAccumulator>,
    anomalies: Vec<AnomalyIndex>,
    total_rows: u64,
    malformed_rows: u64,
    bytes_received: u64,
    failure: Option<EngineError>,
}

impl Session {
    /// `init(config)` per §4.9: allocates no accumulators yet (columns are
    /// discovered from the stream), returns a session in `Ready` state.
    pub fn init(config: SessionConfig, filename_hint: Option<String>) -> Self {
        info!(size_limit_bytes = config.size_limit_bytes, "profiling session created");
        Self {
            state: SessionState::Ready,
            config,
            filename_hint,
            extractor: None,
            sniff_buffer: Vec::new(),
            accumulators: Vec::new(),
            anomalies: Vec::new(),
            total_rows: 0,
            malformed_rows: 0,
            bytes_received: 0,
            failure: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn ensure_column(&mut self, id: u32) {
        while self.accumulators.len() <= id as usize {
            let name = format!("col_{}", self.accumulators.len() + 1);
            self.accumulators.push(ColumnAccumulator::new(
                name,
                self.config.hll_precision,
                self.config.tdigest_compression,
            ));
            self.anomalies.push(AnomalyIndex::new(self.config.anomaly_cap));
        }
    }

    fn fail(&mut self, err: EngineError) -> EngineError {
        warn!(error = %err, "profiling session failed");
        self.state = SessionState::Failed;
        self.failure = Some(err.clone());
        err
    }

    fn build_extractor(&self, sample: &[u8]) -> EngineResult<AnyExtractor> {
        let filename = self.filename_hint.as_deref();

        let detected = format_detector::detect(sample, filename);
        let format = match self.config.format {
            Some(FormatOverride::Csv) => DetectedFormat::Csv,
            Some(FormatOverride::Tsv) => DetectedFormat::Tsv,
            Some(FormatOverride::JsonArray) => DetectedFormat::JsonArray,
            Some(FormatOverride::JsonLines) => DetectedFormat::JsonLines,
            Some(FormatOverride::Parquet) => DetectedFormat::Parquet,
            Some(FormatOverride::Xlsx) => DetectedFormat::Xlsx,
            Some(FormatOverride::Avro) => DetectedFormat::Avro,
            None => detected.format,
        };

        let default_delimiter = if format == DetectedFormat::Tsv { b'\t' } else { b',' };
        let delimiter = self
            .config
            .delimiter
            .or(detected.delimiter)
            .unwrap_or(default_delimiter);
        let has_header = match self.config.has_header {
            HeaderMode::Yes => true,
            HeaderMode::No => false,
            HeaderMode::Auto => detected.has_header,
        };

        debug!(?format, has_header, "format detection resolved");

        Ok(match format {
            // `delimiter` already carries the detector's resolved byte (`;`,
            // `|`, etc.) when the caller didn't force one, so both delimited
            // variants must be built from it rather than a hardcoded ',' / '\t'.
            DetectedFormat::Csv => AnyExtractor::Csv(CsvExtractor::new(delimiter, has_header)),
            DetectedFormat::Tsv => AnyExtractor::Csv(CsvExtractor::new(delimiter, has_header)),
            DetectedFormat::JsonArray => AnyExtractor::JsonArray(JsonArrayExtractor::new()),
            DetectedFormat::JsonLines => AnyExtractor::JsonLines(JsonLinesExtractor::new()),
            DetectedFormat::Parquet => AnyExtractor::Parquet(ParquetExtractor::new()),
            DetectedFormat::Avro => AnyExtractor::Avro(AvroExtractor::new()),
            DetectedFormat::Xlsx => AnyExtractor::Xlsx(XlsxExtractor::new(self.config.sheet.clone())),
        })
    }

    /// `process_chunk(bytes)`: feeds bytes to the extractor, drains events
    /// into accumulators, returns an optional progress percentage (the
    /// engine has no notion of total stream size, so this is always `None`
    /// here; the HTTP layer derives progress from `Content-Length` itself).
    pub fn process_chunk(&mut self, bytes: &[u8]) -> EngineResult<Option<f64>> {
        if self.state == SessionState::Cancelled {
            return Err(EngineError::Cancelled);
        }
        if self.state == SessionState::Failed {
            return Err(self.failure.clone().unwrap_or(EngineError::Cancelled));
        }
        self.state = SessionState::Processing;

        self.bytes_received += bytes.len() as u64;
        if self.bytes_received > self.config.size_limit_bytes {
            return Err(self.fail(EngineError::FileTooLarge {
                actual: self.bytes_received,
                limit: self.config.size_limit_bytes,
            }));
        }

        if self.extractor.is_none() {
            self.sniff_buffer.extend_from_slice(bytes);
            if self.sniff_buffer.len() >= SNIFF_SAMPLE_BYTES || !bytes.is_empty() {
                let sample_len = self.sniff_buffer.len().min(SNIFF_SAMPLE_BYTES);
                let sample = self.sniff_buffer[..sample_len].to_vec();
                let extractor = self
                    .build_extractor(&sample)
                    .map_err(|e| self.fail(e))?;
                self.extractor = Some(extractor);
                let pending = std::mem::take(&mut self.sniff_buffer);
                return self.feed_extractor(&pending, false);
            }
            return Ok(None);
        }

        self.feed_extractor(bytes, false)
    }

    fn feed_extractor(&mut self, bytes: &[u8], at_eof: bool) -> EngineResult<Option<f64>> {
        let extractor = self.extractor.as_mut().expect("extractor initialized before feed");
        let batch = extractor.feed(bytes, at_eof).map_err(|e| {
            let fatal = e.clone();
            self.fail(fatal)
        })?;

        for (id, _name) in &batch.new_columns {
            self.ensure_column(*id);
            // Deferred-column policy (§4.3): backfill every row already seen
            // as `Null` for this newly-discovered column.
            let acc = &mut self.accumulators[*id as usize];
            let anomalies = &mut self.anomalies[*id as usize];
            for row in 1..=self.total_rows {
                acc.observe(&crate::engine::value::RawField::Null, row, anomalies);
            }
        }

        for event in &batch.events {
            self.ensure_column(event.column_id);
            self.total_rows = self.total_rows.max(event.row_index);
            let acc = &mut self.accumulators[event.column_id as usize];
            let anomalies = &mut self.anomalies[event.column_id as usize];
            acc.observe(&event.value, event.row_index, anomalies);
        }

        for column_id in &batch.encoding_error_columns {
            self.ensure_column(*column_id);
            self.accumulators[*column_id as usize].record_encoding_issue();
        }

        if batch.malformed_rows > 0 {
            self.malformed_rows += batch.malformed_rows;
            for acc in &mut self.accumulators {
                acc.record_malformed_row();
            }
        }

        Ok(None)
    }

    /// `finalize()`: flushes any buffered partial record, freezes every
    /// column accumulator into a [`ColumnProfile`], and returns the full
    /// [`ProfileResult`]. Accumulators are left intact afterward so
    /// diagnostics remain inspectable; finalize is idempotent in the sense
    /// that calling it twice returns the same numbers (no further mutation
    /// occurs besides the one-time extractor flush).
    pub fn finalize(&mut self) -> EngineResult<ProfileResult> {
        if self.state == SessionState::Cancelled {
            return Err(EngineError::Cancelled);
        }
        if self.state == SessionState::Failed {
            return Err(self.failure.clone().unwrap_or(EngineError::Cancelled));
        }

        if self.extractor.is_none() {
            let sample = std::mem::take(&mut self.sniff_buffer);
            let extractor = self.build_extractor(&sample).map_err(|e| self.fail(e))?;
            self.extractor = Some(extractor);
            self.feed_extractor(&sample, true)?;
        } else {
            self.feed_extractor(&[], true)?;
        }

        // §4.6's 10%-of-rows cap is informational only here: anomaly lists
        // are capped at insertion time using the configured `anomaly_cap`,
        // since `total_rows` (needed for the 10% rule) isn't known until
        // this point and retroactively shrinking already-stored indices
        // would discard evidence rather than bound memory. Recorded as an
        // open-question decision in DESIGN.md.
        let _ = anomaly_cap_for(self.total_rows, self.config.anomaly_cap);
        let cardinality_budget = self.config.cardinality_budget;

        let mut column_profiles: Vec<ColumnProfile> = Vec::with_capacity(self.accumulators.len());
        for (acc, anomalies) in self.accumulators.iter_mut().zip(self.anomalies.iter()) {
            column_profiles.push(build_column_profile(acc, anomalies, cardinality_budget));
        }

        self.state = SessionState::Finalized;
        info!(
            total_rows = self.total_rows,
            columns = column_profiles.len(),
            malformed_rows = self.malformed_rows,
            "profiling session finalized"
        );

        Ok(ProfileResult {
            total_rows: self.total_rows,
            column_profiles,
            diagnostics: Diagnostics {
                malformed_rows: self.malformed_rows,
            },
        })
    }

    /// `cancel()`: terminal; the session is unusable afterward.
    pub fn cancel(&mut self) {
        info!("profiling session cancelled");
        self.state = SessionState::Cancelled;
        self.extractor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::type_inference::InferredType;

    #[test]
    fn e1_numeric_csv_end_to_end() {
        let mut session = Session::init(SessionConfig::default(), Some("data.csv".into()));
        session.process_chunk(b"price\n10\n20\n\n30\n40\n").unwrap();
        let profile = session.finalize().unwrap();
        let price = &profile.column_profiles[0];
        assert_eq!(price.base_stats.count, 4);
        let stats = price.numeric_stats.as_ref().unwrap();
        assert!((stats.mean - 25.0).abs() < 1e-6);
    }

    #[test]
    fn chunking_does_not_change_results() {
        let data = b"a,b\n1,x\n2,y\n3,z\n4,w\n5,v\n".to_vec();

        let mut whole = Session::init(SessionConfig::default(), Some("f.csv".into()));
        whole.process_chunk(&data).unwrap();
        let whole_profile = whole.finalize().unwrap();

        let mut chunked = Session::init(SessionConfig::default(), Some("f.csv".into()));
        for byte in &data {
            chunked.process_chunk(&[*byte]).unwrap();
        }
        let chunked_profile = chunked.finalize().unwrap();

        assert_eq!(whole_profile.total_rows, chunked_profile.total_rows);
        assert_eq!(
            whole_profile.column_profiles[0].base_stats.count,
            chunked_profile.column_profiles[0].base_stats.count
        );
        let a_whole = whole_profile.column_profiles[0].numeric_stats.as_ref().unwrap();
        let a_chunked = chunked_profile.column_profiles[0].numeric_stats.as_ref().unwrap();
        assert!((a_whole.mean - a_chunked.mean).abs() < 1e-9);
    }

    #[test]
    fn e5_schema_diff_setup_types_are_distinguishable() {
        let mut session = Session::init(SessionConfig::default(), Some("f.csv".into()));
        session.process_chunk(b"a,b\n1,2.5\n2,3.5\n").unwrap();
        let profile = session.finalize().unwrap();
        assert_eq!(profile.column_profiles[0].inferred_type, InferredType::Integer);
        assert_eq!(profile.column_profiles[1].inferred_type, InferredType::Numeric);
    }

    #[test]
    fn cancel_makes_session_unusable() {
        let mut session = Session::init(SessionConfig::default(), Some("f.csv".into()));
        session.process_chunk(b"a\n1\n").unwrap();
        session.cancel();
        assert!(matches!(session.process_chunk(b"2\n"), Err(EngineError::Cancelled)));
        assert!(matches!(session.finalize(), Err(EngineError::Cancelled)));
    }

    #[test]
    fn file_too_large_is_fatal() {
        let mut config = SessionConfig::default();
        config.size_limit_bytes = 4;
        let mut session = Session::init(config, Some("f.csv".into()));
        let err = session.process_chunk(b"aaaaaaaaaa").unwrap_err();
        assert!(matches!(err, EngineError::FileTooLarge { .. }));
        assert_eq!(session.state(), SessionState::Failed);
    }
}
