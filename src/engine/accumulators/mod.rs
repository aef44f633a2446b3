//! Per-column statistics accumulator bundle (§4.5).
//!
//! One [`ColumnAccumulator`] per observed column, updated once per non-null
//! value via [`ColumnAccumulator::observe`]. All estimators are O(1)
//! amortized memory per column, independent of row count.

pub mod hll;
pub mod moments;
pub mod pii;
pub mod quantiles;
pub mod topk;

use crate::engine::anomaly::{AnomalyClass, AnomalyIndex};
use crate::engine::type_inference::{ColumnTypeInferencer, InferredType};
use crate::engine::value::RawField;
use hll::DistinctEstimator;
use moments::OnlineMoments;
use pii::PiiCounters;
use quantiles::QuantileEstimator;
use topk::TopKTracker;

pub struct ColumnAccumulator {
    pub name: String,
    count: u64,
    missing: u64,
    type_inferencer: ColumnTypeInferencer,
    distinct: DistinctEstimator,
    moments: OnlineMoments,
    quantiles: QuantileEstimator,
    topk: TopKTracker,
    pii_counters: PiiCounters,
    min_length: Option<usize>,
    max_length: Option<usize>,
    notes: Vec<&'static str>,
    malformed_row_note_emitted: bool,
    encoding_note_emitted: bool,
    non_finite_note_emitted: bool,
}

impl ColumnAccumulator {
    pub fn new(name: String, hll_precision: u8, tdigest_compression: f64) -> Self {
        Self {
            name,
            count: 0,
            missing: 0,
            type_inferencer: ColumnTypeInferencer::new(),
            distinct: DistinctEstimator::with_precision(hll_precision),
            moments: OnlineMoments::new(),
            quantiles: QuantileEstimator::with_compression(tdigest_compression),
            topk: TopKTracker::new(),
            pii_counters: PiiCounters::default(),
            min_length: None,
            max_length: None,
            notes: Vec::new(),
            malformed_row_note_emitted: false,
            encoding_note_emitted: false,
            non_finite_note_emitted: false,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn missing(&self) -> u64 {
        self.missing
    }

    pub fn inferred_type(&self) -> InferredType {
        self.type_inferencer.state()
    }

    pub fn notes(&self) -> &[&'static str] {
        &self.notes
    }

    pub fn moments(&self) -> &OnlineMoments {
        &self.moments
    }

    pub fn quantiles(&mut self) -> &mut QuantileEstimator {
        &mut self.quantiles
    }

    pub fn topk(&self) -> &TopKTracker {
        &self.topk
    }

    pub fn length_bounds(&self) -> Option<(usize, usize)> {
        match (self.min_length, self.max_length) {
            (Some(lo), Some(hi)) => Some((lo, hi)),
            _ => None,
        }
    }

    pub fn distinct_estimate(&mut self) -> u64 {
        self.distinct.estimate()
    }

    /// Feed one field event's value; records anomalies as it goes. Returns
    /// whether this observation was non-finite/malformed (caller decides
    /// whether to bump the `format`/`malformed_row` counters).
    pub fn observe(&mut self, value: &RawField, row_index: u64, anomalies: &mut AnomalyIndex) {
        if value.is_null() {
            self.missing += 1;
            anomalies.record(AnomalyClass::Missing, row_index);
            return;
        }

        // Non-finite numeric inputs are treated as missing per spec numeric semantics.
        if let RawField::Float(f) = value {
            if !f.is_finite() {
                self.missing += 1;
                anomalies.record(AnomalyClass::Missing, row_index);
                if !self.non_finite_note_emitted {
                    self.non_finite_note_emitted = true;
                    self.notes.push("non-finite values ignored");
                }
                return;
            }
        }

        self.count += 1;

        let text = value.as_text();
        if let Some(text) = &text {
            self.distinct.insert(text.as_bytes());
            if self.type_inferencer.observe_text(text) {
                self.notes.push("mixed types: numeric with exceptions");
            }

            let len = text.chars().count();
            self.min_length = Some(self.min_length.map_or(len, |cur| cur.min(len)));
            self.max_length = Some(self.max_length.map_or(len, |cur| cur.max(len)));

            if let Some(kind) = pii::detect(text) {
                self.pii_counters.record(kind);
                anomalies.record(AnomalyClass::Pii, row_index);
            }

            self.topk.observe(text.as_bytes());
        } else if let RawField::Bytes(b) = value {
            self.distinct.insert(b);
        }

        if let Some(x) = value.as_f64() {
            let was_outlier = self.moments.count() >= 2 && {
                let mean = self.moments.mean();
                let sd = self.moments.sample_std_dev();
                sd.is_finite() && sd > 0.0 && (x - mean).abs() > 3.0 * sd
            };
            self.moments.push(x);
            self.quantiles.push(x);
            if was_outlier {
                anomalies.record(AnomalyClass::Outlier, row_index);
            }
        }
    }

    pub fn record_malformed_row(&mut self) {
        if !self.malformed_row_note_emitted {
            self.malformed_row_note_emitted = true;
            self.notes.push("malformed row");
        }
    }

    pub fn record_encoding_issue(&mut self) {
        if !self.encoding_note_emitted {
            self.encoding_note_emitted = true;
            self.notes.push("encoding");
        }
    }

    pub fn pii_notes(&self) -> Vec<&'static str> {
        self.pii_counters.notes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::anomaly::AnomalyIndex;

    fn col() -> ColumnAccumulator {
        ColumnAccumulator::new("price".into(), 14, 500.0)
    }

    #[test]
    fn e1_numeric_column_scenario() {
        let mut anomalies = AnomalyIndex::new(100_000);
        let mut acc = col();
        let values = [
            RawField::Int(10),
            RawField::Int(20),
            RawField::Null,
            RawField::Int(30),
            RawField::Int(40),
        ];
        for (i, v) in values.iter().enumerate() {
            acc.observe(v, (i + 1) as u64, &mut anomalies);
        }
        assert_eq!(acc.count(), 4);
        assert_eq!(acc.missing(), 1);
        assert_eq!(acc.inferred_type(), InferredType::Integer);
        assert!((acc.moments().mean() - 25.0).abs() < 1e-9);
        assert!((acc.moments().sample_std_dev() - 12.909944487358056).abs() < 1e-6);
        assert_eq!(acc.moments().min(), Some(10.0));
        assert_eq!(acc.moments().max(), Some(40.0));
    }

    #[test]
    fn e2_string_column_scenario() {
        let mut anomalies = AnomalyIndex::new(100_000);
        let mut acc = ColumnAccumulator::new("name".into(), 14, 500.0);
        let values = [
            RawField::Bytes(b"Alice".to_vec()),
            RawField::Bytes(b"Bob".to_vec()),
            RawField::Null,
            RawField::Bytes(b"Alice".to_vec()),
            RawField::Bytes(b"Carol".to_vec()),
        ];
        for (i, v) in values.iter().enumerate() {
            acc.observe(v, (i + 1) as u64, &mut anomalies);
        }
        assert_eq!(acc.count(), 4);
        assert_eq!(acc.missing(), 1);
        assert_eq!(acc.length_bounds(), Some((3, 5)));
        assert_eq!(acc.inferred_type(), InferredType::String);
    }

    #[test]
    fn e4_pii_email_scenario() {
        let mut anomalies = AnomalyIndex::new(100_000);
        let mut acc = ColumnAccumulator::new("contact".into(), 14, 500.0);
        let values = [
            RawField::Bytes(b"a@b.com".to_vec()),
            RawField::Bytes(b"c@d.org".to_vec()),
            RawField::Bytes(b"not-an-email".to_vec()),
        ];
        for (i, v) in values.iter().enumerate() {
            acc.observe(v, (i + 1) as u64, &mut anomalies);
        }
        assert!(acc.pii_notes().contains(&"potential PII: email"));
        assert_eq!(anomalies.list(AnomalyClass::Pii).stored(), &[1, 2]);
    }
}
