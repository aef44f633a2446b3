//! Per-column sticky type inference.
//!
//! Grounded on the `FieldType`/`Commute` widening lattice in BurntSushi's xsv
//! `stats` command: a column's inferred type only ever widens as values
//! arrive, and two columns' types combine via a `merge` that picks the least
//! upper bound. This module extends that two-axis lattice (numeric vs.
//! string) with the full taxonomy the profiler needs: `Boolean`, `Date`, and
//! `DateTime` sit alongside `Integer`/`Numeric` before collapsing to `String`
//! and finally `Mixed`.

use jiff::civil::{Date, DateTime};

/// One node of the type-inference lattice. Variant order is NOT the widening
/// order — widening is encoded explicitly in [`InferredType::widen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub enum InferredType {
    /// No values observed yet.
    Empty,
    /// Every value observed so far was null/absent.
    Null,
    Boolean,
    Integer,
    Date,
    DateTime,
    /// Integer widened with a fractional value, or a bare float literal.
    Numeric,
    String,
    /// Sticky: once reached, never narrows again.
    Mixed,
}

impl Default for InferredType {
    fn default() -> Self {
        InferredType::Empty
    }
}

impl InferredType {
    /// Classify a single non-null textual value in isolation, without regard
    /// to any prior state. Parse order fixed per spec: Boolean -> Integer ->
    /// Numeric -> Date -> DateTime -> String.
    pub fn classify(text: &str) -> InferredType {
        if text.is_empty() {
            return InferredType::String; // "" is an empty *string*, not missing (see DESIGN.md open question).
        }
        if parses_as_bool(text) {
            return InferredType::Boolean;
        }
        if text.parse::<i64>().is_ok() {
            return InferredType::Integer;
        }
        if text.parse::<f64>().is_ok() {
            return InferredType::Numeric;
        }
        if text.len() == 10 && text.parse::<Date>().is_ok() {
            return InferredType::Date;
        }
        if text.parse::<DateTime>().is_ok() || jiff::Timestamp::from_str(text).is_ok() {
            return InferredType::DateTime;
        }
        InferredType::String
    }

    /// Widen `self` given a newly observed type. Transitions only ever move
    /// rightward/upward in the lattice; never back toward `Empty`/`Null`.
    pub fn widen(self, observed: InferredType) -> InferredType {
        use InferredType::*;
        match (self, observed) {
            (Mixed, _) => Mixed,
            (a, b) if a == b => a,
            (Empty, b) | (b, Empty) => b,
            (Null, b) | (b, Null) => b,
            (Integer, Numeric) | (Numeric, Integer) => Numeric,
            (Date, DateTime) | (DateTime, Date) => DateTime,
            // any numeric-ish/date-ish pairing that isn't a direct superset falls
            // through to String before giving up entirely to Mixed.
            (a, b) if is_scalar(a) && is_scalar(b) => Mixed,
            (a, b) if (a == String || is_scalar(a)) && (b == String || is_scalar(b)) => String,
            _ => Mixed,
        }
    }
}

fn is_scalar(t: InferredType) -> bool {
    matches!(
        t,
        InferredType::Boolean
            | InferredType::Integer
            | InferredType::Numeric
            | InferredType::Date
            | InferredType::DateTime
    )
}

fn parses_as_bool(text: &str) -> bool {
    matches!(
        text.to_ascii_lowercase().as_str(),
        "true" | "false" | "t" | "f"
    )
}

use std::str::FromStr;

/// Stateful per-column inferencer: a thin wrapper that tracks the current
/// lattice position and whether a "mixed types" note has already fired.
#[derive(Debug, Clone, Default)]
pub struct ColumnTypeInferencer {
    state: InferredType,
    mixed_note_emitted: bool,
}

impl ColumnTypeInferencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InferredType {
        self.state
    }

    /// Feed one non-null textual value; returns `true` the first time this
    /// column's type state becomes "noteworthy" (caller appends the
    /// `"mixed types"` note exactly once). Two situations qualify: reaching
    /// the sticky `Mixed` lattice state (incompatible scalar/scalar clash,
    /// e.g. `Boolean` vs. `Date`), or a numeric-ish column (`Integer`/
    /// `Numeric`) widening to `String` on a non-numeric exception value —
    /// per spec E3, that case keeps `inferred_type=String` rather than
    /// jumping to `Mixed`, but still needs the diagnostic note.
    pub fn observe_text(&mut self, text: &str) -> bool {
        let observed = InferredType::classify(text);
        let before = self.state;
        self.state = before.widen(observed);
        if self.mixed_note_emitted {
            return false;
        }
        let noteworthy = self.state == InferredType::Mixed
            || (matches!(before, InferredType::Integer | InferredType::Numeric)
                && self.state == InferredType::String);
        if noteworthy {
            self.mixed_note_emitted = true;
            true
        } else {
            false
        }
    }

    /// Fast path for extractors that already carry a typed value (Parquet,
    /// Avro, Excel cell types) — skips re-parsing, per the spec's "Excel
    /// cell-level types override re-inference" design note.
    pub fn observe_typed(&mut self, observed: InferredType) -> bool {
        let before = self.state;
        self.state = before.widen(observed);
        self.state == InferredType::Mixed && before != InferredType::Mixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_basics() {
        assert_eq!(InferredType::classify("true"), InferredType::Boolean);
        assert_eq!(InferredType::classify("42"), InferredType::Integer);
        assert_eq!(InferredType::classify("4.2"), InferredType::Numeric);
        assert_eq!(InferredType::classify("2024-01-05"), InferredType::Date);
        assert_eq!(InferredType::classify("hello"), InferredType::String);
    }

    #[test]
    fn e3_mixed_numeric_with_exception_widens_to_string() {
        // Literal E3: x = ["10","20","N/A","30"] -> inferred_type=String, not
        // Mixed. A scalar type widening past a String value lands on String
        // itself (String sits above Numeric in the lattice chain); Mixed is
        // reserved for genuinely incompatible scalar/scalar clashes (e.g.
        // Boolean vs. Date), never scalar-vs-String.
        let mut c = ColumnTypeInferencer::new();
        assert_eq!(c.state(), InferredType::Empty);
        c.observe_text("10");
        assert_eq!(c.state(), InferredType::Integer);
        c.observe_text("20");
        assert_eq!(c.state(), InferredType::Integer);
        c.observe_text("30.5");
        assert_eq!(c.state(), InferredType::Numeric);
        let fired = c.observe_text("N/A");
        assert!(fired);
        assert_eq!(c.state(), InferredType::String);
        // sticky: further numeric-looking values never narrow it back.
        c.observe_text("99");
        assert_eq!(c.state(), InferredType::String);
    }

    #[test]
    fn incompatible_scalars_widen_to_mixed() {
        let mut c = ColumnTypeInferencer::new();
        c.observe_text("true");
        assert_eq!(c.state(), InferredType::Boolean);
        let fired = c.observe_text("2024-01-05");
        assert!(fired);
        assert_eq!(c.state(), InferredType::Mixed);
    }

    #[test]
    fn integer_and_numeric_widen_without_becoming_mixed() {
        let mut c = ColumnTypeInferencer::new();
        c.observe_text("1");
        c.observe_text("2.5");
        assert_eq!(c.state(), InferredType::Numeric);
    }

    #[test]
    fn all_string_column_never_widens_past_string() {
        let mut c = ColumnTypeInferencer::new();
        c.observe_text("Alice");
        c.observe_text("Bob");
        assert_eq!(c.state(), InferredType::String);
    }

    #[test]
    fn empty_string_is_string_not_missing() {
        // "" counts as a non-missing empty string per the adopted open-question rule.
        assert_eq!(InferredType::classify(""), InferredType::String);
    }
}
