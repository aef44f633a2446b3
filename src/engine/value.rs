//! The tagged value variant that crosses the extractor/accumulator boundary.
//!
//! Every record extractor, regardless of source format, emits values in this
//! shape so the rest of the engine never performs stringly-typed dispatch.

/// A single cell value as produced by a [`crate::engine::extractor`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawField {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
}

impl RawField {
    pub fn is_null(&self) -> bool {
        matches!(self, RawField::Null)
    }

    /// Best-effort UTF-8 view for type inference and hashing. Numeric and
    /// boolean variants are rendered in their canonical textual form so that
    /// a value seen as `RawField::Int(1)` from Parquet and `"1"` from CSV
    /// hash identically for cardinality purposes.
    pub fn as_text(&self) -> Option<std::borrow::Cow<'_, str>> {
        match self {
            RawField::Null => None,
            RawField::Bool(b) => Some(std::borrow::Cow::Borrowed(if *b { "true" } else { "false" })),
            RawField::Int(i) => Some(std::borrow::Cow::Owned(i.to_string())),
            RawField::Float(f) => Some(std::borrow::Cow::Owned(format!("{f}"))),
            RawField::Bytes(b) => std::str::from_utf8(b).ok().map(std::borrow::Cow::Borrowed),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawField::Int(i) => Some(*i as f64),
            RawField::Float(f) => Some(*f),
            RawField::Bytes(b) => std::str::from_utf8(b).ok()?.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Character length used for the String-column length bounds; `None` for
    /// non-textual variants (they never reach the String accumulator path).
    pub fn char_len(&self) -> Option<usize> {
        self.as_text().map(|s| s.chars().count())
    }
}

/// A single `(row, column, value)` event produced by a record extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEvent {
    pub row_index: u64,
    pub column_id: u32,
    pub value: RawField,
}
