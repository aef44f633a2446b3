//! Session configuration surface (§4.9, expanded per SPEC_FULL §12).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FormatOverride {
    Csv,
    Tsv,
    JsonArray,
    JsonLines,
    Parquet,
    Xlsx,
    Avro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMode {
    Yes,
    No,
    Auto,
}

impl Default for HeaderMode {
    fn default() -> Self {
        HeaderMode::Auto
    }
}

fn default_size_limit() -> u64 {
    // 1 GiB; matches the teacher's generous-upload posture (it sets 25 MiB
    // for its DefaultBodyLimit), scaled up for the profiler's larger files.
    1024 * 1024 * 1024
}

fn default_cardinality_budget() -> u64 {
    10_000
}

fn default_anomaly_cap() -> usize {
    100_000
}

fn default_tdigest_compression() -> f64 {
    500.0
}

fn default_hll_precision() -> u8 {
    14
}

fn default_sheet() -> Option<String> {
    None
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SessionConfig {
    /// Explicit format override; `None` triggers auto-detection (§4.2).
    #[serde(default)]
    pub format: Option<FormatOverride>,

    /// Explicit delimiter byte for CSV/TSV-shaped input; `None` auto-detects.
    #[serde(default)]
    pub delimiter: Option<u8>,

    #[serde(default)]
    pub has_header: HeaderMode,

    /// Guardrail; exceeding this fails the session with `FileTooLarge`.
    #[serde(default = "default_size_limit")]
    pub size_limit_bytes: u64,

    /// Max distinct count at which `categorical_stats` is still emitted.
    #[serde(default = "default_cardinality_budget")]
    pub cardinality_budget: u64,

    /// Max row indices retained per anomaly class.
    #[serde(default = "default_anomaly_cap")]
    pub anomaly_cap: usize,

    /// t-digest compression factor (δ).
    #[serde(default = "default_tdigest_compression")]
    pub tdigest_compression: f64,

    /// HyperLogLog register-count exponent (2^p registers).
    #[serde(default = "default_hll_precision")]
    pub hll_precision: u8,

    /// Excel only: sheet name to process; `None` selects the first sheet.
    #[serde(default = "default_sheet")]
    pub sheet: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            format: None,
            delimiter: None,
            has_header: HeaderMode::default(),
            size_limit_bytes: default_size_limit(),
            cardinality_budget: default_cardinality_budget(),
            anomaly_cap: default_anomaly_cap(),
            tdigest_compression: default_tdigest_compression(),
            hll_precision: default_hll_precision(),
            sheet: default_sheet(),
        }
    }
}
