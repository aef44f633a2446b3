//! Frozen profile data model (§3) and the Profile Builder (§4.7).

use crate::engine::accumulators::ColumnAccumulator;
use crate::engine::type_inference::InferredType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BaseStats {
    pub count: u64,
    pub missing: u64,
    pub distinct_estimate: u64,
    pub inferred_type: InferredType,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub count: u64,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TopValue {
    pub value: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CategoricalStats {
    pub top_values: Vec<TopValue>,
    pub unique_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    pub min: f64,
    pub max: f64,
    pub bin_width: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AnomalyIndices {
    pub missing: Vec<u64>,
    pub missing_total: u64,
    pub pii: Vec<u64>,
    pub pii_total: u64,
    pub outlier: Vec<u64>,
    pub outlier_total: u64,
    pub format: Vec<u64>,
    pub format_total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ColumnProfile {
    pub name: String,
    pub inferred_type: InferredType,
    pub base_stats: BaseStats,
    pub numeric_stats: Option<NumericStats>,
    pub categorical_stats: Option<CategoricalStats>,
    pub histogram: Option<Histogram>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub notes: Vec<String>,
    pub anomaly_indices: AnomalyIndices,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Diagnostics {
    pub malformed_rows: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ProfileResult {
    pub total_rows: u64,
    pub column_profiles: Vec<ColumnProfile>,
    pub diagnostics: Diagnostics,
}

/// Sturges' rule, clamped to [10, 50] per spec.
fn histogram_bin_count(n: u64) -> usize {
    if n == 0 {
        return 10;
    }
    let raw = ((n as f64).log2().ceil() as i64) + 1;
    raw.clamp(10, 50) as usize
}

/// Reconstruct an equi-width histogram from the t-digest CDF without a
/// second pass over the data (§4.5 Histogram bullet).
pub fn build_histogram(
    acc: &mut ColumnAccumulator,
    min: f64,
    max: f64,
    numeric_count: u64,
) -> Option<Histogram> {
    if numeric_count == 0 || min >= max {
        return None;
    }
    acc.quantiles().finalize();
    let bins_n = histogram_bin_count(numeric_count);
    let bin_width = (max - min) / bins_n as f64;
    if !bin_width.is_finite() || bin_width <= 0.0 {
        return None;
    }

    let mut bins = Vec::with_capacity(bins_n);
    let mut prev_cdf = 0.0f64;
    let mut assigned: u64 = 0;
    for i in 0..bins_n {
        let start = min + bin_width * i as f64;
        let end = if i + 1 == bins_n { max } else { min + bin_width * (i + 1) as f64 };
        let cdf_end = if i + 1 == bins_n {
            1.0
        } else {
            acc.quantiles().cdf(end)
        };
        let mut count = ((cdf_end - prev_cdf) * numeric_count as f64).round() as i64;
        if count < 0 {
            count = 0;
        }
        assigned += count as u64;
        bins.push(HistogramBin {
            start,
            end,
            count: count as u64,
        });
        prev_cdf = cdf_end;
    }

    // Reconcile rounding drift against the last bin so Σcount == numeric_count exactly.
    if let Some(last) = bins.last_mut() {
        let diff = numeric_count as i64 - assigned as i64;
        let adjusted = last.count as i64 + diff;
        last.count = adjusted.max(0) as u64;
    }

    Some(Histogram {
        bins,
        min,
        max,
        bin_width,
    })
}

/// Finalize one column's accumulator into a frozen [`ColumnProfile`].
/// Does not mutate persistent counters other than flushing the internal
/// t-digest buffer (read-only from the caller's perspective).
pub fn build_column_profile(
    acc: &mut ColumnAccumulator,
    anomalies: &crate::engine::anomaly::AnomalyIndex,
    cardinality_budget: u64,
) -> ColumnProfile {
    use crate::engine::anomaly::AnomalyClass;

    let inferred_type = acc.inferred_type();
    let distinct_estimate = acc.distinct_estimate();
    let count = acc.count();
    let missing = acc.missing();

    let numeric_stats = if matches!(
        inferred_type,
        InferredType::Integer | InferredType::Numeric
    ) && acc.moments().count() > 0
    {
        acc.quantiles().finalize();
        let moments = acc.moments().clone();
        Some(NumericStats {
            min: moments.min().unwrap_or(f64::NAN),
            max: moments.max().unwrap_or(f64::NAN),
            sum: moments.sum(),
            count: moments.count(),
            mean: moments.mean(),
            variance: moments.sample_variance(),
            std_dev: moments.sample_std_dev(),
            skewness: moments.skewness(),
            kurtosis: moments.kurtosis(),
            median: acc.quantiles().median(),
            p25: acc.quantiles().quantile(0.25),
            p75: acc.quantiles().quantile(0.75),
            p90: acc.quantiles().quantile(0.90),
            p95: acc.quantiles().quantile(0.95),
            p99: acc.quantiles().quantile(0.99),
        })
    } else {
        None
    };

    let histogram = numeric_stats.as_ref().and_then(|ns| {
        if ns.min < ns.max {
            build_histogram(acc, ns.min, ns.max, ns.count)
        } else {
            None
        }
    });

    let categorical_stats = if matches!(inferred_type, InferredType::String | InferredType::Boolean)
        && distinct_estimate <= cardinality_budget
    {
        let top = acc.topk().top_values(count);
        let total = count.max(1) as f64;
        let top_values = top
            .into_iter()
            .take(10)
            .map(|(bytes, c)| TopValue {
                value: String::from_utf8_lossy(&bytes).into_owned(),
                count: c,
                percentage: (c as f64 / total) * 100.0,
            })
            .collect();
        Some(CategoricalStats {
            top_values,
            unique_count: distinct_estimate,
        })
    } else {
        None
    };

    let mut notes: Vec<String> = acc.notes().iter().map(|s| s.to_string()).collect();
    for n in acc.pii_notes() {
        notes.push(n.to_string());
    }

    let (min_length, max_length) = acc
        .length_bounds()
        .map(|(lo, hi)| (Some(lo), Some(hi)))
        .unwrap_or((None, None));

    let anomaly_indices = AnomalyIndices {
        missing: anomalies.list(AnomalyClass::Missing).stored().to_vec(),
        missing_total: anomalies.list(AnomalyClass::Missing).total_hits(),
        pii: anomalies.list(AnomalyClass::Pii).stored().to_vec(),
        pii_total: anomalies.list(AnomalyClass::Pii).total_hits(),
        outlier: anomalies.list(AnomalyClass::Outlier).stored().to_vec(),
        outlier_total: anomalies.list(AnomalyClass::Outlier).total_hits(),
        format: anomalies.list(AnomalyClass::Format).stored().to_vec(),
        format_total: anomalies.list(AnomalyClass::Format).total_hits(),
    };

    ColumnProfile {
        name: acc.name.clone(),
        inferred_type,
        base_stats: BaseStats {
            count,
            missing,
            distinct_estimate,
            inferred_type,
        },
        numeric_stats,
        categorical_stats,
        histogram,
        min_length,
        max_length,
        notes,
        anomaly_indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_bin_count_is_clamped() {
        assert_eq!(histogram_bin_count(0), 10);
        assert_eq!(histogram_bin_count(4), 10);
        assert_eq!(histogram_bin_count(u64::MAX), 50);
    }

    #[test]
    fn histogram_conserves_total_count() {
        let mut acc = ColumnAccumulator::new("x".into(), 14, 500.0);
        let mut anomalies = crate::engine::anomaly::AnomalyIndex::new(1000);
        for i in 0..1000u64 {
            acc.observe(
                &crate::engine::value::RawField::Float(i as f64),
                i + 1,
                &mut anomalies,
            );
        }
        let hist = build_histogram(&mut acc, 0.0, 999.0, 1000).unwrap();
        let total: u64 = hist.bins.iter().map(|b| b.count).sum();
        assert_eq!(total, 1000);
        assert_eq!(hist.bins.first().unwrap().start, 0.0);
        assert_eq!(hist.bins.last().unwrap().end, 999.0);
    }
}
