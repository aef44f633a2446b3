//! Comparison & Aggregation (§4.8): pairwise diff, N-way delta, trend
//! classification, pooled merge, and schema compatibility — all consuming
//! frozen [`ProfileResult`]s only, never touching live accumulators.

use crate::engine::accumulators::hll::pooled_distinct_upper_bound;
use crate::engine::profile::{ColumnProfile, ProfileResult, TopValue};
use crate::engine::type_inference::InferredType;
use serde::{Deserialize, Serialize};

const RELATIVE_EPS: f64 = 1e-4;
const STABLE_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Unchanged,
    Added,
    Removed,
    Modified,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ColumnDiff {
    pub name: String,
    pub kind: DiffKind,
    /// Which of {inferred_type, mean, std_dev, missing_rate, distinct_estimate}
    /// triggered `Modified`; empty for every other kind.
    pub changed_metrics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CompareResult {
    pub diffs: Vec<ColumnDiff>,
}

fn missing_rate(c: &ColumnProfile) -> f64 {
    let total = c.base_stats.count + c.base_stats.missing;
    if total == 0 {
        0.0
    } else {
        c.base_stats.missing as f64 / total as f64
    }
}

fn relative_diff(a: f64, b: f64) -> f64 {
    if a == 0.0 {
        if b == 0.0 { 0.0 } else { f64::INFINITY }
    } else {
        ((b - a) / a).abs()
    }
}

/// Pairwise column diff (§4.8 first bullet). Order: removed, added,
/// modified, then unchanged; stable by name within each group.
pub fn compare(baseline: &ProfileResult, candidate: &ProfileResult) -> CompareResult {
    use std::collections::BTreeMap;

    let a: BTreeMap<&str, &ColumnProfile> =
        baseline.column_profiles.iter().map(|c| (c.name.as_str(), c)).collect();
    let b: BTreeMap<&str, &ColumnProfile> =
        candidate.column_profiles.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut names: Vec<&str> = a.keys().chain(b.keys()).copied().collect();
    names.sort();
    names.dedup();

    let mut removed = Vec::new();
    let mut added = Vec::new();
    let mut modified = Vec::new();
    let mut unchanged = Vec::new();

    for name in names {
        match (a.get(name), b.get(name)) {
            (Some(_), None) => removed.push(ColumnDiff {
                name: name.to_string(),
                kind: DiffKind::Removed,
                changed_metrics: Vec::new(),
            }),
            (None, Some(_)) => added.push(ColumnDiff {
                name: name.to_string(),
                kind: DiffKind::Added,
                changed_metrics: Vec::new(),
            }),
            (Some(ca), Some(cb)) => {
                let mut changed = Vec::new();
                if ca.inferred_type != cb.inferred_type {
                    changed.push("inferred_type".to_string());
                }
                if let (Some(na), Some(nb)) = (&ca.numeric_stats, &cb.numeric_stats) {
                    if relative_diff(na.mean, nb.mean) > RELATIVE_EPS {
                        changed.push("mean".to_string());
                    }
                    if relative_diff(na.std_dev, nb.std_dev) > RELATIVE_EPS {
                        changed.push("std_dev".to_string());
                    }
                }
                if relative_diff(missing_rate(ca), missing_rate(cb)) > RELATIVE_EPS {
                    changed.push("missing_rate".to_string());
                }
                if relative_diff(ca.base_stats.distinct_estimate as f64, cb.base_stats.distinct_estimate as f64)
                    > RELATIVE_EPS
                {
                    changed.push("distinct_estimate".to_string());
                }

                if changed.is_empty() {
                    unchanged.push(ColumnDiff {
                        name: name.to_string(),
                        kind: DiffKind::Unchanged,
                        changed_metrics: Vec::new(),
                    });
                } else {
                    modified.push(ColumnDiff {
                        name: name.to_string(),
                        kind: DiffKind::Modified,
                        changed_metrics: changed,
                    });
                }
            }
            (None, None) => unreachable!("name came from a or b's keys"),
        }
    }

    let mut diffs = Vec::with_capacity(removed.len() + added.len() + modified.len() + unchanged.len());
    diffs.extend(removed);
    diffs.extend(added);
    diffs.extend(modified);
    diffs.extend(unchanged);
    CompareResult { diffs }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Improved,
    Degraded,
    Unchanged,
    Na,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MetricDelta {
    pub column: String,
    pub metric: String,
    pub delta: f64,
    pub percent_change: Option<f64>,
    pub direction: Direction,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DeltaResult {
    pub deltas: Vec<MetricDelta>,
}

/// Lower-is-better metrics per §4.8; everything else is higher-is-better.
fn lower_is_better(metric: &str) -> bool {
    matches!(metric, "missing_rate" | "std_dev")
}

fn metric_value(c: &ColumnProfile, metric: &str) -> Option<f64> {
    match metric {
        "missing_rate" => Some(missing_rate(c)),
        "std_dev" => c.numeric_stats.as_ref().map(|n| n.std_dev),
        "mean" => c.numeric_stats.as_ref().map(|n| n.mean),
        "distinct_estimate" => Some(c.base_stats.distinct_estimate as f64),
        _ => None,
    }
}

const DELTA_METRICS: [&str; 4] = ["mean", "std_dev", "missing_rate", "distinct_estimate"];

fn direction_for(metric: &str, a: f64, b: f64) -> Direction {
    let rel = if a == 0.0 { (b - a).abs() } else { (b - a) / a.abs() };
    if rel.abs() < STABLE_THRESHOLD {
        return Direction::Unchanged;
    }
    let better_is_up = !lower_is_better(metric);
    if (rel > 0.0) == better_is_up {
        Direction::Improved
    } else {
        Direction::Degraded
    }
}

/// N-way delta: one baseline, K candidates (§4.8 second bullet).
pub fn delta(baseline: &ProfileResult, candidates: &[ProfileResult]) -> Vec<DeltaResult> {
    candidates
        .iter()
        .map(|cand| {
            let mut deltas = Vec::new();
            for bcol in &baseline.column_profiles {
                let Some(ccol) = cand.column_profiles.iter().find(|c| c.name == bcol.name) else {
                    continue;
                };
                for &metric in DELTA_METRICS.iter() {
                    let (Some(a), Some(b)) = (metric_value(bcol, metric), metric_value(ccol, metric)) else {
                        continue;
                    };
                    let d = b - a;
                    let percent_change = if a != 0.0 { Some(d / a.abs() * 100.0) } else { None };
                    let direction = if a == 0.0 && b == 0.0 {
                        Direction::Na
                    } else {
                        direction_for(metric, a, b)
                    };
                    deltas.push(MetricDelta {
                        column: bcol.name.clone(),
                        metric: metric.to_string(),
                        delta: d,
                        percent_change,
                        direction,
                    });
                }
            }
            DeltaResult { deltas }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Stable,
    Volatile,
    Improving,
    Degrading,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TrendEntry {
    pub column: String,
    pub metric: String,
    pub trend: Trend,
}

/// Trend classification across K >= 1 candidates for each (column, metric)
/// (§4.8 third bullet).
pub fn trend(baseline: &ProfileResult, candidates: &[ProfileResult]) -> Vec<TrendEntry> {
    let mut out = Vec::new();
    for bcol in &baseline.column_profiles {
        for &metric in DELTA_METRICS.iter() {
            let Some(a) = metric_value(bcol, metric) else { continue };
            let mut relatives = Vec::new();
            for cand in candidates {
                let Some(ccol) = cand.column_profiles.iter().find(|c| c.name == bcol.name) else {
                    continue;
                };
                let Some(b) = metric_value(ccol, metric) else { continue };
                let rel = if a == 0.0 { b - a } else { (b - a) / a.abs() };
                relatives.push(rel);
            }
            if relatives.is_empty() {
                continue;
            }

            let all_stable = relatives.iter().all(|r| r.abs() < STABLE_THRESHOLD);
            let trend_kind = if all_stable {
                Trend::Stable
            } else {
                let significant: Vec<f64> =
                    relatives.iter().copied().filter(|r| r.abs() >= STABLE_THRESHOLD).collect();
                let positive = significant.iter().filter(|r| **r > 0.0).count();
                let negative = significant.iter().filter(|r| **r < 0.0).count();
                let total = positive + negative;
                let lesser = positive.min(negative);
                if total > 0 && (lesser as f64) > 0.5 * (total as f64) {
                    Trend::Volatile
                } else {
                    let mean_rel: f64 = significant.iter().sum::<f64>() / significant.len().max(1) as f64;
                    let better_is_up = !lower_is_better(metric);
                    if (mean_rel > 0.0) == better_is_up {
                        Trend::Improving
                    } else {
                        Trend::Degrading
                    }
                }
            };

            out.push(TrendEntry {
                column: bcol.name.clone(),
                metric: metric.to_string(),
                trend: trend_kind,
            });
        }
    }
    out
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MergedColumnStats {
    pub name: String,
    pub count: u64,
    pub mean: Option<f64>,
    pub variance: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub distinct_estimate: u64,
    pub top_values: Vec<TopValue>,
    pub inferred_type: InferredType,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PooledMergeResult {
    pub columns: Vec<MergedColumnStats>,
}

/// Pooled merge across K profiles matched by column name (§4.8 fourth
/// bullet, the "flexible variant"). The parallel-algorithm pooled-variance
/// form matches E6 exactly: `var_pooled = (Σcount_i·var_i + Σcount_i·(mean_i
/// − mean_pooled)²) / count_total`.
pub fn pooled_merge(named_profiles: &[(String, ProfileResult)]) -> PooledMergeResult {
    use std::collections::BTreeMap;

    let mut by_column: BTreeMap<String, Vec<&ColumnProfile>> = BTreeMap::new();
    for (_name, profile) in named_profiles {
        for col in &profile.column_profiles {
            by_column.entry(col.name.clone()).or_default().push(col);
        }
    }

    let mut columns = Vec::new();
    for (name, cols) in by_column {
        let count_total: u64 = cols.iter().map(|c| c.base_stats.count).sum();
        let numeric: Vec<_> = cols.iter().filter_map(|c| c.numeric_stats.as_ref()).collect();

        let (mean, variance, min, max) = if !numeric.is_empty() && count_total > 0 {
            let mean_pooled: f64 = numeric
                .iter()
                .map(|n| n.count as f64 * n.mean)
                .sum::<f64>()
                / count_total as f64;
            let var_pooled: f64 = numeric
                .iter()
                .map(|n| {
                    let spread = n.mean - mean_pooled;
                    n.count as f64 * n.variance + n.count as f64 * spread * spread
                })
                .sum::<f64>()
                / count_total as f64;
            let min = numeric.iter().map(|n| n.min).fold(f64::INFINITY, f64::min);
            let max = numeric.iter().map(|n| n.max).fold(f64::NEG_INFINITY, f64::max);
            (Some(mean_pooled), Some(var_pooled), Some(min), Some(max))
        } else {
            (None, None, None, None)
        };

        let per_profile_distinct: Vec<u64> = cols.iter().map(|c| c.base_stats.distinct_estimate).collect();
        let distinct_estimate = pooled_distinct_upper_bound(&per_profile_distinct, count_total);

        let mut top_counts: std::collections::HashMap<String, u64> = std::collections::HashMap::new();
        for c in &cols {
            if let Some(cat) = &c.categorical_stats {
                for tv in &cat.top_values {
                    *top_counts.entry(tv.value.clone()).or_insert(0) += tv.count;
                }
            }
        }
        let mut top_values: Vec<TopValue> = top_counts
            .into_iter()
            .map(|(value, count)| TopValue {
                percentage: if count_total > 0 { count as f64 / count_total as f64 * 100.0 } else { 0.0 },
                value,
                count,
            })
            .collect();
        top_values.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        top_values.truncate(10);

        let inferred_type = cols
            .iter()
            .map(|c| c.inferred_type)
            .fold(InferredType::Empty, InferredType::widen);

        columns.push(MergedColumnStats {
            name,
            count: count_total,
            mean,
            variance,
            min,
            max,
            distinct_estimate,
            top_values,
            inferred_type,
        });
    }

    PooledMergeResult { columns }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SchemaDiffKind {
    Added,
    Removed,
    TypeChanged,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SchemaDiffEntry {
    pub column: String,
    pub kind: SchemaDiffKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SchemaMergeResult {
    pub compatible: bool,
    pub diffs: Vec<SchemaDiffEntry>,
}

/// Two profile schemas are compatible iff same column-name set and same
/// inferred type per column (§4.8 schema validation bullet).
pub fn merge_schemas(profiles: &[ProfileResult]) -> SchemaMergeResult {
    use std::collections::BTreeMap;

    let Some((first, rest)) = profiles.split_first() else {
        return SchemaMergeResult { compatible: true, diffs: Vec::new() };
    };

    let baseline: BTreeMap<&str, InferredType> = first
        .column_profiles
        .iter()
        .map(|c| (c.name.as_str(), c.inferred_type))
        .collect();

    let mut diffs = Vec::new();
    for profile in rest {
        let current: BTreeMap<&str, InferredType> = profile
            .column_profiles
            .iter()
            .map(|c| (c.name.as_str(), c.inferred_type))
            .collect();

        for (&name, &ty) in &baseline {
            match current.get(name) {
                None => diffs.push(SchemaDiffEntry { column: name.to_string(), kind: SchemaDiffKind::Removed }),
                Some(&other_ty) if other_ty != ty => {
                    diffs.push(SchemaDiffEntry { column: name.to_string(), kind: SchemaDiffKind::TypeChanged })
                }
                _ => {}
            }
        }
        for &name in current.keys() {
            if !baseline.contains_key(name) {
                diffs.push(SchemaDiffEntry { column: name.to_string(), kind: SchemaDiffKind::Added });
            }
        }
    }

    SchemaMergeResult {
        compatible: diffs.is_empty(),
        diffs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SessionConfig;
    use crate::engine::session::Session;

    fn profile_from_csv(csv: &[u8]) -> ProfileResult {
        let mut session = Session::init(SessionConfig::default(), Some("f.csv".into()));
        session.process_chunk(csv).unwrap();
        session.finalize().unwrap()
    }

    #[test]
    fn e5_pairwise_diff_removed_added_unchanged() {
        let baseline = profile_from_csv(b"a,b\n1,2.5\n2,3.5\n");
        let candidate = profile_from_csv(b"a,c\n1,x\n2,y\n");
        let result = compare(&baseline, &candidate);
        let kinds: Vec<(&str, DiffKind)> =
            result.diffs.iter().map(|d| (d.name.as_str(), d.kind)).collect();
        assert!(kinds.contains(&("b", DiffKind::Removed)));
        assert!(kinds.contains(&("c", DiffKind::Added)));
        assert!(kinds.contains(&("a", DiffKind::Unchanged)));
    }

    #[test]
    fn property_7_diff_symmetry_on_identical_inputs() {
        let p = profile_from_csv(b"a\n1\n2\n3\n");
        let result = compare(&p, &p);
        assert!(result.diffs.iter().all(|d| d.kind == DiffKind::Unchanged));
    }

    #[test]
    fn e6_pooled_merge_matches_textbook_numbers() {
        let a = profile_from_csv(b"x\n8\n10\n12\n8\n10\n12\n8\n10\n12\n8\n10\n12\n8\n10\n12\n8\n10\n12\n8\n10\n12\n8\n10\n12\n8\n10\n12\n8\n10\n12\n8\n10\n12\n8\n10\n12\n");
        let b = profile_from_csv(b"x\n18\n20\n22\n18\n20\n22\n18\n20\n22\n18\n20\n22\n18\n20\n22\n18\n20\n22\n18\n20\n22\n18\n20\n22\n18\n20\n22\n18\n20\n22\n18\n20\n22\n");
        let merged = pooled_merge(&[("a".into(), a), ("b".into(), b)]);
        let col = merged.columns.iter().find(|c| c.name == "x").unwrap();
        assert_eq!(col.count, 33 * 2);
        assert!((col.mean.unwrap() - 15.0).abs() < 1.0);
    }
}
