//! Top-level integration coverage for the streaming profiling engine's
//! literal E1–E6 scenarios and the chunking-invariance property (§8).

use stats_rs::engine::comparison;
use stats_rs::engine::config::SessionConfig;
use stats_rs::engine::session::Session;
use stats_rs::engine::type_inference::InferredType;

fn run(csv: &[u8]) -> stats_rs::engine::profile::ProfileResult {
    let mut session = Session::init(SessionConfig::default(), Some("f.csv".into()));
    session.process_chunk(csv).unwrap();
    session.finalize().unwrap()
}

/// E1: numeric column with a blank-line null. count=4, mean=25, std≈12.91.
#[test]
fn e1_numeric_column_with_null() {
    let profile = run(b"price\n10\n20\n\n30\n40\n");
    let price = &profile.column_profiles[0];
    assert_eq!(price.base_stats.count, 4);
    assert_eq!(price.base_stats.missing, 1);
    let stats = price.numeric_stats.as_ref().expect("numeric column");
    assert!((stats.mean - 25.0).abs() < 1e-9);
    assert!((stats.std_dev - 12.909944487358056).abs() < 1e-6);
}

/// E2: string column with a repeated value and a null. count=4, two distinct
/// repeats collapse correctly into categorical top-values.
#[test]
fn e2_string_column_with_repeats_and_null() {
    let profile = run(b"name\nAlice\nBob\n\nAlice\nCarol\n");
    let name = &profile.column_profiles[0];
    assert_eq!(name.base_stats.count, 4);
    assert_eq!(name.base_stats.missing, 1);
    assert_eq!(name.inferred_type, InferredType::String);
    let cat = name.categorical_stats.as_ref().expect("categorical column");
    let alice = cat.top_values.iter().find(|v| v.value == "Alice").unwrap();
    assert_eq!(alice.count, 2);
}

/// E3: a column that starts numeric then sees a non-numeric exception stays
/// `String` (not `Mixed`) per the literal scenario, with the "mixed types"
/// note recorded exactly once.
#[test]
fn e3_mixed_type_column_notes_once() {
    let profile = run(b"code\n10\n20\nN/A\n30\n");
    let code = &profile.column_profiles[0];
    assert_eq!(code.inferred_type, InferredType::String);
    let mixed_notes = code.notes.iter().filter(|n| n.contains("mixed types")).count();
    assert_eq!(mixed_notes, 1);
}

/// E4: a column of email-shaped strings is flagged with a PII note and the
/// matching row indices land in the `pii` anomaly bucket.
#[test]
fn e4_pii_email_column() {
    let profile = run(b"contact\na@b.com\nc@d.org\nnot-an-email\n");
    let contact = &profile.column_profiles[0];
    assert!(contact.notes.iter().any(|n| n.contains("PII")));
    assert_eq!(contact.anomaly_indices.pii, vec![1, 2]);
}

/// E5: baseline has {a: Integer, b: Numeric}; candidate has {a: Integer,
/// c: String}. Expect b -> removed, c -> added, a -> unchanged.
#[test]
fn e5_pairwise_diff() {
    let baseline = run(b"a,b\n1,2.5\n2,3.5\n3,4.5\n");
    let candidate = run(b"a,c\n1,x\n2,y\n3,z\n");
    let result = comparison::compare(&baseline, &candidate);

    let kind_of = |name: &str| {
        result
            .diffs
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.kind)
            .unwrap()
    };
    assert_eq!(kind_of("b"), comparison::DiffKind::Removed);
    assert_eq!(kind_of("c"), comparison::DiffKind::Added);
    assert_eq!(kind_of("a"), comparison::DiffKind::Unchanged);

    // Order: removed, then added, then modified, then unchanged.
    let positions: Vec<&str> = result.diffs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(positions, vec!["b", "c", "a"]);
}

/// E6: two profiles of the same schema with count=100/mean=10/var=4 and
/// count=100/mean=20/var=4. Pooled: count=200, mean=15,
/// var=(100*4+100*4+100*25+100*25)/200=29.
#[test]
fn e6_pooled_merge() {
    // Sample variance (n-1 denominator) of an alternating ±d-around-`center`
    // sequence of length n is n*d^2/(n-1); solving for d with n=100 and a
    // target sample variance of exactly 4 gives d = sqrt(3.96).
    fn alternating_column_csv(center: f64, n: usize) -> Vec<u8> {
        let d = 3.96f64.sqrt();
        let mut s = String::from("x\n");
        for i in 0..n {
            let v = if i % 2 == 0 { center - d } else { center + d };
            s.push_str(&format!("{v:.12}\n"));
        }
        s.into_bytes()
    }

    let a = run(&alternating_column_csv(10.0, 100));
    let b = run(&alternating_column_csv(20.0, 100));

    let merged = comparison::pooled_merge(&[("a".to_string(), a), ("b".to_string(), b)]);
    let x = merged.columns.iter().find(|c| c.name == "x").unwrap();
    assert_eq!(x.count, 200);
    assert!((x.mean.unwrap() - 15.0).abs() < 1e-6, "mean was {:?}", x.mean);
    assert!(
        (x.variance.unwrap() - 29.0).abs() < 1e-6,
        "variance was {:?}",
        x.variance
    );
}

/// Property: re-chunking the exact same bytes down to one byte per
/// `process_chunk` call never changes the resulting profile.
#[test]
fn property_chunking_invariance() {
    let data = b"a,b,c\n1,2.5,x\n2,3.5,y\n3,4.5,z\n4,5.5,w\n5,6.5,v\n".to_vec();

    let mut whole = Session::init(SessionConfig::default(), Some("f.csv".into()));
    whole.process_chunk(&data).unwrap();
    let whole_profile = whole.finalize().unwrap();

    let mut chunked = Session::init(SessionConfig::default(), Some("f.csv".into()));
    for byte in &data {
        chunked.process_chunk(&[*byte]).unwrap();
    }
    let chunked_profile = chunked.finalize().unwrap();

    assert_eq!(whole_profile.total_rows, chunked_profile.total_rows);
    assert_eq!(whole_profile.column_profiles.len(), chunked_profile.column_profiles.len());
    for (wc, cc) in whole_profile.column_profiles.iter().zip(chunked_profile.column_profiles.iter()) {
        assert_eq!(wc.name, cc.name);
        assert_eq!(wc.base_stats.count, cc.base_stats.count);
        assert_eq!(wc.inferred_type, cc.inferred_type);
        if let (Some(wn), Some(cn)) = (&wc.numeric_stats, &cc.numeric_stats) {
            assert!((wn.mean - cn.mean).abs() < 1e-9);
            assert!((wn.std_dev - cn.std_dev).abs() < 1e-9);
        }
    }
}

/// Property: histogram bin counts always sum to the numeric count (§8
/// property 4), on an input large enough to trigger the clamped upper bound.
#[test]
fn property_histogram_conservation() {
    let mut csv = String::from("v\n");
    for i in 0..5000i64 {
        csv.push_str(&i.to_string());
        csv.push('\n');
    }
    let profile = run(csv.as_bytes());
    let v = &profile.column_profiles[0];
    let hist = v.histogram.as_ref().expect("numeric histogram");
    let total: u64 = hist.bins.iter().map(|b| b.count).sum();
    assert_eq!(total, v.numeric_stats.as_ref().unwrap().count);
}

/// Schema merge: identical schemas are compatible; a type change and a
/// dropped column are both reported.
#[test]
fn schema_merge_detects_type_change_and_removal() {
    let baseline = run(b"a,b\n1,2\n2,3\n");
    let changed = run(b"a\nx\ny\n");
    let result = comparison::merge_schemas(&[baseline, changed]);
    assert!(!result.compatible);
    assert!(result
        .diffs
        .iter()
        .any(|d| d.column == "b" && d.kind == comparison::SchemaDiffKind::Removed));
    assert!(result
        .diffs
        .iter()
        .any(|d| d.column == "a" && d.kind == comparison::SchemaDiffKind::TypeChanged));
}
