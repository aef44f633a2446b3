//! Bounded-capacity per-column anomaly index (§4.6).
//!
//! Four ascending row-index lists per column (missing, pii, outlier,
//! format). Insertion is O(1) append since row indices only increase within
//! a session; once a list is full, further hits are counted but not stored.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnomalyClass {
    Missing,
    Pii,
    Outlier,
    Format,
}

#[derive(Debug, Clone)]
pub struct AnomalyList {
    cap: usize,
    indices: Vec<u64>,
    total_hits: u64,
}

impl AnomalyList {
    fn new(cap: usize) -> Self {
        Self {
            cap,
            indices: Vec::new(),
            total_hits: 0,
        }
    }

    fn record(&mut self, row_index: u64) {
        self.total_hits += 1;
        if self.indices.len() < self.cap {
            self.indices.push(row_index);
        }
    }

    pub fn stored(&self) -> &[u64] {
        &self.indices
    }

    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }
}

#[derive(Debug, Clone)]
pub struct AnomalyIndex {
    cap: usize,
    missing: AnomalyList,
    pii: AnomalyList,
    outlier: AnomalyList,
    format: AnomalyList,
}

impl AnomalyIndex {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            missing: AnomalyList::new(cap),
            pii: AnomalyList::new(cap),
            outlier: AnomalyList::new(cap),
            format: AnomalyList::new(cap),
        }
    }

    pub fn record(&mut self, class: AnomalyClass, row_index: u64) {
        match class {
            AnomalyClass::Missing => self.missing.record(row_index),
            AnomalyClass::Pii => self.pii.record(row_index),
            AnomalyClass::Outlier => self.outlier.record(row_index),
            AnomalyClass::Format => self.format.record(row_index),
        }
    }

    pub fn list(&self, class: AnomalyClass) -> &AnomalyList {
        match class {
            AnomalyClass::Missing => &self.missing,
            AnomalyClass::Pii => &self.pii,
            AnomalyClass::Outlier => &self.outlier,
            AnomalyClass::Format => &self.format,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}

/// Default anomaly cap per §4.9: 10% of rows or 100k, whichever smaller.
/// `total_rows` may be unknown up-front (streaming), so the Session
/// Controller recomputes this once at finalize time and the index is sized
/// generously (`anomaly_cap` config, default 100_000) during ingestion.
pub fn anomaly_cap_for(total_rows: u64, configured_cap: usize) -> usize {
    let ten_percent = (total_rows / 10).max(1) as usize;
    configured_cap.min(ten_percent).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_storage_but_keeps_counting() {
        let mut idx = AnomalyIndex::new(3);
        for row in 1..=10u64 {
            idx.record(AnomalyClass::Missing, row);
        }
        let list = idx.list(AnomalyClass::Missing);
        assert_eq!(list.stored(), &[1, 2, 3]);
        assert_eq!(list.total_hits(), 10);
    }

    #[test]
    fn e4_pii_indices_are_one_based() {
        let mut idx = AnomalyIndex::new(100_000);
        // contact = ["a@b.com","c@d.org","not-an-email"], rows 1 and 2 match.
        idx.record(AnomalyClass::Pii, 1);
        idx.record(AnomalyClass::Pii, 2);
        assert_eq!(idx.list(AnomalyClass::Pii).stored(), &[1, 2]);
    }

    #[test]
    fn cap_is_ten_percent_of_rows_or_configured_whichever_smaller() {
        assert_eq!(anomaly_cap_for(1_000_000, 100_000), 100_000);
        assert_eq!(anomaly_cap_for(1_000, 100_000), 100);
    }
}
