//! Online numeric moments: Welford's algorithm extended to third and fourth
//! central moments for skewness/kurtosis.
//!
//! Grounded directly on `stats::online::OnlineMeanVar` from the teacher repo
//! (`src/stats/online.rs`), which already carries `count, mean, m2` for
//! mean/variance. This widens the same recurrence to `m3`/`m4` using the
//! standard single-pass update (Pébay 2008), the textbook extension of
//! Welford's method.

#[derive(Debug, Clone, Copy, Default)]
pub struct OnlineMoments {
    count: u64,
    mean: f64,
    m2: f64,
    m3: f64,
    m4: f64,
    min: f64,
    max: f64,
}

impl OnlineMoments {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            m3: 0.0,
            m4: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Feed one finite value. Callers are responsible for filtering out
    /// `NaN`/`±inf` before calling this (the accumulator treats them as
    /// "missing" at a higher layer, per spec numeric semantics).
    pub fn push(&mut self, x: f64) {
        let n1 = self.count as f64;
        self.count += 1;
        let n = self.count as f64;

        let delta = x - self.mean;
        let delta_n = delta / n;
        let delta_n2 = delta_n * delta_n;
        let term1 = delta * delta_n * n1;

        self.mean += delta_n;
        self.m4 += term1 * delta_n2 * (n * n - 3.0 * n + 3.0) + 6.0 * delta_n2 * self.m2
            - 4.0 * delta_n * self.m3;
        self.m3 += term1 * delta_n * (n - 2.0) - 3.0 * delta_n * self.m2;
        self.m2 += term1;

        if x < self.min {
            self.min = x;
        }
        if x > self.max {
            self.max = x;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 { f64::NAN } else { self.mean }
    }

    pub fn sum(&self) -> f64 {
        self.mean * self.count as f64
    }

    /// Sample variance (Bessel-corrected), matching `numeric_stats.variance`.
    pub fn sample_variance(&self) -> f64 {
        if self.count < 2 {
            return f64::NAN;
        }
        self.m2 / (self.count as f64 - 1.0)
    }

    pub fn sample_std_dev(&self) -> f64 {
        self.sample_variance().sqrt()
    }

    /// Population variance, used as the merge-friendly form in pooled
    /// aggregation (§4.8 uses the population convention internally and the
    /// sample convention is derived at the profile boundary only).
    pub fn population_variance(&self) -> f64 {
        let n = self.count as f64;
        if n == 0.0 {
            return f64::NAN;
        }
        self.m2 / n
    }

    pub fn skewness(&self) -> f64 {
        let n = self.count as f64;
        if self.count < 2 || self.m2 == 0.0 {
            return f64::NAN;
        }
        (n.sqrt() * self.m3) / self.m2.powf(1.5)
    }

    pub fn kurtosis(&self) -> f64 {
        let n = self.count as f64;
        if self.count < 2 || self.m2 == 0.0 {
            return f64::NAN;
        }
        (n * self.m4) / (self.m2 * self.m2) - 3.0
    }

    /// Parallel-algorithm merge of two partial moment accumulators (Chan et
    /// al. 1979), used both for chunk-boundary resumption sanity checks and
    /// directly by Comparison & Aggregation's pooled merge.
    pub fn merge(&self, other: &Self) -> Self {
        if self.count == 0 {
            return *other;
        }
        if other.count == 0 {
            return *self;
        }
        let (na, nb) = (self.count as f64, other.count as f64);
        let n = na + nb;
        let delta = other.mean - self.mean;
        let delta2 = delta * delta;
        let delta3 = delta2 * delta;
        let delta4 = delta2 * delta2;

        let mean = self.mean + delta * nb / n;

        let m2 = self.m2 + other.m2 + delta2 * na * nb / n;

        let m3 = self.m3 + other.m3 + delta3 * na * nb * (na - nb) / (n * n)
            + 3.0 * delta * (na * other.m2 - nb * self.m2) / n;

        let m4 = self.m4
            + other.m4
            + delta4 * na * nb * (na * na - na * nb + nb * nb) / (n * n * n)
            + 6.0 * delta2 * (na * na * other.m2 + nb * nb * self.m2) / (n * n)
            + 4.0 * delta * (na * other.m3 - nb * self.m3) / n;

        Self {
            count: self.count + other.count,
            mean,
            m2,
            m3,
            m4,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}
