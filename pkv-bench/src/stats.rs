//! # Latency Statistics
//!
//! Collect per-iteration lookup latencies and reduce them to a summary with
//! percentiles and a coarse histogram.
//!
//! ## Design Principles
//! 1. **Accumulator Pattern**: `record` is a push plus one bucket increment.
//! 2. **Fixed Buckets**: Histogram bounds live in a small contiguous array.
//! 3. **Exact Percentiles**: Raw samples are kept, so percentiles are
//!    nearest-rank over the sorted samples rather than bucket estimates.

use std::time::Duration;

use serde::Serialize;

/// Default latency bucket boundaries in microseconds.
pub const DEFAULT_LATENCY_BUCKETS_US: [u64; 12] =
    [1, 2, 5, 10, 20, 50, 100, 200, 500, 1_000, 2_000, 5_000];

/// Fixed-bucket latency histogram.
///
/// Holds `bounds_us.len() + 1` buckets; the last one is the overflow bucket.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    bounds_us: Vec<u64>,
    buckets: Vec<u64>,
}

impl LatencyHistogram {
    /// `bounds_us` must be sorted ascending.
    pub fn new(bounds_us: Vec<u64>) -> Self {
        let buckets = vec![0; bounds_us.len() + 1];
        LatencyHistogram { bounds_us, buckets }
    }

    /// Counts `latency` in the first bucket whose bound is `>=` its micros.
    pub fn record(&mut self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        let idx = self.bounds_us.partition_point(|&bound| bound < micros);
        self.buckets[idx] += 1;
    }

    pub fn buckets(&self) -> Vec<BucketCount> {
        self.buckets
            .iter()
            .enumerate()
            .map(|(idx, &count)| BucketCount {
                le_us: self.bounds_us.get(idx).copied(),
                count,
            })
            .collect()
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY_BUCKETS_US.to_vec())
    }
}

/// One histogram bucket; `le_us == None` is the overflow bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub le_us: Option<u64>,
    pub count: u64,
}

/// Reduced view of one measurement variant.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LatencySummary {
    pub samples: u64,
    pub total_ns: u64,
    pub min_ns: u64,
    pub mean_ns: u64,
    pub p50_ns: u64,
    pub p90_ns: u64,
    pub p99_ns: u64,
    pub max_ns: u64,
    pub histogram: Vec<BucketCount>,
}

impl LatencySummary {
    pub fn total(&self) -> Duration {
        Duration::from_nanos(self.total_ns)
    }

    /// Operations per second over the summed latency; 0 when nothing ran.
    pub fn ops_per_sec(&self) -> f64 {
        if self.total_ns == 0 {
            return 0.0;
        }
        self.samples as f64 / self.total().as_secs_f64()
    }
}

/// Per-iteration latency collector.
#[derive(Debug, Clone, Default)]
pub struct LatencyRecorder {
    samples: Vec<u64>,
    histogram: LatencyHistogram,
}

impl LatencyRecorder {
    pub fn with_capacity(capacity: usize) -> Self {
        LatencyRecorder {
            samples: Vec::with_capacity(capacity),
            histogram: LatencyHistogram::default(),
        }
    }

    pub fn record(&mut self, latency: Duration) {
        self.samples
            .push(u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX));
        self.histogram.record(latency);
    }

    pub fn summary(&self) -> LatencySummary {
        if self.samples.is_empty() {
            return LatencySummary {
                histogram: self.histogram.buckets(),
                ..LatencySummary::default()
            };
        }

        let mut sorted = self.samples.clone();
        sorted.sort_unstable();
        let total: u64 = sorted.iter().fold(0u64, |acc, &ns| acc.saturating_add(ns));
        let count = sorted.len() as u64;

        LatencySummary {
            samples: count,
            total_ns: total,
            min_ns: sorted[0],
            mean_ns: total / count,
            p50_ns: percentile(&sorted, 50.0),
            p90_ns: percentile(&sorted, 90.0),
            p99_ns: percentile(&sorted, 99.0),
            max_ns: sorted[sorted.len() - 1],
            histogram: self.histogram.buckets(),
        }
    }
}

/// Nearest-rank percentile of non-empty, ascending `sorted`.
fn percentile(sorted: &[u64], pct: f64) -> u64 {
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_places_samples_on_bounds() {
        let mut histogram = LatencyHistogram::new(vec![10, 100]);
        histogram.record(Duration::from_micros(10));
        histogram.record(Duration::from_micros(11));
        histogram.record(Duration::from_micros(101));
        histogram.record(Duration::from_nanos(500));

        let counts: Vec<u64> = histogram.buckets().iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 1]);
        assert_eq!(histogram.buckets()[2].le_us, None);
    }

    #[test]
    fn summary_percentiles_use_nearest_rank() {
        let mut recorder = LatencyRecorder::with_capacity(100);
        for ns in 1..=100u64 {
            recorder.record(Duration::from_nanos(ns));
        }

        let summary = recorder.summary();
        assert_eq!(summary.samples, 100);
        assert_eq!(summary.min_ns, 1);
        assert_eq!(summary.p50_ns, 50);
        assert_eq!(summary.p90_ns, 90);
        assert_eq!(summary.p99_ns, 99);
        assert_eq!(summary.max_ns, 100);
        assert_eq!(summary.total_ns, 5050);
        assert_eq!(summary.mean_ns, 50);
    }

    #[test]
    fn empty_summary_is_zeroed() {
        let summary = LatencyRecorder::default().summary();
        assert_eq!(summary.samples, 0);
        assert_eq!(summary.ops_per_sec(), 0.0);
        assert_eq!(summary.histogram.len(), DEFAULT_LATENCY_BUCKETS_US.len() + 1);
    }
}
