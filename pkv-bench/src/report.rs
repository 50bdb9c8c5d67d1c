//! # Reports
//!
//! Per-scenario results, the one-line text rendering, and the JSON document
//! written by `pkv run --json`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::BenchResult;
use crate::scenario::ScenarioKind;
use crate::stats::LatencySummary;

/// One measurement variant (fixed-key or random-key).
#[derive(Debug, Clone, Serialize)]
pub struct VariantReport {
    pub label: String,
    pub latency: LatencySummary,
}

/// Everything measured for one scenario case.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub kind: ScenarioKind,
    pub key_len: usize,
    pub population: usize,
    /// Distinct keys among the population (generation may repeat).
    pub distinct: usize,
    pub setup_ns: u64,
    pub teardown_ns: u64,
    pub removed: u64,
    pub fixed: VariantReport,
    pub random: VariantReport,
}

/// A full `pkv run`.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub addr: &'a str,
    pub started_unix_ms: u64,
    pub population: usize,
    pub iterations: usize,
    pub scenarios: &'a [ScenarioReport],
}

impl<'a> RunReport<'a> {
    pub fn new(
        addr: &'a str,
        started: SystemTime,
        population: usize,
        iterations: usize,
        scenarios: &'a [ScenarioReport],
    ) -> Self {
        let started_unix_ms = started
            .duration_since(UNIX_EPOCH)
            .map(|since| since.as_millis() as u64)
            .unwrap_or(0);
        RunReport {
            addr,
            started_unix_ms,
            population,
            iterations,
            scenarios,
        }
    }

    /// Writes the report as pretty JSON to `path`.
    pub fn write_json(&self, path: &Path) -> BenchResult<()> {
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut out, self)?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}

/// `label: n ops in s (ops/s, ns/op, p50 .. p99 ..)`.
pub fn render_variant(variant: &VariantReport) -> String {
    let latency = &variant.latency;
    let secs = latency.total().as_secs_f64();
    let nanos_per_op = if latency.samples == 0 {
        0.0
    } else {
        latency.total_ns as f64 / latency.samples as f64
    };
    format!(
        "{}: {} ops in {secs:.3}s ({:.0} ops/s, {nanos_per_op:.1} ns/op, p50 {:?}, p90 {:?}, p99 {:?}, max {:?})",
        variant.label,
        latency.samples,
        latency.ops_per_sec(),
        Duration::from_nanos(latency.p50_ns),
        Duration::from_nanos(latency.p90_ns),
        Duration::from_nanos(latency.p99_ns),
        Duration::from_nanos(latency.max_ns),
    )
}

/// Setup line, both variants, teardown line.
pub fn render_scenario(report: &ScenarioReport) -> Vec<String> {
    vec![
        format!(
            "setup {} {} {:?}",
            report.name,
            report.population,
            Duration::from_nanos(report.setup_ns)
        ),
        render_variant(&report.fixed),
        render_variant(&report.random),
        format!(
            "tearDown {} {} {:?}",
            report.name,
            report.population,
            Duration::from_nanos(report.teardown_ns)
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::LatencyRecorder;

    fn variant(label: &str, samples: &[u64]) -> VariantReport {
        let mut recorder = LatencyRecorder::default();
        for &ns in samples {
            recorder.record(Duration::from_nanos(ns));
        }
        VariantReport {
            label: label.to_string(),
            latency: recorder.summary(),
        }
    }

    #[test]
    fn variant_line_reports_counts_and_rate() {
        let line = render_variant(&variant("short_key_same_key", &[1_000, 3_000]));
        assert!(line.starts_with(
            "short_key_same_key: 2 ops in 0.000s (500000 ops/s, 2000.0 ns/op"
        ));
        assert!(line.contains("max 3µs"), "{line}");
    }

    #[test]
    fn run_report_serializes_scenarios() {
        let scenario = ScenarioReport {
            name: "short_field".to_string(),
            kind: ScenarioKind::Hash,
            key_len: 4,
            population: 2,
            distinct: 2,
            setup_ns: 10,
            teardown_ns: 5,
            removed: 1,
            fixed: variant("short_field_same_field", &[100]),
            random: variant("short_field_random_field", &[200]),
        };
        let scenarios = [scenario];
        let report = RunReport::new("127.0.0.1:6379", UNIX_EPOCH, 2, 1, &scenarios);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["addr"], "127.0.0.1:6379");
        assert_eq!(json["scenarios"][0]["kind"], "hash");
        assert_eq!(json["scenarios"][0]["random"]["latency"]["max_ns"], 200);
    }
}
