//! Run statistics for batch scoring.

use crate::types::assessment::RiskAssessment;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::info;

/// Collects per-run counters and timings while a batch is scored.
pub struct ScoringStats {
    applications_scored: u64,
    failures: u64,
    by_tier: HashMap<String, u64>,
    /// Probability distribution, ten 10%-wide buckets
    score_buckets: [u64; 10],
    /// Per-record processing times (in microseconds)
    processing_times: Vec<u64>,
    start_time: Instant,
}

impl ScoringStats {
    pub fn new() -> Self {
        Self {
            applications_scored: 0,
            failures: 0,
            by_tier: HashMap::new(),
            score_buckets: [0; 10],
            processing_times: Vec::new(),
            start_time: Instant::now(),
        }
    }

    /// Record one scored application
    pub fn record_assessment(&mut self, processing_time: Duration, assessment: &RiskAssessment) {
        self.applications_scored += 1;
        self.processing_times
            .push(processing_time.as_micros() as u64);

        let bucket = (assessment.probability_of_default * 10.0).min(9.0) as usize;
        self.score_buckets[bucket] += 1;

        let tier = format!("{:?}", assessment.risk_tier).to_lowercase();
        *self.by_tier.entry(tier).or_insert(0) += 1;
    }

    /// Record one record that failed to score
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn applications_scored(&self) -> u64 {
        self.applications_scored
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn tier_counts(&self) -> &HashMap<String, u64> {
        &self.by_tier
    }

    pub fn score_distribution(&self) -> [u64; 10] {
        self.score_buckets
    }

    /// Processing time percentiles over the run
    pub fn processing_stats(&self) -> ProcessingStats {
        if self.processing_times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted = self.processing_times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Log the end-of-run summary
    pub fn print_summary(&self) {
        let scored = self.applications_scored;
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let processing = self.processing_stats();

        info!("=== Scoring Run Summary ===");
        info!(
            scored = scored,
            failed = self.failures,
            elapsed_s = format!("{:.2}", elapsed),
            "Applications processed"
        );
        info!(
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            "Per-application processing time"
        );

        for (tier, count) in &self.by_tier {
            let pct = if scored > 0 {
                (*count as f64 / scored as f64) * 100.0
            } else {
                0.0
            };
            info!("  {:10}: {:>6} ({:>5.1}%)", tier, count, pct);
        }

        info!("Default probability distribution:");
        let total: u64 = self.score_buckets.iter().sum();
        for (i, &count) in self.score_buckets.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let bar: String = "#".repeat(((pct / 2.0) as usize).min(40));
            info!(
                "  {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
    }
}

impl Default for ScoringStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}
