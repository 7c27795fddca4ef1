//! Tick timing statistics

use std::collections::VecDeque;

/// Summary of recent tick durations, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickStats {
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p95_ms: f64,
    pub sample_count: usize,
}

impl TickStats {
    pub fn fps(&self) -> f64 {
        if self.avg_ms > 0.0 {
            1000.0 / self.avg_ms
        } else {
            0.0
        }
    }
}

/// Rolling window of tick durations
#[derive(Debug, Clone)]
pub struct TickProfiler {
    samples: VecDeque<f64>,
    max_samples: usize,
    total_ticks: u64,
}

impl Default for TickProfiler {
    fn default() -> Self {
        // 5 seconds at 60 fps
        Self::new(300)
    }
}

impl TickProfiler {
    pub fn new(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
            total_ticks: 0,
        }
    }

    /// Record one tick of `dt` seconds
    pub fn record(&mut self, dt: f32) {
        self.total_ticks += 1;
        if !(dt.is_finite() && dt >= 0.0) {
            return;
        }
        self.samples.push_back(dt as f64 * 1000.0);
        if self.samples.len() > self.max_samples {
            self.samples.pop_front();
        }
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn stats(&self) -> TickStats {
        if self.samples.is_empty() {
            return TickStats::default();
        }
        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        let p95_idx = ((n as f64 * 0.95).ceil() as usize).clamp(1, n) - 1;
        TickStats {
            avg_ms: sorted.iter().sum::<f64>() / n as f64,
            min_ms: sorted[0],
            max_ms: sorted[n - 1],
            p95_ms: sorted[p95_idx],
            sample_count: n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let profiler = TickProfiler::default();
        assert_eq!(profiler.stats(), TickStats::default());
        assert_eq!(profiler.stats().fps(), 0.0);
    }

    #[test]
    fn test_stats_and_window() {
        let mut profiler = TickProfiler::new(4);
        for dt in [0.010, 0.020, 0.030, 0.040, 0.050] {
            profiler.record(dt);
        }
        profiler.record(f32::NAN);
        let stats = profiler.stats();
        assert_eq!(profiler.total_ticks(), 6);
        assert_eq!(stats.sample_count, 4);
        assert!((stats.min_ms - 20.0).abs() < 1e-3);
        assert!((stats.max_ms - 50.0).abs() < 1e-3);
        assert!((stats.avg_ms - 35.0).abs() < 1e-3);
        assert!((stats.p95_ms - 50.0).abs() < 1e-3);
    }
}
