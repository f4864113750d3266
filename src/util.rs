//! Ambient diagnostics (§4.8): a small `Timer`/`PerformanceMonitor` pair
//! adapted from the teacher's `util` module, trimmed to what the exchange
//! core actually needs — no `ndarray` math, no async file IO.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Accumulates named timing samples across repeated calls (e.g. one sample
/// per `exchange()` invocation, or per async round).
#[derive(Debug, Default)]
pub struct PerformanceMonitor {
    timings: HashMap<String, Vec<Duration>>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self { timings: HashMap::new() }
    }

    pub fn start_timer(&self, name: &str) -> Timer {
        Timer::new(name.to_string())
    }

    pub fn record_timing(&mut self, name: String, duration: Duration) {
        self.timings.entry(name).or_insert_with(Vec::new).push(duration);
    }

    pub fn get_stats(&self, name: &str) -> Option<TimingStats> {
        let durations = self.timings.get(name)?;
        if durations.is_empty() {
            return None;
        }
        let count = durations.len();
        let total: Duration = durations.iter().sum();
        let average = total / count as u32;
        let min = *durations.iter().min().unwrap();
        let max = *durations.iter().max().unwrap();
        Some(TimingStats { count, average, min, max })
    }

    pub fn clear(&mut self) {
        self.timings.clear();
    }
}

/// RAII stopwatch; logs elapsed time at `debug` level on drop.
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    pub fn new(name: String) -> Self {
        Self { name, start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        tracing::debug!(timer = %self.name, elapsed = ?self.elapsed(), "timer finished");
    }
}

#[derive(Debug, Clone)]
pub struct TimingStats {
    pub count: usize,
    pub average: Duration,
    pub min: Duration,
    pub max: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_reports_stats() {
        let mut monitor = PerformanceMonitor::new();
        monitor.record_timing("round".into(), Duration::from_millis(10));
        monitor.record_timing("round".into(), Duration::from_millis(20));
        let stats = monitor.get_stats("round").unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.min, Duration::from_millis(10));
        assert_eq!(stats.max, Duration::from_millis(20));
    }

    #[test]
    fn unknown_name_has_no_stats() {
        let monitor = PerformanceMonitor::new();
        assert!(monitor.get_stats("missing").is_none());
    }
}
