//! Lightweight timing of tick stages.
//!
//! With the `profile` feature enabled, `Universe::tick` records every stage
//! here:
//! ```bash
//! cargo test --release --features profile
//! ```
//!
//! `StressProfiler` wraps whole-tick timings for stress tests and benches.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

/// Accumulated timings per named section.
#[derive(Debug, Default)]
pub struct Profiler {
    sections: HashMap<String, SectionStats>,
    /// Current section being timed (if any)
    current_section: Option<(String, Instant)>,
    tick_count: u64,
}

/// Statistics for a profiled section
#[derive(Debug, Default, Clone)]
pub struct SectionStats {
    pub total_time: Duration,
    pub call_count: u64,
    pub min_time: Option<Duration>,
    pub max_time: Option<Duration>,
}

impl SectionStats {
    pub fn avg_time(&self) -> Duration {
        if self.call_count == 0 {
            Duration::ZERO
        } else {
            self.total_time / self.call_count as u32
        }
    }

    fn add(&mut self, elapsed: Duration) {
        self.total_time += elapsed;
        self.call_count += 1;
        self.min_time = Some(self.min_time.map_or(elapsed, |m| m.min(elapsed)));
        self.max_time = Some(self.max_time.map_or(elapsed, |m| m.max(elapsed)));
    }
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing a named section. Call `end_section` to stop timing.
    pub fn begin_section(&mut self, name: &str) {
        self.current_section = Some((name.to_string(), Instant::now()));
    }

    /// End the current section and record its duration.
    pub fn end_section(&mut self) {
        if let Some((name, start)) = self.current_section.take() {
            self.record(&name, start.elapsed());
        }
    }

    /// Record an externally measured duration for `name`.
    pub fn record(&mut self, name: &str, elapsed: Duration) {
        match self.sections.get_mut(name) {
            Some(stats) => stats.add(elapsed),
            None => {
                let mut stats = SectionStats::default();
                stats.add(elapsed);
                self.sections.insert(name.to_string(), stats);
            }
        }
    }

    /// Time a section using a closure.
    pub fn time_section<F, R>(&mut self, name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.begin_section(name);
        let result = f();
        self.end_section();
        result
    }

    pub fn tick(&mut self) {
        self.tick_count += 1;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn get_section(&self, name: &str) -> Option<&SectionStats> {
        self.sections.get(name)
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.keys().map(|s| s.as_str()).collect()
    }

    /// Sum of every section's total time.
    pub fn total_time(&self) -> Duration {
        self.sections.values().map(|s| s.total_time).sum()
    }

    /// Table of all sections, slowest first.
    pub fn summary(&self) -> String {
        let mut sections: Vec<_> = self.sections.iter().collect();
        sections.sort_by(|a, b| b.1.total_time.cmp(&a.1.total_time));
        let total = self.total_time();

        let mut out = String::new();
        let _ = writeln!(out, "=== Profiler Summary ({} ticks) ===", self.tick_count);
        let _ = writeln!(
            out,
            "{:<20} {:>10} {:>10} {:>10} {:>10} {:>8}",
            "Section", "Total", "Avg/call", "Min", "Max", "% Time"
        );
        for (name, stats) in &sections {
            let pct = if total.as_nanos() > 0 {
                (stats.total_time.as_nanos() as f64 / total.as_nanos() as f64) * 100.0
            } else {
                0.0
            };
            let _ = writeln!(
                out,
                "{:<20} {:>10.2?} {:>10.2?} {:>10.2?} {:>10.2?} {:>7.1}%",
                name,
                stats.total_time,
                stats.avg_time(),
                stats.min_time.unwrap_or(Duration::ZERO),
                stats.max_time.unwrap_or(Duration::ZERO),
                pct
            );
        }
        let _ = write!(out, "{:<20} {:>10.2?}", "TOTAL", total);
        out
    }

    /// Emit the summary through `tracing`.
    pub fn log_summary(&self) {
        for line in self.summary().lines() {
            tracing::info!("{line}");
        }
    }

    pub fn reset(&mut self) {
        self.sections.clear();
        self.current_section = None;
        self.tick_count = 0;
    }
}

/// Whole-tick timings for stress runs.
#[derive(Debug, Default)]
pub struct StressProfiler {
    pub profiler: Profiler,
    pub total_time: Duration,
    pub worst_tick: Duration,
}

impl StressProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&mut self, duration: Duration) {
        self.total_time += duration;
        self.worst_tick = self.worst_tick.max(duration);
        self.profiler.tick();
    }

    pub fn avg_tick(&self) -> Duration {
        let ticks = self.profiler.tick_count();
        if ticks > 0 {
            self.total_time / ticks as u32
        } else {
            Duration::ZERO
        }
    }

    pub fn log_summary(&self, agent_count: usize) {
        let avg = self.avg_tick();
        tracing::info!(
            agents = agent_count,
            ticks = self.profiler.tick_count(),
            total_ms = self.total_time.as_secs_f64() * 1000.0,
            avg_ms = avg.as_secs_f64() * 1000.0,
            worst_ms = self.worst_tick.as_secs_f64() * 1000.0,
            "stress run complete"
        );
    }
}
