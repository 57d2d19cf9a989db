//! Per-stage timing profile, logged once at the end of a run.

use std::time::{Duration, Instant};

use tracing::info;

/// Records how long each stage of a run took.
pub struct StageTimer {
    started: Instant,
    lap_started: Instant,
    stages: Vec<(String, Duration)>,
}

impl StageTimer {
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            lap_started: now,
            stages: Vec::new(),
        }
    }

    /// Close the running stage under `name` and start the next one.
    pub fn toc(&mut self, name: impl Into<String>) {
        let now = Instant::now();
        self.stages.push((name.into(), now - self.lap_started));
        self.lap_started = now;
    }

    /// Add a stage that was timed elsewhere.
    pub fn record(&mut self, name: impl Into<String>, elapsed: Duration) {
        self.stages.push((name.into(), elapsed));
    }

    /// Restart the running stage without recording it.
    pub fn lap(&mut self) {
        self.lap_started = Instant::now();
    }

    pub fn stages(&self) -> &[(String, Duration)] {
        &self.stages
    }

    pub fn total(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn log_summary(&self) {
        let total = self.total();
        for (stage, elapsed) in &self.stages {
            info!(
                stage = %stage,
                elapsed_s = elapsed.as_secs_f64(),
                share_pct = share(*elapsed, total),
                "Stage timing"
            );
        }
        info!(elapsed_s = total.as_secs_f64(), "Total elapsed time");
    }
}

/// Percentage of `total` spent in `elapsed`.
pub fn share(elapsed: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    100.0 * elapsed.as_secs_f64() / total.as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_keep_order() {
        let mut timer = StageTimer::start();
        timer.toc("read tables");
        timer.record("2040-01-01_00 convert", Duration::from_millis(250));
        timer.lap();

        let names: Vec<&str> = timer.stages().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["read tables", "2040-01-01_00 convert"]);
        assert_eq!(timer.stages()[1].1, Duration::from_millis(250));
        assert!(timer.total() >= timer.stages()[0].1);
    }

    #[test]
    fn test_share() {
        let total = Duration::from_secs(4);
        assert!((share(Duration::from_secs(1), total) - 25.0).abs() < 1e-9);
        assert_eq!(share(Duration::from_secs(1), Duration::ZERO), 0.0);
    }
}
