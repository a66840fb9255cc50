use std::time::{Duration, Instant};

/// Wall-clock stopwatch used to report model response latency.
pub struct Telemetry {
    start: Instant,
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed time rendered as seconds with two decimals, e.g. `1.42s`.
    pub fn elapsed_display(&self) -> String {
        format!("{:.2}s", self.elapsed().as_secs_f64())
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}
