//! Per-connection processing time measurements.

use std::time::{Duration, Instant};

/// Measures how long one kind of packet processing takes.
#[derive(Debug, Default)]
pub struct TimingTask {
    started: Option<Instant>,
    last: Duration,
    total: Duration,
    samples: u64,
}

impl TimingTask {
    /// Marks the start of a measured section.
    pub fn prepare(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Marks the end of a measured section. Does nothing without a matching
    /// [`prepare`](Self::prepare).
    pub fn end(&mut self) {
        if let Some(started) = self.started.take() {
            self.last = started.elapsed();
            self.total += self.last;
            self.samples += 1;
        }
    }

    /// Duration of the last completed section.
    #[must_use]
    pub const fn last(&self) -> Duration {
        self.last
    }

    /// Number of completed sections.
    #[must_use]
    pub const fn samples(&self) -> u64 {
        self.samples
    }

    /// Mean duration across all completed sections.
    #[must_use]
    pub fn average(&self) -> Duration {
        match u32::try_from(self.samples) {
            Ok(0) => Duration::ZERO,
            Ok(samples) => self.total / samples,
            Err(_) => Duration::from_secs_f64(self.total.as_secs_f64() / self.samples as f64),
        }
    }
}

/// Timing data kept per connection.
#[derive(Debug, Default)]
pub struct TimingState {
    /// Time spent validating movement packets.
    pub movement: TimingTask,
}
