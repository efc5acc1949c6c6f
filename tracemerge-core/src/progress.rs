use coarsetime::Instant;
use log::info;

/// Periodic throughput messages while the merged trace is written.
///
/// Purely informational, nothing in the merge depends on it.
pub struct ProgressReporter {
    /// Rows between two messages, `0` disables periodic messages.
    interval: u64,

    count: u64,

    start: Instant,
}

impl ProgressReporter {
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            count: 0,
            start: Instant::now(),
        }
    }

    /// Count one written row. Returns `true` if a message was logged.
    #[inline]
    pub fn record(&mut self) -> bool {
        self.count += 1;

        if self.interval == 0 || self.count % self.interval != 0 {
            return false;
        }

        info!(
            "Processing throughput: {:.2} / sec (total {} rows are written)",
            self.throughput(),
            self.count
        );

        true
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Seconds since the reporter was created.
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_f64()
    }

    fn throughput(&self) -> f64 {
        let elapsed = self.elapsed_secs();

        if elapsed > 0.0 {
            self.count as f64 / elapsed
        } else {
            self.count as f64
        }
    }

    pub fn finish(&self) {
        info!(
            "total written rows: {}, elapsed: {:.2} sec",
            self.count,
            self.elapsed_secs()
        );
    }
}
