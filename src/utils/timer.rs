// file: src/utils/timer.rs
// description: debug level stage timing for the refresh cycle

use std::time::{Duration, Instant};
use tracing::debug;

pub struct StageTimer {
    stage: &'static str,
    start: Instant,
}

impl StageTimer {
    pub fn start(stage: &'static str) -> Self {
        Self {
            stage,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish_with_count(self, count: usize) -> Duration {
        let elapsed = self.elapsed();
        debug!(
            "Stage {} handled {} items in {:.3}s",
            self.stage,
            count,
            elapsed.as_secs_f64()
        );
        elapsed
    }
}
