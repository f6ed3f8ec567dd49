//! Courtesy pacing between requests to the publisher's server

use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Keeps at least `interval` between the end of one request and the start
/// of the next.
#[derive(Debug)]
pub struct Pacer {
    name: &'static str,
    interval: Duration,
    last_completed: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Pacer {
            name,
            interval,
            last_completed: Mutex::new(None),
        }
    }

    /// A pacer that never waits
    pub fn unpaced(name: &'static str) -> Self {
        Pacer::new(name, Duration::ZERO)
    }

    /// Wait until the interval has passed since the last completed request
    pub async fn ready(&self) {
        let remaining = {
            let last = self.last_completed.lock().unwrap_or_else(|e| e.into_inner());
            last.map(|at| self.interval.saturating_sub(at.elapsed()))
        };

        if let Some(wait) = remaining.filter(|w| !w.is_zero()) {
            debug!("{} pacer waiting {:?}", self.name, wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Record that a request just finished
    pub fn completed(&self) {
        let mut last = self.last_completed.lock().unwrap_or_else(|e| e.into_inner());
        *last = Some(Instant::now());
    }
}
