//! Request pacing for the catalog client, with adaptive backoff.
//!
//! The interval between requests doubles on every throttled or failed call
//! (up to a ceiling) and is halved again after a run of successes.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

pub struct RateLimiter {
    name: String,
    last_request: Option<Instant>,
    current_interval: Duration,
    base_interval: Duration,
    max_interval: Duration,
    success_count: u32,
    successes_to_reduce: u32,
}

impl RateLimiter {
    /// * `name` - label for log messages
    /// * `base_interval` - minimum time between requests
    /// * `max_interval` - upper bound after repeated failures
    /// * `successes_to_reduce` - consecutive successes before halving the
    ///   interval; 0 disables the reduction
    pub fn new(name: &str, base_interval: Duration, max_interval: Duration, successes_to_reduce: u32) -> Self {
        RateLimiter {
            name: name.to_string(),
            last_request: None,
            current_interval: base_interval,
            base_interval,
            max_interval,
            success_count: 0,
            successes_to_reduce,
        }
    }

    /// Base interval in milliseconds; ceiling at 16x, reduce after 10 successes.
    pub fn from_millis(name: &str, millis: u64) -> Self {
        let base = Duration::from_millis(millis);
        Self::new(name, base, base * 16, 10)
    }

    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }

    /// Time still to wait before the next request may go out.
    pub fn pending_wait(&self) -> Duration {
        match self.last_request {
            Some(last) => self.current_interval.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Sleep until the next request is allowed. Call *before* each request.
    pub fn wait_if_needed(&mut self) {
        let wait = self.pending_wait();
        if !wait.is_zero() {
            debug!("[{}] rate limiting: waiting {:.2}s", self.name, wait.as_secs_f64());
            thread::sleep(wait);
        }
        self.last_request = Some(Instant::now());
    }

    pub fn report_success(&mut self) {
        if self.successes_to_reduce == 0 {
            return;
        }

        self.success_count += 1;

        if self.success_count >= self.successes_to_reduce && self.current_interval > self.base_interval {
            self.current_interval = (self.current_interval / 2).max(self.base_interval);
            info!(
                "[{}] request interval reduced to {:.2}s after {} successes",
                self.name,
                self.current_interval.as_secs_f64(),
                self.success_count
            );
            self.success_count = 0;
        }
    }

    /// Double the interval, up to the ceiling.
    pub fn report_failure(&mut self) {
        self.current_interval = (self.current_interval * 2).min(self.max_interval);
        info!(
            "[{}] request interval increased to {:.2}s after error",
            self.name,
            self.current_interval.as_secs_f64()
        );
        self.success_count = 0;
    }

    /// The server asked us to back off, optionally for a given time.
    /// The interval grows to at least that delay, still capped by the ceiling.
    pub fn report_throttled(&mut self, retry_after: Option<Duration>) {
        self.report_failure();
        if let Some(delay) = retry_after {
            self.current_interval = self.current_interval.max(delay).min(self.max_interval);
        }
    }
}
