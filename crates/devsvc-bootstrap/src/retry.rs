use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// Where a retry loop is in its life.
///
/// `Retrying` only ever leaves on success. There is no failed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPhase {
    Pending,
    Retrying,
    Satisfied,
}

/// Fixed-interval, unbounded retry state.
#[derive(Debug)]
pub struct Retry {
    interval: Duration,
    phase: RetryPhase,
    attempts: u64,
}

impl Retry {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            phase: RetryPhase::Pending,
            attempts: 0,
        }
    }

    pub fn phase(&self) -> RetryPhase {
        self.phase
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Run `op` until it returns `Ok`, sleeping the fixed interval after
    /// every failure. `on_failure` sees each error with its 1-based attempt
    /// number before the sleep.
    pub async fn until_ok<T, E, F, Fut, L>(&mut self, mut op: F, mut on_failure: L) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        L: FnMut(&E, u64),
    {
        loop {
            self.attempts += 1;
            match op().await {
                Ok(value) => {
                    self.phase = RetryPhase::Satisfied;
                    return value;
                }
                Err(err) => {
                    on_failure(&err, self.attempts);
                    self.phase = RetryPhase::Retrying;
                    sleep(self.interval).await;
                }
            }
        }
    }
}
