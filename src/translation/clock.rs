/*!
 * Injectable sleeping.
 *
 * Retry delays go through a `Sleeper` so tests can record the requested
 * durations instead of waiting them out.
 */

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

/// Something that can wait for a duration
#[async_trait]
pub trait Sleeper: Send + Sync + Debug {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeping on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Returns immediately and remembers every requested delay
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    recorded: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay requested so far, in order
    pub fn recorded(&self) -> Vec<Duration> {
        self.recorded.lock().clone()
    }

    /// Sum of all requested delays
    pub fn total(&self) -> Duration {
        self.recorded.lock().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.recorded.lock().push(duration);
    }
}
