//! Injectable sleep port, so tests can observe requested durations instead
//! of actually waiting on them.

use std::sync::{Arc, Mutex};
use std::time::Duration;

pub trait Sleeper {
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// Lets a test share one [`RecordingSleeper`] between the scheduler (which
/// takes it by value) and the assertions made after `execute` consumes it.
impl<T: Sleeper + ?Sized + Sync> Sleeper for Arc<T> {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}

pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records every requested duration without waiting. Used by tests that
/// need to assert on the durations the scheduler asked for (e.g. scenario 5
/// in the end-to-end suite) without making the suite slow.
#[derive(Default)]
pub struct RecordingSleeper {
    recorded: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<Duration> {
        self.recorded.lock().expect("recorded-durations lock poisoned").clone()
    }
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.recorded
            .lock()
            .expect("recorded-durations lock poisoned")
            .push(duration);
    }
}
