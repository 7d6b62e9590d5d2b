//! Background task scheduling
//!
//! The core needs two things from a scheduler: run a job on a fixed period
//! and run a job once after a delay. Jobs are plain synchronous closures and
//! must stay short; they run on a worker distinct from the transport's
//! dispatch context.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::error::{ProfileSyncError, SyncResult};

/// Job run once
pub type OneShotJob = Box<dyn FnOnce() + Send + 'static>;

/// Job run on every tick of a periodic schedule
pub type PeriodicJob = Box<dyn FnMut() + Send + 'static>;

/// Handle to a scheduled job
///
/// Dropping the handle does not cancel the job; call [`TaskHandle::abort`].
#[derive(Debug, Default)]
pub struct TaskHandle {
    abort: Option<AbortHandle>,
}

impl TaskHandle {
    /// Handle for a job that cannot be cancelled
    pub fn detached() -> Self {
        Self { abort: None }
    }

    fn from_abort_handle(abort: AbortHandle) -> Self {
        Self { abort: Some(abort) }
    }

    /// Cancel the job if it has not finished yet
    pub fn abort(&self) {
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    /// Whether the job has completed or been cancelled
    pub fn is_finished(&self) -> bool {
        self.abort.as_ref().map_or(false, |abort| abort.is_finished())
    }
}

/// Periodic and delayed job scheduling
pub trait Scheduler: Send + Sync {
    /// Run `job` every `interval`, first after one full interval
    fn run_periodic(&self, job: PeriodicJob, interval: Duration) -> TaskHandle;

    /// Run `job` once after `delay`
    fn run_once_delayed(&self, job: OneShotJob, delay: Duration) -> TaskHandle;
}

/// Scheduler backed by tokio tasks and timers
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Schedule onto the given runtime
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Schedule onto the runtime we are currently running in
    pub fn current() -> SyncResult<Self> {
        let handle = Handle::try_current()
            .map_err(|e| ProfileSyncError::Runtime(format!("No tokio runtime: {}", e)))?;
        Ok(Self::new(handle))
    }
}

impl Scheduler for TokioScheduler {
    fn run_periodic(&self, mut job: PeriodicJob, interval: Duration) -> TaskHandle {
        debug!(?interval, "Scheduling periodic job");

        let task = self.handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                job();
            }
        });

        TaskHandle::from_abort_handle(task.abort_handle())
    }

    fn run_once_delayed(&self, job: OneShotJob, delay: Duration) -> TaskHandle {
        debug!(?delay, "Scheduling delayed job");

        let task = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            job();
        });

        TaskHandle::from_abort_handle(task.abort_handle())
    }
}
