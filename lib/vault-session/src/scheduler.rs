//! Scheduling collaborators used by the session manager to arrange renewals.

use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;

/// Runs a task once after a delay
pub trait TaskScheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>);
}

/// One-shot scheduler spawning delayed tasks on a tokio runtime
#[derive(Clone)]
pub struct TokioTaskScheduler {
    handle: Handle,
}

impl Default for TokioTaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TokioTaskScheduler {
    /// Scheduler bound to the current runtime.
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn new() -> Self {
        Self::with_handle(Handle::current())
    }

    pub fn with_handle(handle: Handle) -> Self {
        Self { handle }
    }
}

impl TaskScheduler for TokioTaskScheduler {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
    }
}

/// Computes the delay before the next execution, `None` to stop
pub trait Trigger: Send {
    fn next_execution(&mut self) -> Option<Duration>;
}

/// Fires exactly once
#[derive(Debug)]
pub struct OneShotTrigger {
    delay: Option<Duration>,
}

impl OneShotTrigger {
    pub fn new(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }
}

impl Trigger for OneShotTrigger {
    fn next_execution(&mut self) -> Option<Duration> {
        self.delay.take()
    }
}

/// Recurring scheduler that consults a [`Trigger`] after every execution
#[derive(Clone)]
pub struct TriggerTaskScheduler {
    handle: Handle,
}

impl Default for TriggerTaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerTaskScheduler {
    /// Panics when called outside of a tokio runtime.
    pub fn new() -> Self {
        Self::with_handle(Handle::current())
    }

    pub fn with_handle(handle: Handle) -> Self {
        Self { handle }
    }

    pub fn schedule_with_trigger<T, F>(&self, mut trigger: T, mut task: F)
    where
        T: Trigger + 'static,
        F: FnMut() -> BoxFuture<'static, ()> + Send + 'static,
    {
        self.handle.spawn(async move {
            while let Some(delay) = trigger.next_execution() {
                tokio::time::sleep(delay).await;
                task().await;
            }
        });
    }
}

impl TaskScheduler for TriggerTaskScheduler {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) {
        let task = Arc::new(Mutex::new(Some(task)));
        self.schedule_with_trigger(OneShotTrigger::new(delay), move || {
            let task = task.lock().ok().and_then(|mut slot| slot.take());
            Box::pin(async move {
                if let Some(task) = task {
                    task.await;
                }
            })
        });
    }
}
