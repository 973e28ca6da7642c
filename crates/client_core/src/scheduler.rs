//! Cancellable timed tasks backing debounce, polling and transient banners.

use std::{
    future::Future,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

/// Handle to a pending or running timed task. Dropping it cancels the task.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    runtime: Handle,
}

impl Scheduler {
    /// Binds to the tokio runtime the caller is running on.
    ///
    /// Panics outside a runtime, like `tokio::spawn`.
    pub fn current() -> Self {
        Self {
            runtime: Handle::current(),
        }
    }

    pub fn with_handle(runtime: Handle) -> Self {
        Self { runtime }
    }

    pub fn schedule_once<F>(&self, delay: Duration, task: F) -> ScheduledTask
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = self.runtime.spawn(async move {
            time::sleep(delay).await;
            task.await;
        });
        ScheduledTask { handle }
    }

    /// Runs `task` to completion independently of any handle.
    pub fn spawn_detached<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Dropping a JoinHandle detaches the task instead of aborting it.
        drop(self.runtime.spawn(task));
    }

    /// Runs `tick` immediately and then once per `period`.
    ///
    /// Each tick's future is spawned on its own, so slow work never delays
    /// the next tick and canceling the schedule leaves in-flight work alone.
    pub fn schedule_repeating<F, Fut>(&self, period: Duration, mut tick: F) -> ScheduledTask
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let runtime = self.runtime.clone();
        let handle = self.runtime.spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                runtime.spawn(tick());
            }
        });
        ScheduledTask { handle }
    }
}

/// Trailing-edge debounce: every trigger replaces the task still waiting.
#[derive(Debug)]
pub struct Debouncer {
    scheduler: Scheduler,
    delay: Duration,
    pending: Mutex<Option<ScheduledTask>>,
}

impl Debouncer {
    pub fn new(scheduler: Scheduler, delay: Duration) -> Self {
        Self {
            scheduler,
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn trigger<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let next = self.scheduler.schedule_once(self.delay, task);
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        // Replacing drops the superseded task, which aborts it.
        *pending = Some(next);
    }

    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.take();
    }

    pub fn is_pending(&self) -> bool {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.as_ref().is_some_and(|task| !task.is_finished())
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
