//! A single periodic job and its run loop

use crate::model::JobState;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Future returned by one execution of a job's task
pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A no-argument unit of work the scheduler can run repeatedly
pub type Task = Arc<dyn Fn() -> TaskFuture + Send + Sync + 'static>;

/// A registered periodic job
pub struct Job {
    name: String,
    interval: Duration,
    task: Task,
    state: Arc<Mutex<JobState>>,
    executions: Arc<AtomicU64>,
}

impl Job {
    pub(crate) fn new(name: String, interval: Duration, task: Task) -> Self {
        Self {
            name,
            interval,
            task,
            state: Arc::new(Mutex::new(JobState::Idle)),
            executions: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> JobState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }

    /// Number of task executions that have completed
    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::SeqCst)
    }

    pub(crate) fn set_state(&self, next: JobState) {
        set_state(&self.state, &self.name, next);
    }

    /// Marks a job whose run loop died mid-execution as stopped
    ///
    /// A panicking task never reaches the loop's own `Stopped` transition,
    /// so this bypasses the transition check.
    pub(crate) fn mark_stopped_after_defect(&self) {
        let mut current = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        tracing::trace!(job = %self.name, from = %*current, "Job forced to stopped");
        *current = JobState::Stopped;
    }

    /// Builds the future that drives this job until `token` is cancelled
    ///
    /// The task runs once immediately, then once per elapsed interval.
    /// Cancellation is only observed between executions; an execution that
    /// has started always runs to completion.
    pub(crate) fn run(&self, token: CancellationToken) -> impl Future<Output = ()> + Send + 'static {
        let name = self.name.clone();
        let period = self.interval;
        let task = Arc::clone(&self.task);
        let state = Arc::clone(&self.state);
        let executions = Arc::clone(&self.executions);

        async move {
            set_state(&state, &name, JobState::Running);

            execute(&task, &executions).await;

            // The first tick lands one full period after the immediate run.
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;

                    _ = token.cancelled() => {
                        set_state(&state, &name, JobState::Cancelling);
                        break;
                    }
                    _ = ticker.tick() => {
                        execute(&task, &executions).await;
                    }
                }
            }

            set_state(&state, &name, JobState::Stopped);
        }
    }
}

async fn execute(task: &Task, executions: &AtomicU64) {
    task().await;
    executions.fetch_add(1, Ordering::SeqCst);
}

fn set_state(state: &Mutex<JobState>, name: &str, next: JobState) {
    let mut current = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if !current.can_transition_to(next) {
        tracing::warn!(job = name, from = %*current, to = %next, "Ignoring invalid job state transition");
        return;
    }
    tracing::trace!(job = name, from = %*current, to = %next, "Job state changed");
    *current = next;
}
