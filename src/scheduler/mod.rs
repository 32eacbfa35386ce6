//! Scheduler for running independent periodic jobs
//!
//! This module handles:
//! - Registering jobs with their own interval
//! - Starting every job on its own tokio task
//! - Broadcasting cancellation through one shared token
//! - Waiting for every job to finish its current execution on stop
//!
//! The scheduler knows nothing about what a job does. A job's task is any
//! closure returning a future; failures inside it are the task's own concern.

mod job;

pub use job::{Job, Task, TaskFuture};

use crate::model::JobState;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Errors reported by the scheduler itself
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Job '{0}' has a zero interval")]
    ZeroInterval(String),

    #[error("Scheduler has already been started")]
    AlreadyStarted,
}

/// Owns a set of periodic jobs and their shared cancellation token
///
/// # Example
///
/// ```no_run
/// use borsa_scraper::scheduler::Scheduler;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), borsa_scraper::scheduler::SchedulerError> {
/// let mut scheduler = Scheduler::new();
/// scheduler.register("heartbeat", Duration::from_secs(60), || async {
///     tracing::info!("still alive");
/// })?;
///
/// scheduler.start()?;
/// // ... wait for a shutdown signal ...
/// scheduler.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct Scheduler {
    jobs: Vec<Job>,
    token: CancellationToken,
    handles: Vec<(usize, JoinHandle<()>)>,
    started: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            token: CancellationToken::new(),
            handles: Vec::new(),
            started: false,
        }
    }

    /// Registers a job that runs `task` immediately on start, then every `interval`
    ///
    /// # Returns
    ///
    /// * `Err(SchedulerError::ZeroInterval)` - `interval` is zero
    /// * `Err(SchedulerError::AlreadyStarted)` - jobs can no longer be added
    pub fn register<F, Fut>(
        &mut self,
        name: impl Into<String>,
        interval: Duration,
        task: F,
    ) -> Result<(), SchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();

        if self.started {
            return Err(SchedulerError::AlreadyStarted);
        }
        if interval.is_zero() {
            return Err(SchedulerError::ZeroInterval(name));
        }

        let task: Task = Arc::new(move || -> TaskFuture { Box::pin(task()) });
        tracing::debug!(job = %name, interval = ?interval, "Registered job");
        self.jobs.push(Job::new(name, interval, task));
        Ok(())
    }

    /// Starts every registered job concurrently
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.started {
            return Err(SchedulerError::AlreadyStarted);
        }
        self.started = true;

        for (index, job) in self.jobs.iter().enumerate() {
            let handle = tokio::spawn(job.run(self.token.clone()));
            self.handles.push((index, handle));
        }

        tracing::info!(jobs = self.jobs.len(), "Scheduler started");
        Ok(())
    }

    /// Cancels every job and waits until all of them have exited
    ///
    /// There is no timeout: if a job is mid-execution, this waits for that
    /// execution to finish. A job that panicked is logged and does not stop
    /// the remaining jobs from being joined.
    pub async fn stop(&mut self) {
        self.token.cancel();

        for (index, handle) in self.handles.drain(..) {
            if let Err(e) = handle.await {
                let job = &self.jobs[index];
                tracing::error!(job = %job.name(), error = %e, "Job terminated abnormally");
                job.mark_stopped_after_defect();
            }
        }

        for job in &self.jobs {
            if job.state() == JobState::Idle {
                job.set_state(JobState::Stopped);
            }
        }

        tracing::info!(jobs = self.jobs.len(), "Scheduler stopped");
    }

    /// Name and current state of every registered job, in registration order
    pub fn job_states(&self) -> Vec<(String, JobState)> {
        self.jobs
            .iter()
            .map(|job| (job.name().to_string(), job.state()))
            .collect()
    }

    /// Registered jobs, in registration order
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// A handle to the token `stop` cancels
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
