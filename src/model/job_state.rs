/// Lifecycle states of a scheduled job
///
/// A job moves strictly forward: `Idle -> Running -> Cancelling -> Stopped`.
/// A job that was registered but never started goes from `Idle` straight to
/// `Stopped` when the scheduler is stopped.
use std::fmt;

/// Represents the current state of a registered periodic job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Registered but the scheduler has not been started
    Idle,

    /// Executing immediately or waiting for the next interval tick
    Running,

    /// Cancellation has been observed; the job loop is exiting
    Cancelling,

    /// The job loop has exited
    Stopped,
}

impl JobState {
    /// Returns true once the job loop has exited
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns true while the job owns a running task
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Cancelling)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Cancelling => "cancelling",
            Self::Stopped => "stopped",
        }
    }

    /// Returns whether moving from `self` to `next` follows the lifecycle
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Stopped)
                | (Self::Running, Self::Cancelling)
                | (Self::Cancelling, Self::Stopped)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
