//! Library-level errors.
//!
//! Rejection reasons themselves are never wrapped here: a [`Deferred`](crate::Deferred)
//! rejects with whatever `E` the caller chose. These types only describe
//! failures of the machinery around it.

use thiserror::Error;

/// Returned by [`Scheduler::run_all`](crate::Scheduler::run_all) when the
/// configured job limit stops the run before the queue became idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RunError {
    /// The run executed `limit` jobs and more work was still queued.
    #[error("job limit of {limit} reached with {remaining} job(s) still queued")]
    JobLimitReached { limit: usize, remaining: usize },
}

/// Failure to obtain a fulfillment value while waiting on a deferred value.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WaitError<E> {
    /// The deferred value settled as rejected.
    #[error("deferred value was rejected")]
    Rejected(E),

    /// The scheduler went idle while the deferred value was still pending.
    /// Nothing left in the queue can settle it.
    #[error("scheduler is idle but the deferred value is still pending")]
    Stalled,

    /// Every handle able to settle the deferred value was dropped first.
    #[error("deferred value was dropped before it settled")]
    Abandoned,

    /// Driving the scheduler failed before the deferred value settled.
    #[error(transparent)]
    Run(#[from] RunError),
}

impl<E> WaitError<E> {
    /// Returns the rejection reason, if this error carries one.
    pub fn into_rejection(self) -> Option<E> {
        match self {
            WaitError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}
