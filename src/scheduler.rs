//! Provides the `Scheduler` that defers callbacks for later execution.
//!
//! Deferred values never run continuations inline. Every notification is
//! handed to a [`Schedule`] implementation instead, which queues it until the
//! owner of the queue decides to run it. The bundled [`Scheduler`] keeps a
//! plain FIFO queue: jobs run strictly in the order they were scheduled, and
//! a job scheduled while another job runs waits behind everything already
//! queued.
//!
//! Scheduling goes through a cheap, cloneable [`SchedulerHandle`], so deferred
//! values can hold on to the queue without borrowing the [`Scheduler`]
//! itself. Running jobs requires the `Scheduler`.

use std::{cell::RefCell, collections::VecDeque, fmt, rc::Rc};

use tracing::trace;

use crate::{SchedulerConfig, error::RunError};

/// A unit of deferred work.
pub type Job = Box<dyn FnOnce()>;

/// The capability deferred values need from their environment: run this
/// callback later.
///
/// Implementations must never run `job` before `schedule` returns, and jobs
/// scheduled from the same unit of work must run in the order they were
/// scheduled. Beyond "not now" no particular delay is implied.
pub trait Schedule {
    fn schedule(&self, job: Job);
}

impl<S: Schedule + ?Sized> Schedule for Rc<S> {
    fn schedule(&self, job: Job) {
        (**self).schedule(job);
    }
}

struct Queue {
    jobs: VecDeque<Job>,
    scheduled: u64,
}

/// Enqueues jobs on a [`Scheduler`] without being able to run them.
///
/// Obtained through [`Scheduler::handle`]. Every deferred value keeps a clone
/// of the handle it was created with, and chained values inherit it.
#[derive(Clone)]
pub struct SchedulerHandle {
    queue: Rc<RefCell<Queue>>,
}

impl Schedule for SchedulerHandle {
    fn schedule(&self, job: Job) {
        let mut queue = self.queue.borrow_mut();
        queue.scheduled += 1;
        queue.jobs.push_back(job);
        trace!(
            seq = queue.scheduled,
            queued = queue.jobs.len(),
            "job scheduled"
        );
    }
}

impl fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("queued", &self.queue.borrow().jobs.len())
            .finish()
    }
}

/// A single-threaded FIFO queue of deferred jobs.
///
/// Nothing runs until one of the `run` methods is called. Each run method
/// releases its hold on the queue before invoking a job, so jobs are free to
/// schedule more work.
pub struct Scheduler {
    handle: SchedulerHandle,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Creates a scheduler with the default [`SchedulerConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Creates a scheduler with a custom [`SchedulerConfig`].
    #[must_use]
    pub fn with_config(config: SchedulerConfig) -> Self {
        let queue = Queue {
            jobs: VecDeque::with_capacity(config.initial_capacity),
            scheduled: 0,
        };
        Scheduler {
            handle: SchedulerHandle {
                queue: Rc::new(RefCell::new(queue)),
            },
            config,
        }
    }

    /// Returns a [`SchedulerHandle`] that deferred values use to enqueue
    /// their callbacks.
    #[must_use]
    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// Number of jobs waiting to run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handle.queue.borrow().jobs.len()
    }

    /// Returns `true` if no job is waiting to run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs the oldest queued job, if any.
    ///
    /// Returns `true` if a job ran.
    pub fn run_next(&self) -> bool {
        match self.pop() {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Runs exactly the jobs that were queued when this method was called.
    ///
    /// Jobs scheduled by those jobs stay queued for the next call, which makes
    /// one call to `run_pending` behave like a single turn of an event loop.
    /// Returns the number of jobs that ran.
    pub fn run_pending(&self) -> usize {
        let ready = self.len();
        let mut ran = 0;
        while ran < ready && self.run_next() {
            ran += 1;
        }
        trace!(ran, left = self.len(), "pending jobs ran");
        ran
    }

    /// Runs jobs until the queue is empty, including jobs scheduled along the
    /// way.
    ///
    /// Returns the number of jobs that ran.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::JobLimitReached`] if
    /// [`SchedulerConfig::max_jobs_per_run`] jobs ran and the queue is still
    /// not empty. The remaining jobs stay queued.
    pub fn run_all(&self) -> Result<usize, RunError> {
        let mut ran = 0;
        loop {
            if let Some(limit) = self.config.max_jobs_per_run {
                if ran >= limit && !self.is_empty() {
                    return Err(RunError::JobLimitReached {
                        limit,
                        remaining: self.len(),
                    });
                }
            }
            if !self.run_next() {
                break;
            }
            ran += 1;
        }
        trace!(ran, "scheduler idle");
        Ok(ran)
    }

    // The borrow must end before the job runs: jobs schedule more jobs.
    fn pop(&self) -> Option<Job> {
        self.handle.queue.borrow_mut().jobs.pop_front()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Schedule for Scheduler {
    fn schedule(&self, job: Job) {
        self.handle.schedule(job);
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("queued", &self.len())
            .field("config", &self.config)
            .finish()
    }
}
