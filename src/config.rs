//! Configuration for the [`Scheduler`](crate::Scheduler) queue.

/// Tunables applied when a [`Scheduler`](crate::Scheduler) is created.
///
/// Setters follow the builder style and can be chained:
///
/// ```
/// # use deferred::{Scheduler, SchedulerConfig};
/// let mut config = SchedulerConfig::default();
/// config.initial_capacity(64).max_jobs_per_run(10_000);
///
/// let scheduler = Scheduler::with_config(config);
/// assert!(scheduler.is_empty());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub(crate) initial_capacity: usize,
    pub(crate) max_jobs_per_run: Option<usize>,
}

impl SchedulerConfig {
    /// Capacity reserved up front for the job queue.
    pub fn initial_capacity(&mut self, capacity: usize) -> &mut Self {
        self.initial_capacity = capacity;
        self
    }

    /// Upper bound on the number of jobs a single
    /// [`run_all`](crate::Scheduler::run_all) call may execute.
    ///
    /// Chains that keep scheduling new work forever would otherwise never let
    /// `run_all` return.
    pub fn max_jobs_per_run(&mut self, limit: usize) -> &mut Self {
        self.max_jobs_per_run = Some(limit);
        self
    }

    /// Removes the per-run job limit. This is the default.
    pub fn unlimited(&mut self) -> &mut Self {
        self.max_jobs_per_run = None;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            max_jobs_per_run: None,
        }
    }
}
