//! Single-assignment deferred values with chaining and aggregation.
//!
//! `deferred` provides a [`Deferred`] container for a result that becomes
//! available later. Continuations are registered against it before or after
//! it settles and run exactly once, in registration order, when it does.
//! Every continuation is delivered through an injectable [`Schedule`]
//! implementation and never inline, so registering a continuation always
//! returns before that continuation runs.
//!
//! Features include:
//! - [`Deferred::then`] with `and_then`, `catch` and `chain` shorthands,
//!   including adoption of deferred values returned from handlers
//! - [`Deferred::resolve`], [`Deferred::reject`] and [`Deferred::adopt`]
//!   constructors
//! - [`all`] and [`race`] combinators
//! - A FIFO [`Scheduler`] that owns the job queue and decides when jobs run
//! - A [`Settled`] future for awaiting a deferred value from
//!   any executor
//!
//! Everything is single-threaded: deferred values are `!Send` and all
//! asynchrony comes from the scheduler queue.

pub mod combinators;
pub mod config;
pub mod deferred;
pub mod error;
pub mod resolution;
pub mod scheduler;
pub mod state;
pub mod wait;

pub use combinators::{all, race};
pub use config::SchedulerConfig;
pub use deferred::{Deferred, Settler};
pub use error::{RunError, WaitError};
pub use resolution::{IntoResolution, Resolution, identity, rethrow};
pub use scheduler::{Job, Schedule, Scheduler, SchedulerHandle};
pub use state::State;
pub use wait::Settled;
