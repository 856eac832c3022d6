//! Defines the `Deferred` value and its `Settler`.
//!
//! A [`Deferred`] is a single-assignment slot for a result that arrives later.
//! It starts out pending and is settled exactly once, either fulfilled with a
//! value or rejected with a reason. Continuations registered with
//! [`Deferred::then`] (and its shorthands) are queued while the value is
//! pending and delivered through the [`Schedule`] implementation the value was
//! created with, in registration order, once it settles.
//!
//! Delivery is always deferred. A continuation registered on a value that has
//! already settled is still handed to the scheduler instead of running inside
//! the `then` call, so the caller always gets the chained value back before
//! any handler runs.
//!
//! Settling is done through a [`Settler`], the pair of capabilities handed to
//! the setup routine passed to [`Deferred::new`]. Settling an already settled
//! value is silently ignored.

use std::{cell::RefCell, fmt, mem, rc::Rc};

use tracing::{debug, trace, warn};

use crate::{
    Schedule, State,
    resolution::{IntoResolution, Resolution, identity, rethrow},
};

type Reaction<T, E> = Box<dyn FnOnce(Result<T, E>)>;

enum Slot<T, E> {
    Pending(Vec<Reaction<T, E>>),
    Settled(Result<T, E>),
}

struct Inner<T, E> {
    slot: Slot<T, E>,
    // Set once the value is bound to another deferred value's outcome.
    // Only the forwarding continuation may settle it from then on.
    locked: bool,
    // Set by the first registered continuation.
    observed: bool,
}

impl<T, E> Inner<T, E> {
    fn state(&self) -> State {
        match &self.slot {
            Slot::Pending(_) => State::Pending,
            Slot::Settled(Ok(_)) => State::Fulfilled,
            Slot::Settled(Err(_)) => State::Rejected,
        }
    }

    fn settle(&mut self, outcome: Result<T, E>) -> Option<Vec<Reaction<T, E>>> {
        let Slot::Pending(reactions) = &mut self.slot else {
            return None;
        };
        let reactions = mem::take(reactions);
        self.slot = Slot::Settled(outcome);
        Some(reactions)
    }
}

impl<T, E> Drop for Inner<T, E> {
    fn drop(&mut self) {
        if !self.observed && matches!(self.slot, Slot::Settled(Err(_))) {
            warn!("deferred value was rejected but no continuation was ever registered on it");
        }
    }
}

/// A value that becomes available later, or fails to.
///
/// Cloning a `Deferred` is cheap and yields another handle to the same slot.
/// `Deferred` is single-threaded (`!Send`), matching the single-threaded
/// scheduler that drives it.
///
/// # Example
/// ```
/// # use deferred::{Deferred, Scheduler};
/// let scheduler = Scheduler::new();
/// let handle = scheduler.handle();
///
/// let answer = Deferred::<u32, String>::new(&handle, |settler| {
///     settler.fulfill(40);
///     Ok(())
/// })
/// .and_then(|value| Ok(value + 2));
///
/// // Nothing has run yet: handlers are always deferred.
/// assert!(answer.is_pending());
///
/// scheduler.run_all().unwrap();
/// assert_eq!(answer.peek(), Some(Ok(42)));
/// ```
pub struct Deferred<T, E> {
    inner: Rc<RefCell<Inner<T, E>>>,
    scheduler: Rc<dyn Schedule>,
}

/// The settlement capabilities of one [`Deferred`] value.
///
/// Handed to the setup routine of [`Deferred::new`] and returned by
/// [`Deferred::pending`]. A `Settler` can be cloned and moved into jobs or
/// other continuations to settle the value later. Only the first settlement
/// has any effect.
pub struct Settler<T, E> {
    inner: Rc<RefCell<Inner<T, E>>>,
    scheduler: Rc<dyn Schedule>,
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            scheduler: Rc::clone(&self.scheduler),
        }
    }
}

impl<T, E> Clone for Settler<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            scheduler: Rc::clone(&self.scheduler),
        }
    }
}

impl<T, E> Deferred<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Creates a deferred value and runs `executor` synchronously to set it
    /// up.
    ///
    /// The executor receives the value's [`Settler`]. It may settle the value
    /// right away, stash the settler somewhere to settle it later, or do
    /// neither. If the executor returns `Err(reason)` the value is rejected
    /// with `reason`, unless the executor already settled it.
    pub fn new<S, F>(scheduler: &S, executor: F) -> Self
    where
        S: Schedule + Clone + 'static,
        F: FnOnce(Settler<T, E>) -> Result<(), E>,
    {
        let deferred = Self::pending_on(Rc::new(scheduler.clone()));
        let settler = deferred.settler();
        if let Err(reason) = executor(settler.clone()) {
            debug!("executor failed, rejecting");
            settler.reject(reason);
        }
        deferred
    }

    /// Creates a pending deferred value together with its [`Settler`].
    ///
    /// Handy when the code that settles the value is not known at
    /// construction time.
    #[must_use]
    pub fn pending<S>(scheduler: &S) -> (Self, Settler<T, E>)
    where
        S: Schedule + Clone + 'static,
    {
        let deferred = Self::pending_on(Rc::new(scheduler.clone()));
        let settler = deferred.settler();
        (deferred, settler)
    }

    /// Creates a deferred value fulfilled with `value`.
    ///
    /// Continuations still only see the value once the scheduler runs them.
    pub fn resolve<S>(scheduler: &S, value: T) -> Self
    where
        S: Schedule + Clone + 'static,
    {
        Self::new(scheduler, |settler| {
            settler.fulfill(value);
            Ok(())
        })
    }

    /// Creates a deferred value rejected with `reason`.
    pub fn reject<S>(scheduler: &S, reason: E) -> Self
    where
        S: Schedule + Clone + 'static,
    {
        Self::new(scheduler, |settler| {
            settler.reject(reason);
            Ok(())
        })
    }

    /// Creates a deferred value that settles exactly like `source`.
    ///
    /// This is the deferred-input form of [`resolve`](Self::resolve):
    /// `Deferred::adopt(&Deferred::resolve(&h, 5))` behaves like
    /// `Deferred::resolve(&h, 5)`. The new value shares `source`'s scheduler.
    #[must_use]
    pub fn adopt(source: &Deferred<T, E>) -> Self {
        let deferred = Self::pending_on(Rc::clone(&source.scheduler));
        deferred.settler().resolve_with(source.clone());
        deferred
    }

    /// Registers a pair of continuations and returns the value they produce.
    ///
    /// Once this value settles, `on_fulfilled` runs with the value or
    /// `on_rejected` runs with the reason, always from a scheduled job and
    /// never before `then` returns. What the handler returns decides the
    /// outcome of the returned value (see [`IntoResolution`]):
    ///
    /// - `Ok(v)` fulfills it with `v`, `Err(r)` rejects it with `r`;
    /// - a `Deferred` is adopted: the returned value settles the same way
    ///   once that one does, instead of being fulfilled with the `Deferred`
    ///   itself.
    ///
    /// Pass [`identity`] or [`rethrow`] to let one side flow through
    /// unchanged, or use [`and_then`](Self::and_then), [`catch`](Self::catch)
    /// and [`chain`](Self::chain).
    #[must_use]
    pub fn then<F, R, G, H>(&self, on_fulfilled: F, on_rejected: G) -> Deferred<R::Value, E>
    where
        F: FnOnce(T) -> R + 'static,
        R: IntoResolution<E>,
        R::Value: Clone + 'static,
        G: FnOnce(E) -> H + 'static,
        H: IntoResolution<E, Value = R::Value>,
    {
        let next = Deferred::<R::Value, E>::pending_on(Rc::clone(&self.scheduler));
        let settler = next.settler();
        self.subscribe(Box::new(move |outcome| {
            let resolution = match outcome {
                Ok(value) => on_fulfilled(value).into_resolution(),
                Err(reason) => on_rejected(reason).into_resolution(),
            };
            settler.resolve_with(resolution);
        }));
        next
    }

    /// Registers a fulfillment handler only. Rejections pass through
    /// unchanged.
    #[must_use]
    pub fn and_then<F, R>(&self, on_fulfilled: F) -> Deferred<R::Value, E>
    where
        F: FnOnce(T) -> R + 'static,
        R: IntoResolution<E>,
        R::Value: Clone + 'static,
    {
        self.then(on_fulfilled, rethrow::<R::Value, E>)
    }

    /// Registers a rejection handler only. Fulfillment values pass through
    /// unchanged.
    ///
    /// The returned value fulfills with whatever the handler recovers to, or
    /// rejects if the handler fails again.
    #[must_use]
    pub fn catch<G, H>(&self, on_rejected: G) -> Deferred<T, E>
    where
        G: FnOnce(E) -> H + 'static,
        H: IntoResolution<E, Value = T>,
    {
        self.then(identity::<T, E>, on_rejected)
    }

    /// Registers no handler at all: the returned value mirrors this one.
    #[must_use]
    pub fn chain(&self) -> Deferred<T, E> {
        self.then(identity::<T, E>, rethrow::<T, E>)
    }

    /// Current settlement state.
    #[must_use]
    pub fn state(&self) -> State {
        self.inner.borrow().state()
    }

    /// Returns `true` while the value has not settled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state() == State::Pending
    }

    /// Returns a copy of the outcome if the value has settled.
    ///
    /// Peeking does not count as observing a rejection.
    #[must_use]
    pub fn peek(&self) -> Option<Result<T, E>> {
        match &self.inner.borrow().slot {
            Slot::Pending(_) => None,
            Slot::Settled(outcome) => Some(outcome.clone()),
        }
    }

    fn pending_on(scheduler: Rc<dyn Schedule>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                slot: Slot::Pending(Vec::new()),
                locked: false,
                observed: false,
            })),
            scheduler,
        }
    }

    fn settler(&self) -> Settler<T, E> {
        Settler {
            inner: Rc::clone(&self.inner),
            scheduler: Rc::clone(&self.scheduler),
        }
    }

    // Queues `reaction` while pending, otherwise schedules it right away with
    // a copy of the outcome.
    pub(crate) fn subscribe(&self, reaction: Reaction<T, E>) {
        let outcome = {
            let mut inner = self.inner.borrow_mut();
            inner.observed = true;
            match &mut inner.slot {
                Slot::Pending(reactions) => {
                    reactions.push(reaction);
                    trace!(queued = reactions.len(), "continuation registered");
                    return;
                }
                Slot::Settled(outcome) => outcome.clone(),
            }
        };
        trace!("continuation registered on settled value");
        self.scheduler.schedule(Box::new(move || reaction(outcome)));
    }
}

impl<T, E> Settler<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Fulfills the value with `value`. No effect if it already settled.
    pub fn fulfill(&self, value: T) {
        self.settle_unlocked(Ok(value));
    }

    /// Rejects the value with `reason`. No effect if it already settled.
    pub fn reject(&self, reason: E) {
        self.settle_unlocked(Err(reason));
    }

    /// Settles the value from a handler-style result.
    ///
    /// A plain `Result` settles right away. A `Deferred` is adopted: this
    /// value settles the same way once that one does, and every other
    /// settlement attempt made in the meantime is ignored.
    pub fn resolve_with<R>(&self, resolution: R)
    where
        R: IntoResolution<E, Value = T>,
    {
        match resolution.into_resolution() {
            Resolution::Fulfill(value) => self.fulfill(value),
            Resolution::Reject(reason) => self.reject(reason),
            Resolution::Adopt(source) => {
                if Rc::ptr_eq(&source.inner, &self.inner) {
                    debug!("adoption of itself ignored, value stays pending");
                    return;
                }
                {
                    let mut inner = self.inner.borrow_mut();
                    if inner.locked || inner.state().is_settled() {
                        debug!("adoption ignored, value already resolved");
                        return;
                    }
                    inner.locked = true;
                }
                trace!("adopting outcome of another deferred value");
                let settler = self.clone();
                source.subscribe(Box::new(move |outcome| settler.settle(outcome)));
            }
        }
    }

    /// Current settlement state of the value this settler belongs to.
    #[must_use]
    pub fn state(&self) -> State {
        self.inner.borrow().state()
    }

    fn settle_unlocked(&self, outcome: Result<T, E>) {
        if self.inner.borrow().locked {
            debug!("settlement ignored, value is adopting another deferred value");
            return;
        }
        self.settle(outcome);
    }

    fn settle(&self, outcome: Result<T, E>) {
        let reactions = self.inner.borrow_mut().settle(outcome.clone());
        let Some(reactions) = reactions else {
            debug!("settlement ignored, value already settled");
            return;
        };
        trace!(
            fulfilled = outcome.is_ok(),
            reactions = reactions.len(),
            "deferred value settled"
        );
        // One job per continuation, in registration order.
        for reaction in reactions {
            let outcome = outcome.clone();
            self.scheduler.schedule(Box::new(move || reaction(outcome)));
        }
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("state", &self.inner.borrow().state())
            .finish_non_exhaustive()
    }
}

impl<T, E> fmt::Debug for Settler<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settler")
            .field("state", &self.inner.borrow().state())
            .finish_non_exhaustive()
    }
}
