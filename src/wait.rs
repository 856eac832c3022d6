//! Bridges deferred values into `async` code and lets callers wait on them.
//!
//! [`Deferred::settled`] returns a [`Settled`] future that completes once the
//! deferred value settles. The future does not drive the scheduler: some code
//! still has to run the queue, either before awaiting or from another task on
//! the same thread. Any executor can poll it.
//!
//! For synchronous callers [`Scheduler::block_on`] runs the queue to idle and
//! reports the outcome directly.

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::{
    FutureExt,
    channel::oneshot::{self, Canceled},
};
use pin_project_lite::pin_project;
use tracing::debug;

use crate::{Deferred, Scheduler, error::WaitError};

pin_project! {
    /// A future that resolves to the outcome of a [`Deferred`] value.
    ///
    /// Resolves to `Ok(value)` on fulfillment, [`WaitError::Rejected`] on
    /// rejection, and [`WaitError::Abandoned`] if the deferred value was
    /// dropped while still pending and nothing else can settle it.
    #[must_use = "futures do nothing unless polled or .awaited"]
    pub struct Settled<T, E> {
        #[pin]
        receiver: oneshot::Receiver<Result<T, E>>,
    }
}

impl<T, E> Future for Settled<T, E> {
    type Output = Result<T, WaitError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project().receiver.poll(cx) {
            Poll::Ready(Ok(Ok(value))) => Poll::Ready(Ok(value)),
            Poll::Ready(Ok(Err(reason))) => Poll::Ready(Err(WaitError::Rejected(reason))),
            Poll::Ready(Err(Canceled)) => Poll::Ready(Err(WaitError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, E> Deferred<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Returns a future that completes when this value settles.
    ///
    /// Registering the future counts as a continuation, so it observes
    /// rejections and follows the usual delivery order.
    ///
    /// # Example
    /// ```
    /// # use deferred::{Deferred, Scheduler};
    /// # use futures::executor::block_on;
    /// let scheduler = Scheduler::new();
    /// let d = Deferred::<&str, ()>::resolve(&scheduler.handle(), "ready");
    ///
    /// let settled = d.settled();
    /// scheduler.run_all().unwrap();
    /// assert_eq!(block_on(settled), Ok("ready"));
    /// ```
    pub fn settled(&self) -> Settled<T, E> {
        let (sender, receiver) = oneshot::channel();
        self.subscribe(Box::new(move |outcome| {
            // The receiving side may have given up waiting.
            let _ = sender.send(outcome);
        }));
        Settled { receiver }
    }
}

impl<T, E> IntoFuture for Deferred<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    type Output = Result<T, WaitError<E>>;
    type IntoFuture = Settled<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.settled()
    }
}

impl Scheduler {
    /// Runs the queue until it is idle and returns the outcome of `deferred`.
    ///
    /// # Errors
    ///
    /// - [`WaitError::Rejected`] if `deferred` rejected.
    /// - [`WaitError::Stalled`] if the queue went idle while `deferred` was
    ///   still pending.
    /// - [`WaitError::Run`] if the configured job limit stopped the run.
    pub fn block_on<T, E>(&self, deferred: &Deferred<T, E>) -> Result<T, WaitError<E>>
    where
        T: Clone + 'static,
        E: Clone + 'static,
    {
        let settled = deferred.settled();
        self.run_all()?;
        settled.now_or_never().unwrap_or_else(|| {
            debug!("scheduler idle with deferred value still pending");
            Err(WaitError::Stalled)
        })
    }
}
