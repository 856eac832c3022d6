//! Aggregation over several deferred values.
//!
//! Both combinators register one continuation on every input and settle a
//! single output value. The output follows the usual rule that only its
//! first settlement counts, so inputs that settle after the outcome is fixed
//! are still observed but change nothing.

use std::{cell::RefCell, rc::Rc};

use tracing::debug;

use crate::{Deferred, Schedule};

struct Gather<T> {
    slots: Vec<Option<T>>,
    remaining: usize,
}

/// Waits for every input to fulfill.
///
/// The output fulfills with the inputs' values in input order, no matter in
/// which order they settled. It rejects with the reason of the first input to
/// reject. An empty input fulfills with an empty `Vec`.
///
/// # Example
/// ```
/// # use deferred::{Deferred, Scheduler, all};
/// let scheduler = Scheduler::new();
/// let handle = scheduler.handle();
///
/// let values = all(&handle, [
///     Deferred::<u8, ()>::resolve(&handle, 1),
///     Deferred::resolve(&handle, 2),
/// ]);
/// scheduler.run_all().unwrap();
/// assert_eq!(values.peek(), Some(Ok(vec![1, 2])));
/// ```
pub fn all<S, T, E, I>(scheduler: &S, values: I) -> Deferred<Vec<T>, E>
where
    S: Schedule + Clone + 'static,
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = Deferred<T, E>>,
{
    let values: Vec<_> = values.into_iter().collect();
    let (output, settler) = Deferred::<Vec<T>, E>::pending(scheduler);
    if values.is_empty() {
        settler.fulfill(Vec::new());
        return output;
    }

    let gather = Rc::new(RefCell::new(Gather {
        slots: vec![None; values.len()],
        remaining: values.len(),
    }));
    for (index, input) in values.into_iter().enumerate() {
        let gather = Rc::clone(&gather);
        let settler = settler.clone();
        input.subscribe(Box::new(move |outcome| match outcome {
            Ok(value) => {
                let complete: Vec<T> = {
                    let mut gather = gather.borrow_mut();
                    gather.slots[index] = Some(value);
                    gather.remaining -= 1;
                    if gather.remaining > 0 {
                        return;
                    }
                    gather.slots.iter_mut().filter_map(Option::take).collect()
                };
                debug!("all inputs fulfilled");
                settler.fulfill(complete);
            }
            Err(reason) => settler.reject(reason),
        }));
    }
    output
}

/// Settles like whichever input settles first.
///
/// Inputs that settle within the same scheduler turn are ordered by the jobs
/// that deliver their outcomes. An empty input never settles.
pub fn race<S, T, E, I>(scheduler: &S, values: I) -> Deferred<T, E>
where
    S: Schedule + Clone + 'static,
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = Deferred<T, E>>,
{
    let (output, settler) = Deferred::<T, E>::pending(scheduler);
    for input in values {
        let settler = settler.clone();
        input.subscribe(Box::new(move |outcome| match outcome {
            Ok(value) => settler.fulfill(value),
            Err(reason) => settler.reject(reason),
        }));
    }
    output
}
