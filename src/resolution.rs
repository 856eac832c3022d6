//! What a handler hands back to the chain.
//!
//! A `then` handler either produces a value, fails with a reason, or returns
//! another [`Deferred`] whose outcome the chain should adopt. All three are
//! captured by [`Resolution`]; [`IntoResolution`] lets handlers return the
//! natural Rust type instead of building a `Resolution` by hand:
//!
//! - `Result<U, E>`: `Ok` fulfills, `Err` rejects (the "throw" case).
//! - `Deferred<U, E>`: the chain adopts its eventual outcome.
//! - `Resolution<U, E>`: used as is.

use crate::Deferred;

/// Outcome produced by a handler, before it is applied to a chained value.
pub enum Resolution<T, E> {
    /// Fulfill with a plain value.
    Fulfill(T),
    /// Reject with a reason.
    Reject(E),
    /// Settle the same way the given deferred value eventually settles.
    Adopt(Deferred<T, E>),
}

/// Conversion from a handler's return value into a [`Resolution`].
///
/// The rejection type `E` is a parameter rather than an associated type so
/// the error half of an `Ok(..)` literal is inferred from the chain it is
/// returned into.
pub trait IntoResolution<E> {
    /// Fulfillment type of the resolution.
    type Value;

    fn into_resolution(self) -> Resolution<Self::Value, E>;
}

impl<T, E> IntoResolution<E> for Resolution<T, E> {
    type Value = T;

    fn into_resolution(self) -> Resolution<T, E> {
        self
    }
}

impl<T, E> IntoResolution<E> for Result<T, E> {
    type Value = T;

    fn into_resolution(self) -> Resolution<T, E> {
        match self {
            Ok(value) => Resolution::Fulfill(value),
            Err(reason) => Resolution::Reject(reason),
        }
    }
}

impl<T, E> IntoResolution<E> for Deferred<T, E> {
    type Value = T;

    fn into_resolution(self) -> Resolution<T, E> {
        Resolution::Adopt(self)
    }
}

/// Default fulfillment handler: passes the value down the chain unchanged.
pub fn identity<T, E>(value: T) -> Result<T, E> {
    Ok(value)
}

/// Default rejection handler: passes the reason down the chain unchanged.
pub fn rethrow<T, E>(reason: E) -> Result<T, E> {
    Err(reason)
}
