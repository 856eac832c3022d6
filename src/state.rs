use std::fmt;

/// Settlement state of a [`Deferred`](crate::Deferred) value.
///
/// The only transitions are `Pending -> Fulfilled` and `Pending -> Rejected`.
/// Both targets are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    Pending,
    Fulfilled,
    Rejected,
}

impl State {
    /// Returns `true` for `Fulfilled` and `Rejected`.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        !matches!(self, State::Pending)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Pending => "pending",
            State::Fulfilled => "fulfilled",
            State::Rejected => "rejected",
        };
        f.write_str(name)
    }
}
