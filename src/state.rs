use std::fmt;

/// Settlement state of a promise. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State<T, E> {
    Pending,
    Fulfilled(T),
    Rejected(E),
}

impl<T, E> State<T, E> {
    pub fn kind(&self) -> StateKind {
        match self {
            State::Pending => StateKind::Pending,
            State::Fulfilled(_) => StateKind::Fulfilled,
            State::Rejected(_) => StateKind::Rejected,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, State::Pending)
    }

    /// The settled outcome, or `None` while pending.
    pub fn outcome(&self) -> Option<Result<T, E>>
    where
        T: Clone,
        E: Clone,
    {
        match self {
            State::Pending => None,
            State::Fulfilled(value) => Some(Ok(value.clone())),
            State::Rejected(reason) => Some(Err(reason.clone())),
        }
    }
}

impl<T, E> From<Result<T, E>> for State<T, E> {
    fn from(outcome: Result<T, E>) -> Self {
        match outcome {
            Ok(value) => State::Fulfilled(value),
            Err(reason) => State::Rejected(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Pending,
    Fulfilled,
    Rejected,
}

impl StateKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            StateKind::Pending => "pending",
            StateKind::Fulfilled => "fulfilled",
            StateKind::Rejected => "rejected",
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot returned by [`Promise::inspect`](crate::Promise::inspect).
///
/// `value` is present only when fulfilled and `reason` only when rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection<T, E> {
    pub state: StateKind,
    pub value: Option<T>,
    pub reason: Option<E>,
}

impl<T: Clone, E: Clone> From<&State<T, E>> for Inspection<T, E> {
    fn from(state: &State<T, E>) -> Self {
        let (value, reason) = match state {
            State::Pending => (None, None),
            State::Fulfilled(value) => (Some(value.clone()), None),
            State::Rejected(reason) => (None, Some(reason.clone())),
        };
        Inspection {
            state: state.kind(),
            value,
            reason,
        }
    }
}
