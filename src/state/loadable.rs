//! Tri-state results and the cells that hold them.

use tokio::sync::watch;

/// Call-state of an asynchronous read.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    /// No result yet.
    Loading,
    /// The latest read succeeded.
    Success(T),
    /// The latest read failed; carries a user-facing reason.
    Error(String),
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::Loading
    }
}

impl<T> Loadable<T> {
    /// Value of a successful read.
    pub fn success(&self) -> Option<&T> {
        match self {
            Loadable::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Still waiting for the first result.
    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    /// Map the success value, keeping the call-state.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loadable<U> {
        match self {
            Loadable::Loading => Loadable::Loading,
            Loadable::Success(value) => Loadable::Success(f(value)),
            Loadable::Error(reason) => Loadable::Error(reason),
        }
    }
}

/// Shared slot holding the latest [`Loadable`] for one kind of value.
///
/// Writes replace the whole value at once, so readers always observe a
/// complete value and concurrent writers resolve as last-write-wins.
#[derive(Debug)]
pub struct ResultCell<T> {
    tx: watch::Sender<Loadable<T>>,
}

impl<T> Default for ResultCell<T> {
    fn default() -> Self {
        Self::new(Loadable::Loading)
    }
}

impl<T> ResultCell<T> {
    /// Create a cell holding `initial`.
    pub fn new(initial: Loadable<T>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Replace the value, returning the previous one.
    pub fn replace(&self, value: Loadable<T>) -> Loadable<T> {
        self.tx.send_replace(value)
    }

    /// Record a failed read without discarding a last-known-good value.
    ///
    /// Only a cell still in [`Loadable::Loading`] moves to
    /// [`Loadable::Error`]; returns whether the cell changed.
    pub fn fail_if_loading(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        self.tx.send_if_modified(|current| {
            if current.is_loading() {
                *current = Loadable::Error(reason);
                true
            } else {
                false
            }
        })
    }

    /// Watch the cell for updates.
    pub fn subscribe(&self) -> watch::Receiver<Loadable<T>> {
        self.tx.subscribe()
    }
}

impl<T: Clone> ResultCell<T> {
    /// Clone the current value.
    pub fn get(&self) -> Loadable<T> {
        self.tx.borrow().clone()
    }

    /// Clone the current success value, if any.
    pub fn latest(&self) -> Option<T> {
        self.tx.borrow().success().cloned()
    }
}
