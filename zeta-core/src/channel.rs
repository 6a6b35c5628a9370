//! Latest-value state channels.
//!
//! An [`Observable`] holds the current value of some state together with a
//! version number that grows by one on every publish. Subscribers get a
//! [`Watch`] which replays the current value on its first poll and afterwards
//! only yields values with a newer version. Delivery is pull-based: a watch
//! always sees the most recent value, intermediate values may be coalesced,
//! the final one never is.
use tokio::sync::watch;

#[derive(Debug)]
struct Versioned<T> {
    version: u64,
    value: T,
}

/// Single-writer observable state with replay-of-latest semantics.
#[derive(Debug)]
pub struct Observable<T> {
    tx: watch::Sender<Versioned<T>>,
}

impl<T> Observable<T> {
    pub fn new(value: T) -> Self {
        let (tx, _rx) = watch::channel(Versioned { version: 1, value });
        Self { tx }
    }

    /// Replaces the value and notifies subscribers.
    pub fn publish(&self, value: T) {
        self.tx.send_modify(|current| {
            current.value = value;
            current.version += 1;
        });
    }

    /// Mutates the value in place, then notifies subscribers.
    pub fn modify<F: FnOnce(&mut T)>(&self, f: F) {
        self.tx.send_modify(|current| {
            f(&mut current.value);
            current.version += 1;
        });
    }

    /// Like [`Observable::modify`] but only notifies when `f` reports a change.
    pub fn modify_if<F: FnOnce(&mut T) -> bool>(&self, f: F) -> bool {
        self.tx.send_if_modified(|current| {
            let changed = f(&mut current.value);
            if changed {
                current.version += 1;
            }
            changed
        })
    }

    pub fn version(&self) -> u64 {
        self.tx.borrow().version
    }

    /// Read access to the current value.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow().value)
    }

    pub fn subscribe(&self) -> Watch<T> {
        Watch {
            rx: self.tx.subscribe(),
            seen: None,
        }
    }
}

impl<T: Clone> Observable<T> {
    pub fn latest(&self) -> T {
        self.tx.borrow().value.clone()
    }
}

/// Subscription to an [`Observable`]. Dropping it cancels the subscription.
#[derive(Debug)]
pub struct Watch<T> {
    rx: watch::Receiver<Versioned<T>>,
    seen: Option<u64>,
}

impl<T> Watch<T> {
    /// True if a value newer than the last polled one is available.
    /// A fresh watch always has an update pending.
    pub fn has_update(&self) -> bool {
        self.seen != Some(self.rx.borrow().version)
    }

    /// Runs `f` on the latest value if it has not been seen yet and marks it seen.
    ///
    /// The observable must not be published to from inside `f`.
    pub fn poll_with<R>(&mut self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let current = self.rx.borrow();
        if self.seen == Some(current.version) {
            return None;
        }
        self.seen = Some(current.version);
        Some(f(&current.value))
    }

    /// Forgets the last poll so the next one hands out the latest value again.
    pub fn rewind(&mut self) {
        self.seen = None;
    }

    /// Reads the latest value without marking it seen.
    pub fn peek<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.rx.borrow().value)
    }

    /// Version of the last value handed out by a poll.
    pub fn seen_version(&self) -> Option<u64> {
        self.seen
    }
}

impl<T: Clone> Watch<T> {
    pub fn poll(&mut self) -> Option<T> {
        self.poll_with(T::clone)
    }

    pub fn latest(&self) -> T {
        self.peek(T::clone)
    }
}
