//! Latest-value container with first-value wakeups.

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use tokio::sync::Notify;

struct Shared<T> {
    value: ArcSwapOption<T>,
    changed: Notify,
}

impl<T> Shared<T> {
    fn new(initial: Option<T>) -> Arc<Self> {
        Arc::new(Self {
            value: ArcSwapOption::new(initial.map(Arc::new)),
            changed: Notify::new(),
        })
    }
}

/// Read half of a slowly-changing fact.
///
/// Cloning is cheap; every clone observes the same snapshot.
pub struct ReactiveValue<T> {
    shared: Arc<Shared<T>>,
}

/// Write half. Exactly one exists per value.
pub struct Publisher<T> {
    shared: Arc<Shared<T>>,
}

/// Create an empty value. Readers wait until the publisher sets it.
pub fn channel<T>() -> (Publisher<T>, ReactiveValue<T>) {
    let shared = Shared::new(None);
    (
        Publisher {
            shared: shared.clone(),
        },
        ReactiveValue { shared },
    )
}

/// Create a value that is readable immediately.
pub fn with_initial<T>(initial: T) -> (Publisher<T>, ReactiveValue<T>) {
    let shared = Shared::new(Some(initial));
    (
        Publisher {
            shared: shared.clone(),
        },
        ReactiveValue { shared },
    )
}

impl<T: Clone + Send + Sync + 'static> ReactiveValue<T> {
    /// A value that never changes.
    pub fn constant(value: T) -> Self {
        let (_, reader) = with_initial(value);
        reader
    }

    /// Latest value, suspending until one has been published.
    pub async fn read(&self) -> T {
        loop {
            let changed = self.shared.changed.notified();
            tokio::pin!(changed);
            // Register before checking so a set() in between is not missed.
            changed.as_mut().enable();

            if let Some(current) = self.shared.value.load_full() {
                return (*current).clone();
            }
            changed.await;
        }
    }

    /// Latest value without waiting.
    pub fn latest(&self) -> Option<T> {
        self.shared.value.load_full().map(|current| (*current).clone())
    }

    /// Derive a value recomputed from every upstream update.
    ///
    /// Bursts of updates may be coalesced: the derived value only tracks the
    /// latest upstream value. Must be called within a Tokio runtime.
    ///
    /// The forwarding task holds the upstream value. It notices that every
    /// derived reader is gone on the next upstream update and ends there, so
    /// a derived value of an upstream that never changes again keeps its task
    /// parked until the runtime shuts down.
    pub fn map<U, F>(&self, f: F) -> ReactiveValue<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let (publisher, derived) = channel();
        let upstream = self.shared.clone();

        tokio::spawn(async move {
            loop {
                let changed = upstream.changed.notified();
                tokio::pin!(changed);
                changed.as_mut().enable();

                if !publisher.has_readers() {
                    break;
                }
                if let Some(current) = upstream.value.load_full() {
                    publisher.set(f(current.as_ref()));
                }
                changed.await;
            }
        });

        derived
    }
}

impl<T> Clone for ReactiveValue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ReactiveValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveValue")
            .field("current", &self.shared.value.load_full())
            .finish()
    }
}

impl<T> Publisher<T> {
    /// Replace the current value and wake pending readers.
    pub fn set(&self, value: T) {
        self.shared.value.store(Some(Arc::new(value)));
        self.shared.changed.notify_waiters();
    }

    /// Another read handle onto this value.
    pub fn subscribe(&self) -> ReactiveValue<T> {
        ReactiveValue {
            shared: self.shared.clone(),
        }
    }

    /// Whether any read handle is still alive.
    pub fn has_readers(&self) -> bool {
        Arc::strong_count(&self.shared) > 1
    }
}
