//! Observable state cells
//!
//! `Signal<T>` is a publish-on-write cell: every write runs the registered
//! subscriber callbacks and wakes any task waiting on the value.
//! `Computed<T>` derives a value from a fixed list of inputs and republishes
//! whenever one of them is written.
//!
//! Locks are only held while a value is read or replaced. Callbacks run
//! with no lock held, so a callback may freely read or write other signals
//! (or the one that triggered it).

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

// =============================================================================
// Signal
// =============================================================================

/// Shared observable value. Cloning yields another handle to the same cell.
pub struct Signal<T> {
    inner: Arc<SignalInner<T>>,
}

struct SignalInner<T> {
    value: RwLock<T>,
    subscribers: Mutex<Vec<(u64, Callback<T>)>>,
    next_id: AtomicU64,
    /// Bumped on every publish; async waiters park on this.
    version: watch::Sender<u64>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&*self.inner.value.read()).finish()
    }
}

impl<T: Default + Clone + Send + Sync + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + Sync + 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(SignalInner {
                value: RwLock::new(value),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                version,
            }),
        }
    }

    /// Current value (cloned)
    pub fn get(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Borrow the current value without cloning it
    pub fn with<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        f(&self.inner.value.read())
    }

    /// Replace the value and publish
    pub fn set(&self, value: T) {
        self.set_quiet(value);
        self.notify();
    }

    /// Mutate the value in place and publish
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.write());
        self.notify();
    }

    /// Replace the value without publishing. Callers must follow up with
    /// [`Signal::notify`] once their batch of writes is complete.
    pub(crate) fn set_quiet(&self, value: T) {
        *self.inner.value.write() = value;
    }

    /// Publish the current value to subscribers and waiters.
    pub(crate) fn notify(&self) {
        let snapshot = self.get();
        self.inner.version.send_modify(|v| *v = v.wrapping_add(1));

        let callbacks: Vec<Callback<T>> = self
            .inner
            .subscribers
            .lock()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for cb in callbacks {
            cb(&snapshot);
        }
    }

    /// Run `f` after every write. Dropping the returned [`Subscription`]
    /// removes the callback.
    pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.lock().push((id, Arc::new(f)));

        let weak: Weak<SignalInner<T>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.lock().retain(|(sid, _)| *sid != id);
            }
        })
    }

    /// Like [`Signal::subscribe`], but only fires when the written value
    /// differs from the last one this subscription saw (starting from the
    /// value at subscription time).
    pub fn subscribe_changes(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription
    where
        T: PartialEq,
    {
        let last = Mutex::new(self.get());
        self.subscribe(move |value| {
            {
                let mut last = last.lock();
                if *last == *value {
                    return;
                }
                *last = value.clone();
            }
            f(value);
        })
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Wait for the first value (current one included) matching `pred`.
    pub async fn wait_until(&self, pred: impl Fn(&T) -> bool) -> T {
        let mut rx = self.inner.version.subscribe();
        loop {
            {
                let value = self.inner.value.read();
                if pred(&value) {
                    return value.clone();
                }
            }
            // The sender lives as long as `self`, so this never errors here.
            if rx.changed().await.is_err() {
                return self.get();
            }
        }
    }

    /// Wait for the next write and return the value it published.
    pub async fn changed(&self) -> T {
        let mut rx = self.inner.version.subscribe();
        let _ = rx.changed().await;
        self.get()
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Guard for a registered callback; unsubscribes on drop.
#[must_use = "dropping a Subscription immediately unsubscribes it"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

// =============================================================================
// Observable / Computed
// =============================================================================

/// Type-erased change source, so one derived value can depend on signals of
/// different types.
pub trait Observable: Send + Sync {
    fn observe(&self, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription;
}

impl<T: Clone + Send + Sync + 'static> Observable for Signal<T> {
    fn observe(&self, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription {
        self.subscribe(move |_| on_change())
    }
}

/// Value derived from a fixed set of inputs by a pure function.
pub struct Computed<T> {
    output: Signal<T>,
    _inputs: Vec<Subscription>,
}

impl<T: Clone + Send + Sync + 'static> Computed<T> {
    pub fn new(
        inputs: &[&dyn Observable],
        compute: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        let compute = Arc::new(compute);
        let output = Signal::new(compute());

        let recompute: Arc<dyn Fn() + Send + Sync> = {
            let output = output.clone();
            let compute = Arc::clone(&compute);
            Arc::new(move || output.set(compute()))
        };

        let subscriptions = inputs
            .iter()
            .map(|input| input.observe(Arc::clone(&recompute)))
            .collect();

        Self {
            output,
            _inputs: subscriptions,
        }
    }

    pub fn get(&self) -> T {
        self.output.get()
    }

    pub fn with<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        self.output.with(f)
    }

    pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.output.subscribe(f)
    }

    pub async fn wait_until(&self, pred: impl Fn(&T) -> bool) -> T {
        self.output.wait_until(pred).await
    }
}

impl<T: Clone + Send + Sync + 'static> Observable for Computed<T> {
    fn observe(&self, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription {
        self.output.observe(on_change)
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Computed").field(&self.output).finish()
    }
}
