//! Observers notified of discovered modules.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use tracing::warn;

use crate::types::ScanResult;

/// Trait for receiving discovery results.
///
/// Called on the discovery task, once per reported module, in registration
/// order. Implementations should return quickly.
pub trait ScanObserver: Send + Sync {
    fn module_found(&self, module: ScanResult);
}

impl<F> ScanObserver for F
where
    F: Fn(ScanResult) + Send + Sync,
{
    fn module_found(&self, module: ScanResult) {
        self(module)
    }
}

/// Forwards every result into an unbounded channel.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ScanResult>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScanResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ScanObserver for ChannelObserver {
    fn module_found(&self, module: ScanResult) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.tx.send(module);
    }
}

/// Ordered, de-duplicated set of observers shared with the discovery task.
#[derive(Clone, Default)]
pub struct ObserverRegistry {
    observers: Arc<RwLock<Vec<Arc<dyn ScanObserver>>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Returns false if it was already registered.
    pub fn add(&self, observer: Arc<dyn ScanObserver>) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        if observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
            return false;
        }
        observers.push(observer);
        true
    }

    /// Unregister an observer. Returns false if it was not registered.
    pub fn remove(&self, observer: &Arc<dyn ScanObserver>) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|o| !Arc::ptr_eq(o, observer));
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify every observer of `module`.
    ///
    /// The list is copied first so observers may register or unregister from
    /// inside the callback. A panicking observer is logged and skipped.
    pub fn notify(&self, module: &ScanResult) {
        let snapshot: Vec<Arc<dyn ScanObserver>> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for observer in snapshot {
            let result = catch_unwind(AssertUnwindSafe(|| observer.module_found(module.clone())));
            if result.is_err() {
                warn!(ip = %module.ip_address, "scan observer panicked");
            }
        }
    }
}
