use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::error;

/// Callback invoked after a store's state changed.
///
/// Listeners are identified by `Arc` pointer, so keep the handle you
/// registered if you intend to remove it later.
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

/// Wrap a closure as a [`ChangeListener`].
pub fn change_listener<F>(f: F) -> ChangeListener
where
    F: Fn() + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Ordered, shareable list of change listeners.
#[derive(Clone, Default)]
pub(crate) struct ListenerSet {
    listeners: Arc<RwLock<Vec<ChangeListener>>>,
}

impl ListenerSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&self, listener: ChangeListener) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Remove the first registration of `listener`. Unknown listeners are ignored.
    pub(crate) fn remove(&self, listener: &ChangeListener) {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = listeners.iter().position(|l| same_listener(l, listener)) {
            listeners.remove(index);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Invoke every listener in registration order.
    ///
    /// The list is cloned first so listeners may touch the owning store
    /// (including registering or removing listeners) while running. A
    /// panicking listener is logged and the remaining ones still run.
    pub(crate) fn emit(&self, owner: &str) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for listener in listeners {
            if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| listener())) {
                error!(
                    "[Store] change listener for `{}` panicked: {}",
                    owner,
                    panic_message(panic.as_ref())
                );
            }
        }
    }
}

fn same_listener(a: &ChangeListener, b: &ChangeListener) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
