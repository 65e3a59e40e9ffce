use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error};

use super::Broadcaster;
use crate::error::{Result, SyncError};
use crate::hub::StoreHub;
use crate::message::StoreUpdateMessage;
use crate::store::{change_listener, ChangeListener, DispatchableStore, StoreScope};

/// Bridges the stores of one hub to the cross-context transport.
///
/// The dispatcher owns its store subscriptions: dropping it removes every
/// listener that `initialize` attached, and later changes are no longer
/// broadcast. Keep it alive for as long as the stores should sync.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use storesync::dispatcher::{broadcaster, StateDispatcher};
/// use storesync::hub::StoreCollection;
/// use storesync::store::{Store, StoreScope};
///
/// let store = Store::new("TabStore", StoreScope::TabContextStore, 0).unwrap();
/// let mut hub = StoreCollection::new(StoreScope::TabContextStore);
/// hub.add(store.clone()).unwrap();
///
/// let sent = Arc::new(Mutex::new(Vec::new()));
/// let sink = sent.clone();
/// let dispatcher = StateDispatcher::new(
///     broadcaster(move |message| {
///         sink.lock().unwrap().push(message.payload);
///         Ok(())
///     }),
///     Arc::new(hub),
/// );
///
/// dispatcher.initialize().unwrap();
/// store.set(1);
/// assert_eq!(*sent.lock().unwrap(), vec![0, 1]);
/// ```
pub struct StateDispatcher {
    broadcast: Broadcaster,
    hub: Arc<dyn StoreHub>,
    initialized: AtomicBool,
    subscriptions: Mutex<Vec<(Arc<dyn DispatchableStore>, ChangeListener)>>,
}

impl StateDispatcher {
    pub fn new(broadcast: Broadcaster, hub: Arc<dyn StoreHub>) -> Self {
        Self {
            broadcast,
            hub,
            initialized: AtomicBool::new(false),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to every store of the hub and broadcast each store's
    /// current state once right away.
    ///
    /// The immediate broadcast lets contexts that attached before this call
    /// receive full state without asking for it. A second call is rejected
    /// so no store ends up with two broadcasting listeners.
    pub fn initialize(&self) -> Result<()> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(SyncError::AlreadyInitialized);
        }

        let store_type = self.hub.get_store_type();
        for store in self.hub.get_all_stores() {
            let listener = self.create_listener(&store, store_type);
            store.add_changed_listener(Arc::clone(&listener));
            self.subscriptions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((store, Arc::clone(&listener)));
            listener();
        }

        debug!("[StateDispatcher] initialized {} hub", store_type);
        Ok(())
    }

    /// Broadcast the current state of one store on demand.
    pub fn rebroadcast(&self, store_id: &str) -> Result<()> {
        let store = self
            .hub
            .get_all_stores()
            .into_iter()
            .find(|s| s.id() == store_id)
            .ok_or_else(|| SyncError::UnknownStore(store_id.to_string()))?;

        dispatch(store.as_ref(), self.hub.get_store_type(), &self.broadcast);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn create_listener(
        &self,
        store: &Arc<dyn DispatchableStore>,
        store_type: StoreScope,
    ) -> ChangeListener {
        // The store owns this listener; a strong reference would be a cycle.
        let store = Arc::downgrade(store);
        let broadcast = Arc::clone(&self.broadcast);

        change_listener(move || {
            if let Some(store) = store.upgrade() {
                dispatch(store.as_ref(), store_type, &broadcast);
            }
        })
    }
}

impl Drop for StateDispatcher {
    fn drop(&mut self) {
        let subscriptions = std::mem::take(
            self.subscriptions
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for (store, listener) in &subscriptions {
            store.remove_changed_listener(listener);
        }
        if !subscriptions.is_empty() {
            debug!(
                "[StateDispatcher] detached from {} stores",
                subscriptions.len()
            );
        }
    }
}

/// Build a message from the store's state as of now and send it.
fn dispatch(store: &dyn DispatchableStore, store_type: StoreScope, broadcast: &Broadcaster) {
    let payload = match store.snapshot() {
        Ok(payload) => payload,
        Err(err) => {
            error!(
                "[StateDispatcher] could not serialize state of `{}`: {}",
                store.id(),
                err
            );
            return;
        }
    };

    let message = StoreUpdateMessage::new(store.id(), store_type, payload);
    if let Err(err) = broadcast(message) {
        error!(
            "[StateDispatcher] broadcast of `{}` failed: {}",
            store.id(),
            err
        );
    }
}
