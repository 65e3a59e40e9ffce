use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::distributor::{store_update_listener, StoreUpdateMessageHub};
use crate::error::Result;
use crate::hub::ClientStore;
use crate::message::StoreUpdateMessage;
use crate::store::{BaseStore, ChangeListener, ListenerSet};

/// Local mirror of one background store.
///
/// The proxy registers itself with a [`StoreUpdateMessageHub`] on
/// construction and replaces its cached state whenever an update carries a
/// payload that differs from the cache. Identical rebroadcasts (the
/// dispatcher's bootstrap racing a real change, a panel re-requesting state)
/// do not notify listeners.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use serde_json::json;
/// use storesync::distributor::StoreUpdateMessageHub;
/// use storesync::proxy::StoreProxy;
/// use storesync::transport::InMemoryTransport;
///
/// let transport = InMemoryTransport::new();
/// let hub = StoreUpdateMessageHub::new(Arc::new(transport.for_tab(5)), Some(5));
/// hub.initialize().unwrap();
///
/// let proxy = StoreProxy::<u32>::new("TabStore", &hub).unwrap();
/// assert_eq!(proxy.get_state(), None);
///
/// hub.on_message(&json!({
///     "messageType": "storeUpdate",
///     "storeId": "TabStore",
///     "storeType": "TabContextStore",
///     "payload": 1,
///     "tabId": 5,
/// }));
/// assert_eq!(proxy.get_state(), Some(1));
/// ```
pub struct StoreProxy<T> {
    store_id: String,
    state: RwLock<Option<T>>,
    listeners: ListenerSet,
}

impl<T> StoreProxy<T>
where
    T: DeserializeOwned + PartialEq + Clone + Send + Sync + 'static,
{
    /// Create a proxy for `store_id` and register it with `hub`.
    ///
    /// Fails if the hub is not listening or already has a listener for
    /// `store_id`.
    pub fn new(store_id: impl Into<String>, hub: &StoreUpdateMessageHub) -> Result<Arc<Self>> {
        let proxy = Arc::new(Self {
            store_id: store_id.into(),
            state: RwLock::new(None),
            listeners: ListenerSet::new(),
        });

        let weak = Arc::downgrade(&proxy);
        hub.register_store_update_listener(
            proxy.store_id.clone(),
            store_update_listener(move |message| {
                if let Some(proxy) = weak.upgrade() {
                    proxy.on_change(message);
                }
            }),
        )?;

        Ok(proxy)
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    /// The cached state; `None` until the first update arrives.
    pub fn get_state(&self) -> Option<T> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn add_changed_listener(&self, listener: ChangeListener) {
        self.listeners.add(listener);
    }

    pub fn remove_changed_listener(&self, listener: &ChangeListener) {
        self.listeners.remove(listener);
    }

    /// Apply one validated update.
    pub fn on_change(&self, message: &StoreUpdateMessage<Value>) {
        let incoming: T = match message.decode_payload() {
            Ok(state) => state,
            Err(err) => {
                warn!(
                    "[StoreProxy] discarding undecodable payload for `{}`: {}",
                    self.store_id, err
                );
                return;
            }
        };

        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if state.as_ref() == Some(&incoming) {
                return;
            }
            *state = Some(incoming);
        }

        self.listeners.emit(&self.store_id);
    }
}

impl<T> BaseStore for StoreProxy<T>
where
    T: DeserializeOwned + PartialEq + Clone + Send + Sync + 'static,
{
    type State = Option<T>;

    fn id(&self) -> &str {
        &self.store_id
    }

    fn get_state(&self) -> Option<T> {
        StoreProxy::get_state(self)
    }

    fn add_changed_listener(&self, listener: ChangeListener) {
        self.listeners.add(listener);
    }

    fn remove_changed_listener(&self, listener: &ChangeListener) {
        self.listeners.remove(listener);
    }
}

impl<T> ClientStore for StoreProxy<T>
where
    T: DeserializeOwned + Serialize + PartialEq + Clone + Send + Sync + 'static,
{
    fn id(&self) -> &str {
        &self.store_id
    }

    fn state_value(&self) -> Option<Value> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .as_ref()
            .and_then(|state| serde_json::to_value(state).ok())
    }

    fn add_changed_listener(&self, listener: ChangeListener) {
        self.listeners.add(listener);
    }

    fn remove_changed_listener(&self, listener: &ChangeListener) {
        self.listeners.remove(listener);
    }
}
