use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{Result, SyncError};
use crate::message::{StoreUpdateMessage, TabId, STORE_UPDATE_MESSAGE_TYPE};
use crate::store::{panic_message, StoreScope};
use crate::transport::{message_handler, MessageHandler, Transport};

/// Receives validated updates for one store id.
pub type StoreUpdateListener = Arc<dyn Fn(&StoreUpdateMessage<Value>) + Send + Sync>;

/// Wrap a closure as a [`StoreUpdateListener`].
pub fn store_update_listener<F>(f: F) -> StoreUpdateListener
where
    F: Fn(&StoreUpdateMessage<Value>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Lifecycle of a [`StoreUpdateMessageHub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubState {
    Uninitialized,
    Listening,
    Disposed,
}

struct Lifecycle {
    state: HubState,
    handler: Option<MessageHandler>,
}

/// Validates incoming store updates in a remote context and routes each to
/// the single listener registered for its store.
///
/// Everything arriving on the transport passes through
/// [`on_message`](StoreUpdateMessageHub::on_message). Messages that are not
/// store updates, lack a store id or payload, or are scoped to another tab
/// are dropped without error: the channel is shared with unrelated traffic.
pub struct StoreUpdateMessageHub {
    transport: Arc<dyn Transport>,
    tab_id: RwLock<Option<TabId>>,
    lifecycle: Mutex<Lifecycle>,
    listeners: RwLock<HashMap<String, StoreUpdateListener>>,
}

impl StoreUpdateMessageHub {
    /// Create a hub for a context in tab `tab_id`, or `None` when the tab is
    /// not known (yet).
    pub fn new(transport: Arc<dyn Transport>, tab_id: Option<TabId>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            tab_id: RwLock::new(tab_id),
            lifecycle: Mutex::new(Lifecycle {
                state: HubState::Uninitialized,
                handler: None,
            }),
            listeners: RwLock::new(HashMap::new()),
        })
    }

    /// Attach to the transport. Further calls while listening are no-ops.
    pub fn initialize(self: &Arc<Self>) -> Result<()> {
        let mut lifecycle = self.lifecycle();
        match lifecycle.state {
            HubState::Listening => return Ok(()),
            HubState::Disposed => return Err(SyncError::Disposed),
            HubState::Uninitialized => {}
        }

        let hub = Arc::downgrade(self);
        let handler = message_handler(move |message| {
            if let Some(hub) = hub.upgrade() {
                hub.on_message(message);
            }
        });
        self.transport.add_listener_on_message(Arc::clone(&handler));

        lifecycle.handler = Some(handler);
        lifecycle.state = HubState::Listening;
        debug!("[StoreUpdateMessageHub] listening, tab={:?}", self.tab_id());
        Ok(())
    }

    /// Register the one listener for `store_id`.
    ///
    /// Fails before [`initialize`](Self::initialize), after
    /// [`dispose`](Self::dispose), and when `store_id` already has a
    /// listener. Each of these is a wiring bug that would otherwise leave a
    /// store silently out of sync.
    pub fn register_store_update_listener(
        &self,
        store_id: impl Into<String>,
        listener: StoreUpdateListener,
    ) -> Result<()> {
        match self.state() {
            HubState::Uninitialized => return Err(SyncError::NotInitialized),
            HubState::Disposed => return Err(SyncError::Disposed),
            HubState::Listening => {}
        }

        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        match listeners.entry(store_id.into()) {
            Entry::Occupied(entry) => Err(SyncError::ListenerAlreadyRegistered(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(listener);
                Ok(())
            }
        }
    }

    /// Handle one raw message from the transport.
    pub fn on_message(&self, raw: &Value) {
        if self.state() != HubState::Listening {
            return;
        }

        let Some(message) = self.accept(raw) else {
            return;
        };

        let listener = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&message.store_id)
            .cloned();

        match listener {
            Some(listener) => {
                if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| listener(&message))) {
                    error!(
                        "[StoreUpdateMessageHub] listener for `{}` panicked: {}",
                        message.store_id,
                        panic_message(panic.as_ref())
                    );
                }
            }
            None => debug!(
                "[StoreUpdateMessageHub] no listener for `{}`",
                message.store_id
            ),
        }
    }

    /// Detach from the transport. Safe to call more than once.
    pub fn dispose(&self) {
        let handler = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.state == HubState::Disposed {
                return;
            }
            lifecycle.state = HubState::Disposed;
            lifecycle.handler.take()
        };

        if let Some(handler) = handler {
            self.transport.remove_listener_on_message(&handler);
        }
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn state(&self) -> HubState {
        self.lifecycle().state
    }

    pub fn tab_id(&self) -> Option<TabId> {
        *self.tab_id.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the receiving context's tab once it becomes known.
    pub fn set_tab_id(&self, tab_id: Option<TabId>) {
        *self.tab_id.write().unwrap_or_else(PoisonError::into_inner) = tab_id;
    }

    pub fn has_listener(&self, store_id: &str) -> bool {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(store_id)
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validation, in order: discriminator, store id, payload, envelope
    /// shape, tab scope.
    fn accept(&self, raw: &Value) -> Option<StoreUpdateMessage<Value>> {
        if raw.get("messageType").and_then(Value::as_str) != Some(STORE_UPDATE_MESSAGE_TYPE) {
            return None;
        }

        let has_store_id = raw
            .get("storeId")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.is_empty());
        if !has_store_id {
            debug!("[StoreUpdateMessageHub] dropping update without store id");
            return None;
        }

        if raw.get("payload").map_or(true, Value::is_null) {
            debug!("[StoreUpdateMessageHub] dropping update without payload");
            return None;
        }

        let message = match StoreUpdateMessage::<Value>::deserialize(raw) {
            Ok(message) => message,
            Err(err) => {
                debug!("[StoreUpdateMessageHub] dropping malformed update: {}", err);
                return None;
            }
        };

        if !self.in_scope(&message) {
            debug!(
                "[StoreUpdateMessageHub] dropping `{}` update for tab {:?}",
                message.store_id, message.tab_id
            );
            return None;
        }

        Some(message)
    }

    /// Global updates go everywhere. A tab update is accepted when either
    /// side has no tab yet (the bootstrap broadcast is sent before a tab is
    /// attached) or when the tabs match.
    fn in_scope(&self, message: &StoreUpdateMessage<Value>) -> bool {
        if message.store_type == StoreScope::GlobalStore {
            return true;
        }

        match (message.tab_id, self.tab_id()) {
            (None, _) | (_, None) => true,
            (Some(message_tab), Some(own_tab)) => message_tab == own_tab,
        }
    }
}

impl Drop for StoreUpdateMessageHub {
    fn drop(&mut self) {
        self.dispose();
    }
}
