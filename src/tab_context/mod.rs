//! Per-tab background state.
//!
//! Each browser tab gets its own hub of tab-scoped stores and a dispatcher
//! whose broadcaster stamps that tab's id on every update. The
//! [`TabContextManager`] creates contexts as tabs attach and drops them as
//! tabs close. Dropping a context drops its dispatcher, which detaches it
//! from the stores.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::dispatcher::{BrowserMessageBroadcasterFactory, StateDispatcher};
use crate::error::Result;
use crate::hub::{StoreCollection, StoreHub};
use crate::message::TabId;

/// The stores of one tab together with their dispatcher.
pub struct TabContext {
    tab_id: TabId,
    stores: Arc<StoreCollection>,
    dispatcher: StateDispatcher,
}

impl TabContext {
    /// Wire `stores` to a tab-specific broadcaster and emit their initial
    /// state.
    pub fn create(
        tab_id: TabId,
        stores: StoreCollection,
        broadcasters: &BrowserMessageBroadcasterFactory,
    ) -> Result<Self> {
        let stores = Arc::new(stores);
        let dispatcher = StateDispatcher::new(
            broadcasters.create_tab_specific_broadcaster(tab_id),
            Arc::clone(&stores) as Arc<dyn StoreHub>,
        );
        dispatcher.initialize()?;

        Ok(Self {
            tab_id,
            stores,
            dispatcher,
        })
    }

    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    pub fn stores(&self) -> &StoreCollection {
        &self.stores
    }

    pub fn dispatcher(&self) -> &StateDispatcher {
        &self.dispatcher
    }
}

/// Tab contexts keyed by tab id.
#[derive(Default)]
pub struct TabContextManager {
    contexts: HashMap<TabId, TabContext>,
}

impl TabContextManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `context` unless its tab already has one. Returns whether the
    /// context was added.
    pub fn add_tab_context_if_not_exists(&mut self, context: TabContext) -> bool {
        let tab_id = context.tab_id();
        if self.contexts.contains_key(&tab_id) {
            return false;
        }
        self.contexts.insert(tab_id, context);
        debug!("[TabContextManager] added tab {}", tab_id);
        true
    }

    pub fn get_tab_context(&self, tab_id: TabId) -> Option<&TabContext> {
        self.contexts.get(&tab_id)
    }

    /// Forget a closed tab.
    pub fn delete_tab_context(&mut self, tab_id: TabId) -> Option<TabContext> {
        let removed = self.contexts.remove(&tab_id);
        if removed.is_some() {
            debug!("[TabContextManager] removed tab {}", tab_id);
        }
        removed
    }

    pub fn tab_ids(&self) -> Vec<TabId> {
        let mut ids: Vec<TabId> = self.contexts.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
