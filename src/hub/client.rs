use std::sync::Arc;

use serde_json::{Map, Value};

use crate::store::ChangeListener;

/// Type-erased read-only store as seen by a UI surface.
pub trait ClientStore: Send + Sync {
    fn id(&self) -> &str;

    /// Current state as JSON, `None` while not yet loaded.
    fn state_value(&self) -> Option<Value>;

    fn add_changed_listener(&self, listener: ChangeListener);

    fn remove_changed_listener(&self, listener: &ChangeListener);
}

/// The set of proxies one UI surface renders from.
#[derive(Clone, Default)]
pub struct ClientStoresHub {
    stores: Vec<Arc<dyn ClientStore>>,
}

impl ClientStoresHub {
    pub fn new(stores: Vec<Arc<dyn ClientStore>>) -> Self {
        Self { stores }
    }

    pub fn add_changed_listener_to_all_stores(&self, listener: ChangeListener) {
        for store in &self.stores {
            store.add_changed_listener(Arc::clone(&listener));
        }
    }

    pub fn remove_changed_listener_from_all_stores(&self, listener: &ChangeListener) {
        for store in &self.stores {
            store.remove_changed_listener(listener);
        }
    }

    pub fn has_stores(&self) -> bool {
        !self.stores.is_empty()
    }

    /// True once every store has received its first state.
    pub fn has_store_data(&self) -> bool {
        self.has_stores() && self.stores.iter().all(|s| s.state_value().is_some())
    }

    pub fn get_store(&self, id: &str) -> Option<Arc<dyn ClientStore>> {
        self.stores.iter().find(|s| s.id() == id).cloned()
    }

    /// Every store's state keyed as `<storeId>Data`, `null` for stores that
    /// have not loaded yet. `None` when the hub has no stores at all.
    pub fn get_all_store_data(&self) -> Option<Map<String, Value>> {
        if !self.has_stores() {
            return None;
        }

        let data = self
            .stores
            .iter()
            .map(|store| {
                (
                    format!("{}Data", store.id()),
                    store.state_value().unwrap_or(Value::Null),
                )
            })
            .collect();
        Some(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{change_listener, ListenerSet};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeStore {
        id: String,
        state: Mutex<Option<Value>>,
        listeners: ListenerSet,
    }

    impl FakeStore {
        fn new(id: &str, state: Option<Value>) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                state: Mutex::new(state),
                listeners: ListenerSet::new(),
            })
        }

        fn fire(&self) {
            self.listeners.emit(&self.id);
        }
    }

    impl ClientStore for FakeStore {
        fn id(&self) -> &str {
            &self.id
        }

        fn state_value(&self) -> Option<Value> {
            self.state.lock().unwrap().clone()
        }

        fn add_changed_listener(&self, listener: ChangeListener) {
            self.listeners.add(listener);
        }

        fn remove_changed_listener(&self, listener: &ChangeListener) {
            self.listeners.remove(listener);
        }
    }

    fn three_stores() -> (Vec<Arc<FakeStore>>, ClientStoresHub) {
        let stores = vec![
            FakeStore::new("store1", Some(json!({ "data": "store1" }))),
            FakeStore::new("store2", Some(json!({}))),
            FakeStore::new("store3", Some(json!({}))),
        ];
        let hub = ClientStoresHub::new(
            stores
                .iter()
                .map(|s| Arc::clone(s) as Arc<dyn ClientStore>)
                .collect(),
        );
        (stores, hub)
    }

    #[test]
    fn add_changed_listener_to_all_stores() {
        let (stores, hub) = three_stores();
        let calls = Arc::new(AtomicUsize::new(0));
        let listener = {
            let calls = calls.clone();
            change_listener(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };

        hub.add_changed_listener_to_all_stores(listener);
        stores.iter().for_each(|s| s.fire());

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn remove_changed_listener_from_all_stores() {
        let (stores, hub) = three_stores();
        let calls = Arc::new(AtomicUsize::new(0));
        let listener = {
            let calls = calls.clone();
            change_listener(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };

        hub.add_changed_listener_to_all_stores(listener.clone());
        hub.remove_changed_listener_from_all_stores(&listener);
        stores.iter().for_each(|s| s.fire());

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_hub() {
        let hub = ClientStoresHub::default();

        assert!(!hub.has_stores());
        assert!(!hub.has_store_data());
        assert!(hub.get_all_store_data().is_none());
        // No stores to attach to: nothing happens.
        hub.add_changed_listener_to_all_stores(change_listener(|| {}));
    }

    #[test]
    fn has_store_data_requires_every_store_loaded() {
        let (stores, hub) = three_stores();
        assert!(hub.has_store_data());

        *stores[2].state.lock().unwrap() = None;
        assert!(!hub.has_store_data());
    }

    #[test]
    fn get_store() {
        let (_stores, hub) = three_stores();

        assert_eq!(
            hub.get_store("store1").unwrap().state_value(),
            Some(json!({ "data": "store1" }))
        );
        assert!(hub.get_store("storeX").is_none());
    }

    #[test]
    fn get_all_store_data_includes_unloaded_as_null() {
        let store1 = FakeStore::new("store1", Some(json!({})));
        let store2 = FakeStore::new("store2", None);
        let hub = ClientStoresHub::new(vec![
            store1 as Arc<dyn ClientStore>,
            store2 as Arc<dyn ClientStore>,
        ]);

        let data = hub.get_all_store_data().unwrap();
        assert_eq!(
            Value::Object(data),
            json!({ "store1Data": {}, "store2Data": null })
        );
    }
}
