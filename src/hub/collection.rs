use std::sync::Arc;

use super::StoreHub;
use crate::error::{Result, SyncError};
use crate::store::{DispatchableStore, StoreScope};

/// Insertion-ordered [`StoreHub`] that enforces a single scope.
///
/// ```
/// use storesync::hub::{StoreCollection, StoreHub};
/// use storesync::store::{Store, StoreScope};
///
/// let mut hub = StoreCollection::new(StoreScope::GlobalStore);
/// hub.add(Store::new("FeatureFlagStore", StoreScope::GlobalStore, 0u8).unwrap()).unwrap();
/// assert_eq!(hub.get_all_stores().len(), 1);
/// ```
pub struct StoreCollection {
    scope: StoreScope,
    stores: Vec<Arc<dyn DispatchableStore>>,
}

impl StoreCollection {
    pub fn new(scope: StoreScope) -> Self {
        Self {
            scope,
            stores: Vec::new(),
        }
    }

    /// Add a store. Its scope must match the hub's.
    pub fn add<S>(&mut self, store: S) -> Result<()>
    where
        S: DispatchableStore + 'static,
    {
        self.add_shared(Arc::new(store))
    }

    pub fn add_shared(&mut self, store: Arc<dyn DispatchableStore>) -> Result<()> {
        if store.scope() != self.scope {
            return Err(SyncError::ScopeMismatch {
                store_id: store.id().to_string(),
                expected: self.scope,
                found: store.scope(),
            });
        }
        self.stores.push(store);
        Ok(())
    }

    pub fn get_store(&self, id: &str) -> Option<Arc<dyn DispatchableStore>> {
        self.stores.iter().find(|s| s.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl StoreHub for StoreCollection {
    fn get_all_stores(&self) -> Vec<Arc<dyn DispatchableStore>> {
        self.stores.clone()
    }

    fn get_store_type(&self) -> StoreScope {
        self.scope
    }
}
