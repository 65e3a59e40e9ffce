use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde_json::Value;

use super::listener::{ChangeListener, ListenerSet};
use super::{BaseStore, DispatchableStore, StoreScope};
use crate::error::{Result, SyncError};

/// A background-owned state container.
///
/// The store holds one piece of application state and notifies its change
/// listeners, in registration order, whenever the owner mutates it through
/// [`set`](Store::set) or [`update`](Store::update). Clones share the same
/// state and listeners.
pub struct Store<T> {
    id: Arc<str>,
    scope: StoreScope,
    state: Arc<RwLock<T>>,
    listeners: ListenerSet,
}

impl<T: Clone> Store<T> {
    /// Create a new store with the given initial state.
    pub fn new(id: impl Into<String>, scope: StoreScope, initial: T) -> Result<Self> {
        let id: String = id.into();
        if id.trim().is_empty() {
            return Err(SyncError::BlankStoreId);
        }

        Ok(Self {
            id: Arc::from(id),
            scope,
            state: Arc::new(RwLock::new(initial)),
            listeners: ListenerSet::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn scope(&self) -> StoreScope {
        self.scope
    }

    /// Get a clone of the current state.
    pub fn get_state(&self) -> T {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read state without cloning it.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state using a function, then notify listeners.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut state);
        }
        self.emit_changed();
    }

    /// Replace the state, then notify listeners.
    pub fn set(&self, new_state: T) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = new_state;
        self.emit_changed();
    }

    pub fn add_changed_listener(&self, listener: ChangeListener) {
        self.listeners.add(listener);
    }

    pub fn remove_changed_listener(&self, listener: &ChangeListener) {
        self.listeners.remove(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Notify all listeners of a state change.
    ///
    /// No lock is held while listeners run, and every listener has returned
    /// by the time this does.
    pub fn emit_changed(&self) {
        self.listeners.emit(&self.id);
    }
}

impl<T: Clone> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            id: Arc::clone(&self.id),
            scope: self.scope,
            state: Arc::clone(&self.state),
            listeners: self.listeners.clone(),
        }
    }
}

impl<T> BaseStore for Store<T>
where
    T: Clone + Send + Sync,
{
    type State = T;

    fn id(&self) -> &str {
        &self.id
    }

    fn get_state(&self) -> T {
        Store::get_state(self)
    }

    fn add_changed_listener(&self, listener: ChangeListener) {
        self.listeners.add(listener);
    }

    fn remove_changed_listener(&self, listener: &ChangeListener) {
        self.listeners.remove(listener);
    }
}

impl<T> DispatchableStore for Store<T>
where
    T: Clone + Serialize + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn scope(&self) -> StoreScope {
        self.scope
    }

    fn snapshot(&self) -> serde_json::Result<Value> {
        self.read(|state| serde_json::to_value(state))
    }

    fn add_changed_listener(&self, listener: ChangeListener) {
        self.listeners.add(listener);
    }

    fn remove_changed_listener(&self, listener: &ChangeListener) {
        self.listeners.remove(listener);
    }
}
