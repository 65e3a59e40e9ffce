//! Background-side state containers.
//!
//! A [`Store`] owns one piece of application state and a list of change
//! listeners. [`BaseStore`] is the typed contract UI code consumes, shared
//! with remote [`StoreProxy`](crate::proxy::StoreProxy) mirrors.
//! [`DispatchableStore`] is the type-erased view the dispatcher needs to
//! broadcast any store regardless of its state type.

mod listener;
mod scope;
mod store;

pub use listener::{change_listener, ChangeListener};
pub(crate) use listener::{panic_message, ListenerSet};
pub use scope::StoreScope;
pub use store::Store;

use serde_json::Value;

/// The minimal interface every store, background or proxy, satisfies.
pub trait BaseStore: Send + Sync {
    type State;

    fn id(&self) -> &str;

    fn get_state(&self) -> Self::State;

    fn add_changed_listener(&self, listener: ChangeListener);

    /// Removing a listener that was never added is a no-op.
    fn remove_changed_listener(&self, listener: &ChangeListener);
}

/// Type-erased store as seen by a [`StoreHub`](crate::hub::StoreHub).
pub trait DispatchableStore: Send + Sync {
    fn id(&self) -> &str;

    fn scope(&self) -> StoreScope;

    /// Serialize the current state into a value that shares nothing with
    /// the live state.
    fn snapshot(&self) -> serde_json::Result<Value>;

    fn add_changed_listener(&self, listener: ChangeListener);

    fn remove_changed_listener(&self, listener: &ChangeListener);
}
