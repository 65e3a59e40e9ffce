//! Collections of stores.
//!
//! Background side: a [`StoreHub`] is a homogeneous set of stores sharing one
//! [`StoreScope`], enumerated by the
//! [`StateDispatcher`](crate::dispatcher::StateDispatcher).
//!
//! Remote side: a [`ClientStoresHub`] groups the proxies a UI surface reads
//! from so it can subscribe to all of them at once.

mod client;
mod collection;

pub use client::{ClientStore, ClientStoresHub};
pub use collection::StoreCollection;

use std::sync::Arc;

use crate::store::{DispatchableStore, StoreScope};

/// A homogeneous group of background stores.
pub trait StoreHub: Send + Sync {
    /// All stores of this hub, in a stable order.
    fn get_all_stores(&self) -> Vec<Arc<dyn DispatchableStore>>;

    /// The scope shared by every store in the hub.
    fn get_store_type(&self) -> StoreScope;
}
