//! # storesync
//!
//! Cross-context store synchronization for browser extensions.
//!
//! The background process owns the canonical state in [`Store`]s. Every other
//! execution context (content scripts, DevTools panels, popups) shares no
//! memory with it and holds a read-only [`StoreProxy`] mirror instead. State
//! flows one way, as serialized messages over a [`Transport`]:
//!
//! ## Background side
//!
//! - [`Store<T>`] - state container with ordered change listeners
//! - [`StoreCollection`] - a homogeneous hub of stores sharing one
//!   [`StoreScope`]
//! - [`StateDispatcher`] - broadcasts every store change, plus one eager
//!   bootstrap broadcast per store
//! - [`BrowserMessageBroadcasterFactory`] - all-tabs and tab-specific
//!   broadcasters over a transport
//!
//! ## Remote side
//!
//! - [`StoreUpdateMessageHub`] - validates incoming [`StoreUpdateMessage`]s
//!   and routes each to the one listener registered for its store
//! - [`StoreProxy<T>`] - cached mirror that notifies only on real changes
//! - [`ClientStoresHub`] - the set of proxies one UI surface reads
//!
//! Delivery is best effort: there is no acknowledgement or retry, and a
//! remote context may briefly observe stale state.

pub mod config;
pub mod dispatcher;
pub mod distributor;
pub mod error;
pub mod hub;
pub mod message;
pub mod proxy;
pub mod store;
pub mod tab_context;
pub mod transport;

// Re-export main types for convenience
pub use config::SyncConfig;
pub use dispatcher::{broadcaster, Broadcaster, BrowserMessageBroadcasterFactory, StateDispatcher};
pub use distributor::{store_update_listener, StoreUpdateListener, StoreUpdateMessageHub};
pub use error::{Result, SyncError, TransportError};
pub use hub::{ClientStore, ClientStoresHub, StoreCollection, StoreHub};
pub use message::{StoreUpdateMessage, TabId, STORE_UPDATE_MESSAGE_TYPE};
pub use proxy::StoreProxy;
pub use store::{change_listener, BaseStore, ChangeListener, DispatchableStore, Store, StoreScope};
pub use tab_context::{TabContext, TabContextManager};
pub use transport::{message_handler, InMemoryTransport, MessageHandler, Transport};
