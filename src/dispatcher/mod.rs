//! Background-side broadcasting of store state.
//!
//! A [`StateDispatcher`] subscribes to every store of a hub and hands a fresh
//! [`StoreUpdateMessage`] to its [`Broadcaster`] on every change. The
//! [`BrowserMessageBroadcasterFactory`] builds broadcasters that push those
//! messages through a [`Transport`](crate::transport::Transport), either to
//! every tab (global stores) or to one tab (per-tab stores).

mod factory;
mod state_dispatcher;

pub use factory::BrowserMessageBroadcasterFactory;
pub use state_dispatcher::StateDispatcher;

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::message::StoreUpdateMessage;

/// Sends one store update out of the background context.
///
/// An `Err` is logged by the dispatcher and never stops later broadcasts.
pub type Broadcaster = Arc<dyn Fn(StoreUpdateMessage<Value>) -> Result<()> + Send + Sync>;

/// Wrap a closure as a [`Broadcaster`].
pub fn broadcaster<F>(f: F) -> Broadcaster
where
    F: Fn(StoreUpdateMessage<Value>) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}
