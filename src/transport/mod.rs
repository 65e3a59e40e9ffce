//! The message transport seam.
//!
//! Physical delivery between execution contexts belongs to the host (the
//! browser's extension messaging). [`Transport`] captures the contract the
//! synchronization layer relies on; [`InMemoryTransport`] is a loopback
//! implementation for tests and single-process embedding.

mod memory;

pub use memory::InMemoryTransport;

use std::sync::Arc;

use serde_json::Value;

use crate::error::TransportError;
use crate::message::TabId;

/// Handler for every raw message arriving in a context.
pub type MessageHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Wrap a closure as a [`MessageHandler`].
pub fn message_handler<F>(f: F) -> MessageHandler
where
    F: Fn(&Value) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Cross-context message delivery.
///
/// Sends may fail at any time (a tab closing mid-flight is normal); callers
/// must treat failures as recoverable.
pub trait Transport: Send + Sync {
    /// Deliver `message` to the contexts running inside tab `tab_id`.
    fn send_message_to_tab(&self, tab_id: TabId, message: &Value) -> Result<(), TransportError>;

    /// Deliver `message` to every extension frame (panels, popups).
    fn send_message_to_frames(&self, message: &Value) -> Result<(), TransportError>;

    /// Ids of all currently open tabs.
    fn tabs_query(&self) -> Result<Vec<TabId>, TransportError>;

    fn add_listener_on_message(&self, handler: MessageHandler);

    /// Handlers are matched by `Arc` identity.
    fn remove_listener_on_message(&self, handler: &MessageHandler);
}

pub(crate) fn same_handler(a: &MessageHandler, b: &MessageHandler) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
