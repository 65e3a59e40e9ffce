use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing::debug;

use super::{same_handler, MessageHandler, Transport};
use crate::config::CONNECTION_ERROR_MESSAGE;
use crate::error::TransportError;
use crate::message::TabId;

struct Registration {
    tab: Option<TabId>,
    handler: MessageHandler,
}

#[derive(Default)]
struct Bus {
    open_tabs: BTreeSet<TabId>,
    registrations: Vec<Registration>,
}

/// Loopback transport connecting contexts within one process.
///
/// Every handle created from the same root shares one bus. A handle from
/// [`for_tab`](InMemoryTransport::for_tab) attaches its listeners to that tab
/// (content scripts); the root handle and
/// [`for_frames`](InMemoryTransport::for_frames) attach extension frames
/// (panels, popups) that receive frame broadcasts.
///
/// Sends with nobody listening fail the same way a browser does, with the
/// "Receiving end does not exist" connection error.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    bus: Arc<Mutex<Bus>>,
    tab: Option<TabId>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for a context living in tab `tab_id`. Opens the tab.
    pub fn for_tab(&self, tab_id: TabId) -> Self {
        self.open_tab(tab_id);
        Self {
            bus: Arc::clone(&self.bus),
            tab: Some(tab_id),
        }
    }

    /// Handle for an extension frame.
    pub fn for_frames(&self) -> Self {
        Self {
            bus: Arc::clone(&self.bus),
            tab: None,
        }
    }

    pub fn open_tab(&self, tab_id: TabId) {
        self.lock().open_tabs.insert(tab_id);
    }

    /// Close a tab, tearing down every listener attached to it.
    pub fn close_tab(&self, tab_id: TabId) {
        let mut bus = self.lock();
        bus.open_tabs.remove(&tab_id);
        bus.registrations.retain(|r| r.tab != Some(tab_id));
    }

    /// Number of attached message handlers across all contexts.
    pub fn listener_count(&self) -> usize {
        self.lock().registrations.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Bus> {
        self.bus.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, target: Option<TabId>, message: &Value) -> Result<(), TransportError> {
        // Handlers run without the bus lock so they may attach or detach.
        let handlers: Vec<MessageHandler> = {
            let bus = self.lock();
            if let Some(tab_id) = target {
                if !bus.open_tabs.contains(&tab_id) {
                    return Err(connection_closed());
                }
            }
            bus.registrations
                .iter()
                .filter(|r| r.tab == target)
                .map(|r| Arc::clone(&r.handler))
                .collect()
        };

        if handlers.is_empty() {
            return Err(connection_closed());
        }

        debug!("[Transport] delivering to {} handler(s), tab={:?}", handlers.len(), target);
        for handler in handlers {
            handler(message);
        }
        Ok(())
    }
}

fn connection_closed() -> TransportError {
    TransportError::ConnectionClosed(CONNECTION_ERROR_MESSAGE.to_string())
}

impl Transport for InMemoryTransport {
    fn send_message_to_tab(&self, tab_id: TabId, message: &Value) -> Result<(), TransportError> {
        self.deliver(Some(tab_id), message)
    }

    fn send_message_to_frames(&self, message: &Value) -> Result<(), TransportError> {
        self.deliver(None, message)
    }

    fn tabs_query(&self) -> Result<Vec<TabId>, TransportError> {
        Ok(self.lock().open_tabs.iter().copied().collect())
    }

    fn add_listener_on_message(&self, handler: MessageHandler) {
        let tab = self.tab;
        self.lock().registrations.push(Registration { tab, handler });
    }

    fn remove_listener_on_message(&self, handler: &MessageHandler) {
        let mut bus = self.lock();
        if let Some(index) = bus
            .registrations
            .iter()
            .position(|r| same_handler(&r.handler, handler))
        {
            bus.registrations.remove(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::message_handler;
    use serde_json::json;

    fn recorder() -> (MessageHandler, Arc<Mutex<Vec<Value>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let handler = message_handler(move |message| sink.lock().unwrap().push(message.clone()));
        (handler, received)
    }

    #[test]
    fn tab_messages_reach_only_that_tab() {
        let background = InMemoryTransport::new();
        let (tab1_handler, tab1) = recorder();
        let (tab2_handler, tab2) = recorder();
        background.for_tab(1).add_listener_on_message(tab1_handler);
        background.for_tab(2).add_listener_on_message(tab2_handler);

        background.send_message_to_tab(1, &json!("hello")).unwrap();

        assert_eq!(*tab1.lock().unwrap(), vec![json!("hello")]);
        assert!(tab2.lock().unwrap().is_empty());
    }

    #[test]
    fn frame_messages_skip_tab_contexts() {
        let background = InMemoryTransport::new();
        let (panel_handler, panel) = recorder();
        let (tab_handler, tab) = recorder();
        background.for_frames().add_listener_on_message(panel_handler);
        background.for_tab(1).add_listener_on_message(tab_handler);

        background.send_message_to_frames(&json!(1)).unwrap();

        assert_eq!(panel.lock().unwrap().len(), 1);
        assert!(tab.lock().unwrap().is_empty());
    }

    #[test]
    fn closed_tab_fails_with_connection_error() {
        let background = InMemoryTransport::new();
        let (handler, _) = recorder();
        background.for_tab(3).add_listener_on_message(handler);
        background.close_tab(3);

        let err = background.send_message_to_tab(3, &json!({})).unwrap_err();
        assert_eq!(err.message(), CONNECTION_ERROR_MESSAGE);
        assert_eq!(background.listener_count(), 0);
        assert!(background.tabs_query().unwrap().is_empty());
    }

    #[test]
    fn no_receiver_is_a_connection_error() {
        let background = InMemoryTransport::new();
        background.open_tab(9);

        assert!(background.send_message_to_tab(9, &json!({})).is_err());
        assert!(background.send_message_to_frames(&json!({})).is_err());
    }

    #[test]
    fn remove_listener_by_identity() {
        let background = InMemoryTransport::new();
        let frames = background.for_frames();
        let (handler, received) = recorder();
        frames.add_listener_on_message(handler.clone());
        frames.remove_listener_on_message(&handler);

        assert_eq!(background.listener_count(), 0);
        assert!(background.send_message_to_frames(&json!(1)).is_err());
        assert!(received.lock().unwrap().is_empty());
    }

    #[test]
    fn tabs_query_lists_open_tabs_in_order() {
        let background = InMemoryTransport::new();
        background.open_tab(7);
        let _ = background.for_tab(2);

        assert_eq!(background.tabs_query().unwrap(), vec![2, 7]);
    }
}
