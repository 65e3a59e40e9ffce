use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use super::{broadcaster, Broadcaster};
use crate::config::SyncConfig;
use crate::error::TransportError;
use crate::message::TabId;
use crate::transport::Transport;

/// Builds [`Broadcaster`]s on top of a [`Transport`].
///
/// Send failures are logged and swallowed; one unreachable tab never keeps
/// the message from the remaining receivers. Failures whose message is
/// listed in [`SyncConfig::ignored_error_messages`] are expected (a tab
/// without a content script, a panel that just closed) and only traced at
/// debug level.
#[derive(Clone)]
pub struct BrowserMessageBroadcasterFactory {
    transport: Arc<dyn Transport>,
    config: Arc<SyncConfig>,
}

impl BrowserMessageBroadcasterFactory {
    pub fn new(transport: Arc<dyn Transport>, config: SyncConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    /// Broadcaster for global stores: every frame, then every open tab.
    pub fn all_tabs_broadcaster(&self) -> Broadcaster {
        let transport = Arc::clone(&self.transport);
        let config = Arc::clone(&self.config);

        broadcaster(move |message| {
            let message = serde_json::to_value(&message)?;

            if let Err(err) = transport.send_message_to_frames(&message) {
                report_failure(&config, "sendMessageToFrames", &message, &err);
            }

            match transport.tabs_query() {
                Ok(tabs) => {
                    for tab_id in tabs {
                        if let Err(err) = transport.send_message_to_tab(tab_id, &message) {
                            report_failure(
                                &config,
                                &format!("sendMessageToTab({})", tab_id),
                                &message,
                                &err,
                            );
                        }
                    }
                }
                Err(err) => report_failure(&config, "tabsQuery", &message, &err),
            }

            Ok(())
        })
    }

    /// Broadcaster for the stores of one tab: stamps `tabId`, then sends to
    /// every frame and to that tab.
    pub fn create_tab_specific_broadcaster(&self, tab_id: TabId) -> Broadcaster {
        let transport = Arc::clone(&self.transport);
        let config = Arc::clone(&self.config);

        broadcaster(move |message| {
            let message = serde_json::to_value(message.with_tab_id(tab_id))?;

            if let Err(err) = transport.send_message_to_frames(&message) {
                report_failure(&config, "sendMessageToFrames", &message, &err);
            }
            if let Err(err) = transport.send_message_to_tab(tab_id, &message) {
                report_failure(
                    &config,
                    &format!("sendMessageToTab({})", tab_id),
                    &message,
                    &err,
                );
            }

            Ok(())
        })
    }
}

fn report_failure(config: &SyncConfig, operation: &str, message: &Value, err: &TransportError) {
    if config.is_ignored_error(err.message()) {
        debug!("[Broadcaster] {} found no receiver", operation);
        return;
    }

    error!("{}", failure_report(operation, message, err));
}

fn failure_report(operation: &str, message: &Value, err: &TransportError) -> String {
    format!(
        "[Broadcaster] {} failed for message {} with browser error message: {}",
        operation,
        message,
        err.message()
    )
}
