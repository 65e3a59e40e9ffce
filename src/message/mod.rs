//! The store update wire envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::StoreScope;

/// Discriminator carried by every store update broadcast.
pub const STORE_UPDATE_MESSAGE_TYPE: &str = "storeUpdate";

/// Browser tab identifier.
pub type TabId = i64;

/// One broadcast snapshot of a store's state.
///
/// On the wire this is a camelCase JSON object; `tabId` is omitted when the
/// message has not been scoped to a tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreUpdateMessage<T> {
    pub message_type: String,
    pub store_id: String,
    pub store_type: StoreScope,
    pub payload: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,
}

impl<T> StoreUpdateMessage<T> {
    /// Build an unscoped update for `store_id`.
    pub fn new(store_id: impl Into<String>, store_type: StoreScope, payload: T) -> Self {
        Self {
            message_type: STORE_UPDATE_MESSAGE_TYPE.to_string(),
            store_id: store_id.into(),
            store_type,
            payload,
            tab_id: None,
        }
    }

    pub fn with_tab_id(mut self, tab_id: TabId) -> Self {
        self.tab_id = Some(tab_id);
        self
    }

    pub fn is_store_update(&self) -> bool {
        self.message_type == STORE_UPDATE_MESSAGE_TYPE
    }
}

impl StoreUpdateMessage<Value> {
    /// Decode the payload into a concrete state type.
    pub fn decode_payload<T>(&self) -> serde_json::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        T::deserialize(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_camel_case_without_tab() {
        let message = StoreUpdateMessage::new("TabStore", StoreScope::TabContextStore, json!({ "count": 0 }));

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "messageType": "storeUpdate",
                "storeId": "TabStore",
                "storeType": "TabContextStore",
                "payload": { "count": 0 },
            })
        );
    }

    #[test]
    fn tab_id_is_serialized_when_present() {
        let message =
            StoreUpdateMessage::new("TabStore", StoreScope::TabContextStore, json!(1)).with_tab_id(5);

        assert_eq!(serde_json::to_value(&message).unwrap()["tabId"], json!(5));
    }

    #[test]
    fn null_tab_id_decodes_as_unset() {
        let message: StoreUpdateMessage<Value> = serde_json::from_value(json!({
            "messageType": "storeUpdate",
            "storeId": "S",
            "storeType": "GlobalStore",
            "payload": "x",
            "tabId": null,
        }))
        .unwrap();

        assert_eq!(message.tab_id, None);
        assert!(message.is_store_update());
    }

    #[test]
    fn decode_payload_into_state() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Counter {
            count: u32,
        }

        let message = StoreUpdateMessage::new("S", StoreScope::GlobalStore, json!({ "count": 4 }));
        assert_eq!(message.decode_payload::<Counter>().unwrap(), Counter { count: 4 });
        assert!(message.decode_payload::<String>().is_err());
    }
}
