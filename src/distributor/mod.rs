//! Receiver-side routing of store updates.

mod store_update_message_hub;

pub use store_update_message_hub::{
    store_update_listener, HubState, StoreUpdateListener, StoreUpdateMessageHub,
};
