//! Error types for store synchronization.

use thiserror::Error;

use crate::store::StoreScope;

/// Errors surfaced by the synchronization layer.
///
/// Invalid or off-target wire messages are never reported through this type;
/// they are discarded on receipt. Everything here is either a wiring mistake
/// made by the caller or a failure that the caller chose to observe.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("store id must not be blank")]
    BlankStoreId,

    #[error("store update message hub is not initialized")]
    NotInitialized,

    #[error("already initialized")]
    AlreadyInitialized,

    #[error("store update message hub has been disposed")]
    Disposed,

    #[error("a store update listener is already registered for store `{0}`")]
    ListenerAlreadyRegistered(String),

    #[error("store `{store_id}` has scope {found:?}, hub holds {expected:?} stores")]
    ScopeMismatch {
        store_id: String,
        expected: StoreScope,
        found: StoreScope,
    },

    #[error("unknown store `{0}`")]
    UnknownStore(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failure reported by a [`Transport`](crate::transport::Transport) send.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The receiving end went away (tab closed, port disconnected).
    #[error("{0}")]
    ConnectionClosed(String),

    #[error("{0}")]
    Send(String),
}

impl TransportError {
    /// The browser-level error message carried by this failure.
    pub fn message(&self) -> &str {
        match self {
            TransportError::ConnectionClosed(message) | TransportError::Send(message) => message,
        }
    }
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
