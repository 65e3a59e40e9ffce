//! Runtime configuration for the broadcast side.

use serde::Deserialize;

use crate::error::Result;

/// Error text a browser reports when a message targets a context that no
/// longer (or does not yet) exist.
pub const CONNECTION_ERROR_MESSAGE: &str =
    "Could not establish connection. Receiving end does not exist.";

/// Settings shared by the broadcasters.
///
/// ```
/// use storesync::config::SyncConfig;
///
/// let config = SyncConfig::from_json(r#"{ "ignoredErrorMessages": [] }"#).unwrap();
/// assert!(config.ignored_error_messages.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    /// Transport error messages that are expected during normal operation
    /// and therefore not logged as failures.
    pub ignored_error_messages: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ignored_error_messages: vec![CONNECTION_ERROR_MESSAGE.to_string()],
        }
    }
}

impl SyncConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn is_ignored_error(&self, message: &str) -> bool {
        self.ignored_error_messages.iter().any(|ignored| ignored == message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ignores_connection_error() {
        let config = SyncConfig::default();
        assert!(config.is_ignored_error(CONNECTION_ERROR_MESSAGE));
        assert!(!config.is_ignored_error("test error"));
    }

    #[test]
    fn empty_json_uses_defaults() {
        let config = SyncConfig::from_json("{}").unwrap();
        assert_eq!(config, SyncConfig::default());
    }

    #[test]
    fn custom_ignore_list() {
        let config =
            SyncConfig::from_json(r#"{ "ignoredErrorMessages": ["tab gone"] }"#).unwrap();
        assert!(config.is_ignored_error("tab gone"));
        assert!(!config.is_ignored_error(CONNECTION_ERROR_MESSAGE));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(SyncConfig::from_json("not json").is_err());
    }
}
