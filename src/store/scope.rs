use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a store's state is shared extension-wide or isolated per tab.
///
/// Serialized by variant name, which is what travels as `storeType` on the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreScope {
    GlobalStore,
    TabContextStore,
}

impl fmt::Display for StoreScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreScope::GlobalStore => f.write_str("GlobalStore"),
            StoreScope::TabContextStore => f.write_str("TabContextStore"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names() {
        assert_eq!(
            serde_json::to_value(StoreScope::GlobalStore).unwrap(),
            "GlobalStore"
        );
        assert_eq!(
            serde_json::from_str::<StoreScope>("\"TabContextStore\"").unwrap(),
            StoreScope::TabContextStore
        );
        assert!(serde_json::from_str::<StoreScope>("\"SomethingElse\"").is_err());
    }
}
