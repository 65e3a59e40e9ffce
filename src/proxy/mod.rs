//! Remote read-only mirrors of background stores.

mod store_proxy;

pub use store_proxy::StoreProxy;
