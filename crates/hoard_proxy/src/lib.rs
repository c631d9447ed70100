//! Forwarding pipeline of the caching proxy.
//!
//! [`Proxy`] answers from the cache when it can and otherwise forwards the
//! request to the single configured origin, buffers the answer, stores it and
//! relays it to the client.

mod proxy;

pub use proxy::client::{HyperOriginClient, OriginBody, OriginClient};
pub use proxy::error::ProxyError;
pub use proxy::response::capture_response;
pub use proxy::{CacheStatus, Proxy};
