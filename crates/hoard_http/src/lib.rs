pub mod responses;

use bytes::Bytes;
use http_body_util::Full;

/// Body type of every response the proxy writes back to clients.
pub type ProxyBody = Full<Bytes>;

/// Type-erased error used at body and client boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Response header that reports whether the cache answered.
pub const X_CACHE: &str = "x-cache";
