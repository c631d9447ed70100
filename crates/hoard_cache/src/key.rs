use std::fmt;

use http::{Method, Uri};

/// Identity of a cached response: `METHOD:request-target`.
///
/// No normalization is applied. `/a?x=1` and `/a?x=1&` are different keys,
/// and so are `/a` and `/a/`.
#[derive(Hash, Eq, PartialEq, Debug, Clone)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(method: &str, uri: &str) -> Self {
        Self(format!("{method}:{uri}"))
    }

    /// Builds the key from the inbound request exactly as it was received.
    pub fn from_request(method: &Method, uri: &Uri) -> Self {
        Self::new(method.as_str(), &uri.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
