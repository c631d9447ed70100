use std::time::{Duration, SystemTime};

use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use http_body_util::Full;

/// A fully buffered origin response.
///
/// Handed out by value: `HeaderMap` is cloned on read and `Bytes` is
/// immutable, so a reader can never observe a later write.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Informational only; entries never expire.
    pub created_at: SystemTime,
}

impl CachedEntry {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            created_at: SystemTime::now(),
        }
    }

    /// Time since the origin response was stored.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed().unwrap_or_default()
    }

    /// Replays the snapshot: every stored header value, then status and body.
    pub fn to_response(&self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body.clone()));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        for (name, value) in self.headers.iter() {
            headers.append(name.clone(), value.clone());
        }

        response
    }
}
