use std::error::Error;

use http::{Response, StatusCode};
use hoard_http::{
    BoxError, ProxyBody,
    responses::{send_500, send_502},
};

/// Everything that can end a single proxied request early.
///
/// None of these touch the cache: a request that fails never inserts.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Invalid origin URL")]
    InvalidOrigin,

    #[error("Error creating a proxy request")]
    BuildRequest(#[source] http::Error),

    #[error("Error reading the request body")]
    ReadRequestBody(#[source] BoxError),

    #[error("Error forwarding request to origin: {0}")]
    Origin(String),

    #[error("Error caching response")]
    ReadResponseBody(#[source] BoxError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Origin(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self) -> Response<ProxyBody> {
        match self.status() {
            StatusCode::BAD_GATEWAY => send_502(self.to_string()),
            _ => send_500(self.to_string()),
        }
    }

    /// Origin failure carrying the whole source chain, since hyper's
    /// top-level client errors are terse ("client error (Connect)").
    pub(super) fn origin(err: &(dyn Error + 'static)) -> Self {
        let mut text = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            text.push_str(": ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        ProxyError::Origin(text)
    }
}
