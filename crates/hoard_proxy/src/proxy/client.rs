use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::{BodyExt, Full, combinators::UnsyncBoxBody};
use hoard_http::BoxError;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use super::connect::OriginConnector;

/// Origin response body, read lazily by the proxy.
pub type OriginBody = UnsyncBoxBody<Bytes, BoxError>;

/// Capability to run one request against the origin.
///
/// Built once at startup and shared read-only by every request.
#[async_trait]
pub trait OriginClient: Send + Sync {
    async fn send(&self, req: Request<Full<Bytes>>) -> Result<Response<OriginBody>, BoxError>;
}

/// Pooled hyper HTTP/1.1 client for `http://` and `https://` origins.
#[derive(Clone)]
pub struct HyperOriginClient {
    inner: Client<OriginConnector, Full<Bytes>>,
}

impl HyperOriginClient {
    /// Fails only when the TLS client configuration cannot be built.
    pub fn new() -> Result<Self, rustls::Error> {
        Ok(Self {
            inner: Client::builder(TokioExecutor::new()).build(OriginConnector::new()?),
        })
    }
}

#[async_trait]
impl OriginClient for HyperOriginClient {
    async fn send(&self, req: Request<Full<Bytes>>) -> Result<Response<OriginBody>, BoxError> {
        let response = self.inner.request(req).await?;
        Ok(response.map(|body| body.map_err(BoxError::from).boxed_unsync()))
    }
}
