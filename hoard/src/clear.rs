use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use hoard_core::ADMIN_CACHE_PATH;
use http::{Method, Request};
use http_body_util::{BodyExt, Empty};
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use tokio::time::timeout;

const CLEAR_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends `DELETE /admin/cache` to a proxy on this host and returns the
/// reply body.
pub(crate) async fn clear_running_cache(port: u16) -> anyhow::Result<String> {
    let url = format!("http://localhost:{port}{ADMIN_CACHE_PATH}");
    let client = Client::builder(TokioExecutor::new()).build_http::<Empty<Bytes>>();
    let req = Request::builder()
        .method(Method::DELETE)
        .uri(&url)
        .body(Empty::new())?;

    let exchange = async {
        let response = client.request(req).await?;
        let body = response.into_body().collect().await?.to_bytes();
        Ok::<_, anyhow::Error>(body)
    };

    let body = timeout(CLEAR_TIMEOUT, exchange)
        .await
        .with_context(|| format!("no response from {url} within {CLEAR_TIMEOUT:?}"))??;

    Ok(String::from_utf8_lossy(&body).into_owned())
}
