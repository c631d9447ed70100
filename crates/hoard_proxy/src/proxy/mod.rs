use std::{net::SocketAddr, sync::Arc, time::Duration};

use http::{HeaderValue, Request, Response};
use http_body_util::{BodyExt, Full};
use hoard_cache::{CacheKey, MemoryCacheStore};
use hoard_http::{BoxError, ProxyBody, X_CACHE};
use hyper::body::Body;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, info, instrument};

pub(crate) mod client;
mod connect;
pub(crate) mod error;
mod headers;
mod path;
pub(crate) mod response;

use client::OriginClient;
use error::ProxyError;

/// Value of the `X-Cache` header on every proxied response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }

    /// Replaces any `X-Cache` value the origin may have sent.
    fn mark(self, response: &mut Response<ProxyBody>) {
        response
            .headers_mut()
            .insert(X_CACHE, HeaderValue::from_static(self.as_str()));
    }
}

/// =======================================================
/// PROXY STATE
/// =======================================================
///
/// Owns everything a request needs: the origin base URL (fixed for the
/// process lifetime), the shared origin client and the shared cache.
/// Wrapped in an `Arc<Proxy>` and handed to every connection.
pub struct Proxy {
    origin: String,
    client: Arc<dyn OriginClient>,
    store: Arc<MemoryCacheStore>,
    origin_timeout: Duration,
}

impl Proxy {
    pub fn new(
        origin: impl Into<String>,
        client: Arc<dyn OriginClient>,
        store: Arc<MemoryCacheStore>,
        origin_timeout: Duration,
    ) -> Self {
        Self {
            origin: origin.into(),
            client,
            store,
            origin_timeout,
        }
    }

    pub fn cache_size(&self) -> usize {
        self.store.size()
    }

    pub fn clear_cache(&self) {
        self.store.clear();
        info!(target: "hoard::proxy", "Cache cleared");
    }

    /// Entry point for every non-admin request.
    ///
    /// Failures never escape: they become 500/502 plain-text responses and
    /// leave the cache untouched.
    #[instrument(
        skip(self, req),
        fields(method = %req.method(), path = %req.uri().path())
    )]
    pub async fn serve<B>(
        &self,
        req: Request<B>,
        client_addr: Option<SocketAddr>,
    ) -> Response<ProxyBody>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Into<BoxError>,
    {
        match self.try_serve(req, client_addr).await {
            Ok(response) => response,
            Err(e) => {
                error!(
                    target: "hoard::proxy",
                    status = %e.status(),
                    error = ?e,
                    "Proxying failed"
                );
                e.into_response()
            }
        }
    }

    async fn try_serve<B>(
        &self,
        req: Request<B>,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response<ProxyBody>, ProxyError>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Into<BoxError>,
    {
        let key = CacheKey::from_request(req.method(), req.uri());

        // 1) hit: replay the snapshot, no origin call, no store mutation
        if let Some(entry) = self.store.get(&key) {
            info!(
                target: "hoard::proxy",
                method = %req.method(),
                path = %req.uri().path(),
                age_ms = entry.age().as_millis() as u64,
                "Cache HIT"
            );
            let mut response = entry.to_response();
            CacheStatus::Hit.mark(&mut response);
            return Ok(response);
        }

        info!(
            target: "hoard::proxy",
            method = %req.method(),
            path = %req.uri().path(),
            "Cache MISS, forwarding to origin"
        );

        // 2) origin scheme + host, inbound path + query
        let origin = path::parse_origin(&self.origin).ok_or(ProxyError::InvalidOrigin)?;
        let (parts, body) = req.into_parts();
        let target =
            path::build_target_uri(&origin, &parts.uri).map_err(ProxyError::BuildRequest)?;

        // 3) buffer the inbound body
        let body = body
            .collect()
            .await
            .map_err(|e| ProxyError::ReadRequestBody(e.into()))?
            .to_bytes();

        // 4) + 5) header rewrite
        let headers = headers::rewrite_request_headers(&parts.headers, client_addr);

        let mut outbound = Request::builder()
            .method(parts.method.clone())
            .uri(target)
            .body(Full::new(body))
            .map_err(ProxyError::BuildRequest)?;
        *outbound.headers_mut() = headers;

        debug!(
            target: "hoard::proxy",
            uri = %outbound.uri(),
            client = ?client_addr,
            "Forwarding request to origin"
        );

        // 6) one attempt, bounded by the deadline; the body read shares it
        let deadline = Instant::now() + self.origin_timeout;
        let origin_response = match timeout_at(deadline, self.client.send(outbound)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(ProxyError::origin(&*e)),
            Err(_) => {
                return Err(ProxyError::Origin(format!(
                    "origin did not respond within {}s",
                    self.origin_timeout.as_secs_f64()
                )));
            }
        };

        // 7) buffer the origin body and keep a re-readable copy
        let captured = timeout_at(deadline, response::capture_response(origin_response)).await;
        let (entry, mut response) = match captured {
            Ok(Ok(captured)) => captured,
            Ok(Err(e)) => return Err(ProxyError::ReadResponseBody(e)),
            Err(_) => {
                return Err(ProxyError::ReadResponseBody(
                    "origin body not received before the deadline".into(),
                ));
            }
        };

        // 8) only complete responses reach the cache
        self.store.set(key, entry.status, &entry.headers, &entry.body);

        debug!(
            target: "hoard::proxy",
            status = %entry.status,
            body_len = entry.body.len(),
            cache_size = self.store.size(),
            "Stored origin response"
        );

        // 9) relay
        CacheStatus::Miss.mark(&mut response);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        net::SocketAddr,
        pin::Pin,
        sync::{Arc, Mutex},
        task::{Context, Poll},
        time::Duration,
    };

    use async_trait::async_trait;
    use bytes::Bytes;
    use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
    use http_body_util::{BodyExt, Empty, Full};
    use hoard_cache::MemoryCacheStore;
    use hoard_http::BoxError;
    use hyper::body::{Body, Frame};

    use super::{
        Proxy,
        client::{HyperOriginClient, OriginBody, OriginClient},
    };

    #[derive(Debug, Clone)]
    struct Seen {
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    }

    #[derive(Clone, Copy)]
    enum Reply {
        Status(u16, &'static str),
        Refused,
        BrokenBody,
        StalledBody,
        Slow,
    }

    struct FakeOrigin {
        seen: Mutex<Vec<Seen>>,
        reply: Reply,
    }

    impl FakeOrigin {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                reply,
            })
        }

        fn calls(&self) -> Vec<Seen> {
            self.seen.lock().expect("lock").clone()
        }
    }

    struct BrokenBody;

    impl Body for BrokenBody {
        type Data = Bytes;
        type Error = BoxError;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, BoxError>>> {
            Poll::Ready(Some(Err("connection reset by peer".into())))
        }
    }

    /// Head arrives at once, the body never does.
    struct StalledBody;

    impl Body for StalledBody {
        type Data = Bytes;
        type Error = BoxError;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, BoxError>>> {
            Poll::Pending
        }
    }

    fn full_body(bytes: &'static str) -> OriginBody {
        Full::new(Bytes::from_static(bytes.as_bytes()))
            .map_err(|never| -> BoxError { match never {} })
            .boxed_unsync()
    }

    #[async_trait]
    impl OriginClient for FakeOrigin {
        async fn send(&self, req: Request<Full<Bytes>>) -> Result<Response<OriginBody>, BoxError> {
            let (parts, body) = req.into_parts();
            let body = body.collect().await?.to_bytes();
            self.seen.lock().expect("lock").push(Seen {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                body,
            });

            match self.reply {
                Reply::Status(status, text) => Ok(Response::builder()
                    .status(status)
                    .header("content-type", "text/plain")
                    .header("set-cookie", "a=1")
                    .header("set-cookie", "b=2")
                    .body(full_body(text))?),
                Reply::Refused => Err("tcp connect error: Connection refused".into()),
                Reply::BrokenBody => Ok(Response::new(BrokenBody.boxed_unsync())),
                Reply::StalledBody => Ok(Response::new(StalledBody.boxed_unsync())),
                Reply::Slow => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(Response::new(full_body("late")))
                }
            }
        }
    }

    fn proxy_with(origin: &str, fake: Arc<FakeOrigin>) -> (Proxy, Arc<MemoryCacheStore>) {
        let store = Arc::new(MemoryCacheStore::new());
        let proxy = Proxy::new(origin, fake, store.clone(), Duration::from_millis(200));
        (proxy, store)
    }

    fn get(uri: &str) -> Request<Empty<Bytes>> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Empty::new())
            .expect("request")
    }

    fn client() -> Option<SocketAddr> {
        Some("192.168.1.20:40000".parse().expect("addr"))
    }

    async fn body_of(response: Response<Full<Bytes>>) -> Bytes {
        response.into_body().collect().await.expect("body").to_bytes()
    }

    #[tokio::test]
    async fn miss_forwards_then_hit_replays() {
        let fake = FakeOrigin::new(Reply::Status(200, "{\"id\":1}"));
        let (proxy, store) = proxy_with("http://origin.test", fake.clone());

        let first = proxy.serve(get("/users/1"), client()).await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()["x-cache"], "MISS");
        let first_cookies: Vec<_> = first.headers().get_all("set-cookie").iter().cloned().collect();
        assert_eq!(body_of(first).await, "{\"id\":1}");

        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, Method::GET);
        assert_eq!(calls[0].uri, "http://origin.test/users/1");
        assert_eq!(store.size(), 1);

        let second = proxy.serve(get("/users/1"), client()).await;
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(second.headers()["x-cache"], "HIT");
        assert_eq!(second.headers()["content-type"], "text/plain");
        let second_cookies: Vec<_> = second.headers().get_all("set-cookie").iter().cloned().collect();
        assert_eq!(first_cookies, second_cookies);
        assert_eq!(body_of(second).await, "{\"id\":1}");

        assert_eq!(fake.calls().len(), 1);
        assert_eq!(store.size(), 1);
    }

    #[tokio::test]
    async fn query_string_and_method_are_separate_entries() {
        let fake = FakeOrigin::new(Reply::Status(200, "ok"));
        let (proxy, store) = proxy_with("http://origin.test", fake.clone());

        proxy.serve(get("/items?page=1"), client()).await;
        proxy.serve(get("/items?page=2"), client()).await;
        let head = Request::builder()
            .method(Method::HEAD)
            .uri("/items?page=1")
            .body(Empty::<Bytes>::new())
            .expect("request");
        proxy.serve(head, client()).await;

        assert_eq!(fake.calls().len(), 3);
        assert_eq!(fake.calls()[1].uri, "http://origin.test/items?page=2");
        assert_eq!(store.size(), 3);
    }

    #[tokio::test]
    async fn non_success_status_is_cached_and_replayed() {
        let fake = FakeOrigin::new(Reply::Status(404, "not here"));
        let (proxy, _) = proxy_with("http://origin.test", fake.clone());

        let first = proxy.serve(get("/missing"), client()).await;
        assert_eq!(first.status(), StatusCode::NOT_FOUND);
        assert_eq!(first.headers()["x-cache"], "MISS");

        let second = proxy.serve(get("/missing"), client()).await;
        assert_eq!(second.status(), StatusCode::NOT_FOUND);
        assert_eq!(second.headers()["x-cache"], "HIT");
        assert_eq!(body_of(second).await, "not here");
        assert_eq!(fake.calls().len(), 1);
    }

    #[tokio::test]
    async fn outbound_request_is_rewritten() {
        let fake = FakeOrigin::new(Reply::Status(201, "created"));
        let (proxy, _) = proxy_with("http://origin.test:8081", fake.clone());

        let req = Request::builder()
            .method(Method::POST)
            .uri("http://proxy.local:3000/orders?dry=1")
            .header("Connection", "keep-alive")
            .header("Host", "proxy.local:3000")
            .header("X-Forwarded-For", "10.0.0.1")
            .header("Authorization", "Bearer t")
            .body(Full::new(Bytes::from_static(b"{\"qty\":2}")))
            .expect("request");

        let response = proxy.serve(req, client()).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let seen = &fake.calls()[0];
        assert_eq!(seen.method, Method::POST);
        assert_eq!(seen.uri, "http://origin.test:8081/orders?dry=1");
        assert!(seen.headers.get("connection").is_none());
        assert!(seen.headers.get("host").is_none());
        assert_eq!(seen.headers["authorization"], "Bearer t");
        assert_eq!(seen.headers["x-forwarded-for"], "10.0.0.1, 192.168.1.20");
        assert_eq!(&seen.body[..], b"{\"qty\":2}");
    }

    #[tokio::test]
    async fn unreachable_origin_is_bad_gateway_and_not_cached() {
        let fake = FakeOrigin::new(Reply::Refused);
        let (proxy, store) = proxy_with("http://origin.test", fake.clone());

        let response = proxy.serve(get("/a"), client()).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_of(response).await;
        assert_eq!(
            body,
            "Error forwarding request to origin: tcp connect error: Connection refused"
        );
        assert!(store.is_empty());

        proxy.serve(get("/a"), client()).await;
        assert_eq!(fake.calls().len(), 2);
    }

    #[tokio::test]
    async fn slow_origin_times_out_as_bad_gateway() {
        let fake = FakeOrigin::new(Reply::Slow);
        let (proxy, store) = proxy_with("http://origin.test", fake);

        let response = proxy.serve(get("/slow"), client()).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn broken_origin_body_is_internal_error_and_not_cached() {
        let fake = FakeOrigin::new(Reply::BrokenBody);
        let (proxy, store) = proxy_with("http://origin.test", fake);

        let response = proxy.serve(get("/a"), client()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, "Error caching response");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn body_past_the_deadline_is_internal_error_and_not_cached() {
        let fake = FakeOrigin::new(Reply::StalledBody);
        let (proxy, store) = proxy_with("http://origin.test", fake.clone());

        let serving = proxy.serve(get("/a"), client());
        let response = tokio::time::timeout(Duration::from_secs(5), serving)
            .await
            .expect("deadline bounds the body read");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get("x-cache").is_none());
        assert_eq!(body_of(response).await, "Error caching response");
        assert!(store.is_empty());
        assert_eq!(fake.calls().len(), 1);
    }

    #[tokio::test]
    async fn https_origin_reaches_the_connector() {
        let client = Arc::new(HyperOriginClient::new().expect("tls config"));
        let store = Arc::new(MemoryCacheStore::new());
        let timeout = Duration::from_secs(5);
        let proxy = Proxy::new("https://127.0.0.1:1", client, store.clone(), timeout);

        let response = proxy.serve(get("/x"), None).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_of(response).await;
        let body = String::from_utf8_lossy(&body);
        assert!(body.starts_with("Error forwarding request to origin: "));
        assert!(!body.contains("scheme is not http"), "{body}");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn broken_request_body_is_internal_error() {
        let fake = FakeOrigin::new(Reply::Status(200, "ok"));
        let (proxy, store) = proxy_with("http://origin.test", fake.clone());

        let req = Request::builder()
            .method(Method::PUT)
            .uri("/upload")
            .body(BrokenBody)
            .expect("request");

        let response = proxy.serve(req, client()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, "Error reading the request body");
        assert!(fake.calls().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn invalid_origin_is_internal_error() {
        let fake = FakeOrigin::new(Reply::Status(200, "ok"));
        let (proxy, _) = proxy_with("not a url", fake.clone());

        let response = proxy.serve(get("/a"), client()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, "Invalid origin URL");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn clear_cache_forces_a_new_origin_call() {
        let fake = FakeOrigin::new(Reply::Status(200, "ok"));
        let (proxy, _) = proxy_with("http://origin.test", fake.clone());

        proxy.serve(get("/a"), None).await;
        proxy.clear_cache();
        assert_eq!(proxy.cache_size(), 0);

        let response = proxy.serve(get("/a"), None).await;
        assert_eq!(response.headers()["x-cache"], "MISS");
        assert_eq!(fake.calls().len(), 2);
        assert!(fake.calls()[1].headers.get("x-forwarded-for").is_none());
    }
}
