use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use http::{Request, Response};
use hoard_http::{BoxError, ProxyBody};
use hoard_proxy::Proxy;
use hyper::body::Body;
use tracing::debug;

use crate::admin;

/// Path of the administrative cache endpoint.
pub const ADMIN_CACHE_PATH: &str = "/admin/cache";

/// Handler selected for a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    AdminCache,
    Proxy,
}

/// Dispatch table built once per listener.
///
/// Exact paths map to their handler; everything else is proxied. Each
/// `Router` owns its own `Proxy`, so several can live in one process.
pub struct Router {
    proxy: Arc<Proxy>,
    exact: HashMap<&'static str, Route>,
}

impl Router {
    pub fn new(proxy: Arc<Proxy>) -> Self {
        let mut exact = HashMap::new();
        exact.insert(ADMIN_CACHE_PATH, Route::AdminCache);
        Self { proxy, exact }
    }

    pub fn proxy(&self) -> &Arc<Proxy> {
        &self.proxy
    }

    pub fn route(&self, path: &str) -> Route {
        self.exact.get(path).copied().unwrap_or(Route::Proxy)
    }

    pub async fn dispatch<B>(
        &self,
        req: Request<B>,
        client_addr: Option<SocketAddr>,
    ) -> Response<ProxyBody>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Into<BoxError>,
    {
        let route = self.route(req.uri().path());
        debug!(
            target: "hoard::router",
            path = %req.uri().path(),
            ?route,
            "Dispatching request"
        );

        match route {
            Route::AdminCache => admin::clear_cache(&self.proxy, &req),
            Route::Proxy => self.proxy.serve(req, client_addr).await,
        }
    }
}
