use http::{Method, Request, Response};
use hoard_http::{
    ProxyBody,
    responses::{send_200, send_405_with_allow},
};
use hoard_proxy::Proxy;
use tracing::{info, warn};

/// `DELETE /admin/cache`: empties the cache and reports the new size.
///
/// Other methods get a 405 instead of an empty reply.
pub(crate) fn clear_cache<B>(proxy: &Proxy, req: &Request<B>) -> Response<ProxyBody> {
    if req.method() != Method::DELETE {
        warn!(
            target: "hoard::admin",
            method = %req.method(),
            "Rejected non-DELETE request to cache admin endpoint"
        );
        return send_405_with_allow("DELETE");
    }

    proxy.clear_cache();
    let size = proxy.cache_size();
    info!(target: "hoard::admin", size, "Cache cleared via admin endpoint");

    send_200(format!("Cache cleared. Current size: {size} items"))
}
