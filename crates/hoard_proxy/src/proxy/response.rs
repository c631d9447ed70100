use http::Response;
use http_body_util::{BodyExt, Full};
use hoard_cache::CachedEntry;
use hoard_http::{BoxError, ProxyBody};

use super::client::OriginBody;

/// Buffers the whole origin body.
///
/// Returns the snapshot destined for the cache together with the same
/// response rebuilt around an in-memory body, so it can still be read
/// (and relayed) after the snapshot was taken.
pub async fn capture_response(
    response: Response<OriginBody>,
) -> Result<(CachedEntry, Response<ProxyBody>), BoxError> {
    let (parts, body) = response.into_parts();
    let body = body.collect().await?.to_bytes();

    let entry = CachedEntry::new(parts.status, parts.headers.clone(), body.clone());
    Ok((entry, Response::from_parts(parts, Full::new(body))))
}
