use std::net::SocketAddr;

use http::{
    HeaderMap, HeaderName, HeaderValue,
    header::{CONNECTION, HOST},
};

pub(super) const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// =======================================================
/// HEADER REWRITE (proxy semantics)
/// =======================================================
///
/// - Copies every inbound header, keeping every value of repeated names
/// - Drops `Connection` (hop-by-hop, belongs to the client connection)
/// - Drops `Host`: the origin client derives it from the target URI
/// - Extends `X-Forwarded-For` with the client IP
pub(super) fn rewrite_request_headers(
    inbound: &HeaderMap,
    client_addr: Option<SocketAddr>,
) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 1);

    for (name, value) in inbound.iter() {
        if name == CONNECTION || name == HOST {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    if let Some(addr) = client_addr {
        append_forwarded_for(&mut headers, &addr.ip().to_string());
    }

    headers
}

/// Prior hops stay first, joined with ", ", the new client IP goes last.
/// Earlier values are joined as raw bytes so non-ASCII hops pass through.
fn append_forwarded_for(headers: &mut HeaderMap, client_ip: &str) {
    let mut chain = Vec::new();
    for value in headers.get_all(&X_FORWARDED_FOR) {
        chain.extend_from_slice(value.as_bytes());
        chain.extend_from_slice(b", ");
    }
    chain.extend_from_slice(client_ip.as_bytes());

    if let Ok(value) = HeaderValue::from_bytes(&chain) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
