use http::Uri;

/// =======================================================
/// TARGET URI: origin scheme + host, inbound path + query
/// =======================================================
///
/// The inbound scheme, host and port are discarded. An inbound target with
/// no path (authority form) is forwarded as "/".
pub(super) fn build_target_uri(origin: &Uri, inbound: &Uri) -> Result<Uri, http::Error> {
    let path_and_query = inbound
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut builder = Uri::builder();
    if let Some(scheme) = origin.scheme() {
        builder = builder.scheme(scheme.clone());
    }
    if let Some(authority) = origin.authority() {
        builder = builder.authority(authority.clone());
    }

    builder.path_and_query(path_and_query).build()
}

/// Parses the configured origin; it must carry both scheme and host.
pub(super) fn parse_origin(origin: &str) -> Option<Uri> {
    let uri = origin.parse::<Uri>().ok()?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return None;
    }
    Some(uri)
}
