use bytes::Bytes;
use http::{HeaderValue, Response, StatusCode, header};
use http_body_util::Full;

use crate::ProxyBody;

/// Generic helper for a plain-text response.
pub fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<ProxyBody> {
    let body = body.into();
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

pub fn send_200(body: impl Into<Bytes>) -> Response<ProxyBody> {
    text_response(StatusCode::OK, body)
}

pub fn send_500(body: impl Into<Bytes>) -> Response<ProxyBody> {
    text_response(StatusCode::INTERNAL_SERVER_ERROR, body)
}

pub fn send_502(body: impl Into<Bytes>) -> Response<ProxyBody> {
    text_response(StatusCode::BAD_GATEWAY, body)
}

/// 405 with the `Allow` header listing what the route does accept.
pub fn send_405_with_allow(allow: &'static str) -> Response<ProxyBody> {
    let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed\n");
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(allow));
    response
}
