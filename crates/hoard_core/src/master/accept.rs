use std::{convert::Infallible, sync::Arc, time::Duration};

use hoard_http::{ProxyBody, responses::send_500};
use http::{Request, Response};
use hyper::{body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, instrument};

use crate::router::Router;

/// Back-off after a failed accept (e.g. out of file descriptors).
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

pub(crate) async fn bind_listener(listen_addr: &str) -> anyhow::Result<TcpListener> {
    info!(target: "hoard::master", listen = %listen_addr, "Binding listener");

    match TcpListener::bind(listen_addr).await {
        Ok(listener) => {
            info!(target: "hoard::master", listen = %listen_addr, "Bind() successful");
            Ok(listener)
        }
        Err(e) => {
            error!(
                target: "hoard::master",
                listen = %listen_addr,
                error = ?e,
                "Failed to bind listener"
            );
            Err(e.into())
        }
    }
}

/// One task per accepted connection; accept failures never stop the loop.
#[instrument(skip(listener, router), fields(listen = ?listener.local_addr().ok()))]
pub(crate) async fn accept_loop(listener: TcpListener, router: Arc<Router>) -> anyhow::Result<()> {
    info!(target: "hoard::master", "accept_loop started for listening socket");

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                error!(target: "hoard::master", error = ?e, "Failed to accept connection");
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                continue;
            }
        };

        debug!(target: "hoard::master", client_addr = %addr, "Connection accepted");

        let router = router.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_connection(stream, router, addr).await {
                debug!(
                    target: "hoard::worker",
                    client_addr = %addr,
                    error = ?e,
                    "Connection closed with error"
                );
            }
        });
    }
}

async fn serve_connection(
    stream: TcpStream,
    router: Arc<Router>,
    addr: std::net::SocketAddr,
) -> Result<(), hyper::Error> {
    let service = service_fn(move |req: Request<Incoming>| {
        let router = router.clone();
        async move { Ok::<_, Infallible>(handle_request(router, req, addr).await) }
    });

    http1::Builder::new()
        .serve_connection(TokioIo::new(stream), service)
        .await
}

/// Runs the request on its own task: if the client hangs up, hyper drops
/// this future but the origin call and cache insert still finish.
async fn handle_request(
    router: Arc<Router>,
    req: Request<Incoming>,
    addr: std::net::SocketAddr,
) -> Response<ProxyBody> {
    let task = tokio::spawn(async move { router.dispatch(req, Some(addr)).await });

    match task.await {
        Ok(response) => response,
        Err(e) => {
            error!(target: "hoard::worker", client_addr = %addr, error = ?e, "Request task failed");
            send_500("Internal Server Error")
        }
    }
}
