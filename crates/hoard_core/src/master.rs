use std::sync::Arc;

use anyhow::Context;
use hoard_cache::MemoryCacheStore;
use hoard_config::ProxyConfig;
use hoard_proxy::{HyperOriginClient, OriginClient, Proxy};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::router::Router;

mod accept;
mod startup;

use accept::{accept_loop, bind_listener};

/// Owns the configuration and the dispatch table of one proxy instance.
pub struct Master {
    cfg: Arc<ProxyConfig>,
    router: Arc<Router>,
}

impl Master {
    /// Builds the store, the shared origin client, the proxy and its router.
    pub fn new(cfg: ProxyConfig) -> anyhow::Result<Self> {
        let client = HyperOriginClient::new().context("failed to build the TLS client config")?;
        Ok(Self::with_client(cfg, Arc::new(client)))
    }

    pub fn with_client(cfg: ProxyConfig, client: Arc<dyn OriginClient>) -> Self {
        let store = Arc::new(MemoryCacheStore::new());
        let proxy = Proxy::new(cfg.origin.clone(), client, store, cfg.origin_timeout());
        let router = Arc::new(Router::new(Arc::new(proxy)));

        Self {
            cfg: Arc::new(cfg),
            router,
        }
    }

    pub fn router(&self) -> Arc<Router> {
        self.router.clone()
    }

    /// Binds the configured address and serves until Ctrl-C.
    #[instrument(skip(self), fields(port = self.cfg.port, origin = %self.cfg.origin))]
    pub async fn run(self) -> anyhow::Result<()> {
        let listen_addr = self.cfg.listen_addr();
        let listener = bind_listener(&listen_addr)
            .await
            .with_context(|| format!("failed to bind {listen_addr}"))?;

        self.serve(listener).await
    }

    /// Serves on an already bound listener until Ctrl-C.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        self.log_startup();

        tokio::select! {
            res = accept_loop(listener, self.router.clone()) => res,
            _ = tokio::signal::ctrl_c() => {
                info!(target: "hoard::master", "Shutdown signal received; stopping listener");
                Ok(())
            }
        }
    }
}
