use tracing::info;

use super::Master;

impl Master {
    pub(super) fn log_startup(&self) {
        info!(
            target: "hoard::master",
            port = self.cfg.port,
            origin = %self.cfg.origin,
            "Starting the caching proxy server on port {}, forwarding to {}",
            self.cfg.port,
            self.cfg.origin
        );

        let size = self.router.proxy().cache_size();
        if size == 0 {
            info!(target: "hoard::master", "Cache is currently empty");
        } else {
            info!(target: "hoard::master", size, "Cache already holds entries");
        }
    }
}
