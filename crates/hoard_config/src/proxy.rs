use std::time::Duration;

use serde::Deserialize;

/// File looked up when `--config` is not given. Missing is fine.
pub const DEFAULT_CONFIG_FILE: &str = "hoard.toml";

// =======================================================
// PROXY CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Interface the listener binds to.
    pub host: String,
    /// Listening port. 0 means "not configured".
    pub port: u16,
    /// Origin base URL (scheme + host), e.g. `http://api.example.com`.
    pub origin: String,
    /// Upper bound for one origin round trip, body included.
    pub origin_timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 0,
            origin: String::new(),
            origin_timeout_secs: 30,
        }
    }
}

impl ProxyConfig {
    /// Layers `file_name` (TOML, optional) and `HOARD_*` environment
    /// variables over the defaults.
    pub fn from_file(file_name: &str) -> Result<Self, config::ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::new(file_name, config::FileFormat::Toml).required(false))
            .add_source(config::Environment::with_prefix("HOARD"))
            .build()?;

        built.try_deserialize()
    }

    /// CLI flags win over file and environment.
    pub fn with_overrides(mut self, port: Option<u16>, origin: Option<String>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(origin) = origin {
            self.origin = origin;
        }
        self
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn origin_timeout(&self) -> Duration {
        Duration::from_secs(self.origin_timeout_secs)
    }

    pub fn print(&self) {
        println!("================ HOARD CONFIG ================");
        println!("  host                 = {}", self.host);
        println!("  port                 = {}", self.port);
        println!("  origin               = {}", self.origin);
        println!("  origin_timeout_secs  = {}", self.origin_timeout_secs);
        println!("==============================================");
    }
}
