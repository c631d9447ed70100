pub mod proxy;
pub mod validation;

pub use proxy::{ProxyConfig, DEFAULT_CONFIG_FILE};
pub use validation::ConfigReport;
