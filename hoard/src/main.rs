use anyhow::Context;
use clap::Parser;
use hoard_config::{DEFAULT_CONFIG_FILE, ProxyConfig};
use hoard_core::Master;
use tracing::warn;
use utils::init_tracing;

mod clear;

/// A caching HTTP proxy server.
///
/// Forwards requests to the origin server and caches the responses. If the
/// same request is made again, the cached response is returned instead of
/// forwarding the request to the origin.
#[derive(Debug, Parser)]
#[command(name = "hoard", version)]
struct Cli {
    /// Port on which the proxy server will run
    #[arg(long)]
    port: Option<u16>,

    /// URL of the server to which requests will be forwarded
    #[arg(long)]
    origin: Option<String>,

    /// Clear the cache of a running proxy and exit
    #[arg(long)]
    clear_cache: bool,

    /// Optional TOML config file (values can also come from HOARD_* env vars)
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let cfg = ProxyConfig::from_file(&cli.config)
        .with_context(|| format!("Error reading config '{}'", cli.config))?
        .with_overrides(cli.port, cli.origin);

    if cli.clear_cache {
        if cfg.port == 0 {
            anyhow::bail!("--port flag is required when using --clear-cache");
        }
        let body = clear::clear_running_cache(cfg.port)
            .await
            .context("Is the proxy running on the specified port?")?;
        println!("{body}");
        return Ok(());
    }

    let report = cfg.validate();
    if report.has_errors() {
        eprintln!("{report}");
        anyhow::bail!("refusing to start with an invalid configuration");
    }
    for warning in report.warnings() {
        warn!(target: "hoard::config", "{warning}");
    }
    cfg.print();

    Master::new(cfg)?.run().await
}
