use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use mock_proxy::config::loader::load_or_default;
use mock_proxy::observability::{logging, metrics};
use mock_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "mock-proxy")]
#[command(about = "Local request interception proxy with real-network fallback", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!("mock-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        fallback_delay_ms = config.timeouts.fallback_delay_ms,
        response_timeout_ms = config.timeouts.response_timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    // Without registered routers the engine is a pure passthrough proxy;
    // embedding applications register routers through the library API.
    tracing::info!(
        address = %local_addr,
        "Listening; passthrough until routers are registered"
    );

    let server = HttpServer::new(config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
