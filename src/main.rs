use clap::{Parser, Subcommand};
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use hop_relay::config::Config;
use hop_relay::constants::{self, ENV_CONFIG};
use hop_relay::publisher::AsyncPublisher;
use hop_relay::server::{self, GatewayState, PublisherState};
use hop_relay::{logging, metrics};

#[derive(Parser)]
#[command(name = "hop_relay")]
#[command(about = "Two-hop relay: forwarding gateway and async log publisher")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the first hop: decode, transcode to protobuf and forward with the api key
    Gateway {
        /// TOML configuration file
        #[arg(long, env = ENV_CONFIG)]
        config: Option<PathBuf>,
    },
    /// Run the second hop: authenticate, probe and publish to the log
    Publisher {
        /// TOML configuration file
        #[arg(long, env = ENV_CONFIG)]
        config: Option<PathBuf>,
    },
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

fn bind(port: u16) -> anyhow::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    Ok(TcpListener::bind(addr)?)
}

async fn run_gateway(config: Config) -> anyhow::Result<()> {
    let state = Arc::new(GatewayState::from_config(&config.gateway)?);
    let listener = bind(config.gateway.port)?;
    info!(
        port = config.gateway.port,
        publisher = %config.gateway.publisher_uri,
        cache = %config.gateway.cache_uri,
        "gateway starting"
    );
    server::serve(server::gateway_router(state), listener, shutdown_signal()).await?;
    Ok(())
}

async fn run_publisher(config: Config) -> anyhow::Result<()> {
    let publisher = Arc::new(AsyncPublisher::connect(&config.log).await?);
    let state = Arc::new(PublisherState::new(&config.publisher, publisher.clone())?);
    let listener = bind(config.publisher.port)?;
    info!(
        port = config.publisher.port,
        topic = %config.log.topic,
        "publisher starting"
    );

    let served = server::serve(server::publisher_router(state), listener, shutdown_signal()).await;

    // Flush queued messages and stop the drain task even when serving failed.
    let observed = publisher.close().await?;
    if observed > 0 {
        warn!(observed, "delivery failures since start");
    } else {
        info!("publisher drained cleanly");
    }
    served?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let (service, config_path) = match &cli.command {
        Commands::Gateway { config } => (constants::GATEWAY_SERVICE, config.clone()),
        Commands::Publisher { config } => (constants::PUBLISHER_SERVICE, config.clone()),
    };

    let config = Config::load(config_path.as_deref())?;
    let _guard = logging::init_logging(service, &config.logging.dir);
    metrics::init_metrics();

    let result = match cli.command {
        Commands::Gateway { .. } => run_gateway(config).await,
        Commands::Publisher { .. } => run_publisher(config).await,
    };
    if let Err(e) = &result {
        error!(service, "exiting with error: {:#}", e);
    }
    result
}
