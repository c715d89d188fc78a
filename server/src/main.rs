use clap::Parser;
use log::info;
use server::config::{DisconnectPolicy, ServerConfig};
use server::network::Server;
use shared::{BROADCAST_PERIOD_MS, DEFAULT_PORT, TICK_PERIOD_MS};
use std::time::Duration;

// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Simulation period in milliseconds
    #[clap(short, long, default_value_t = TICK_PERIOD_MS)]
    tick_ms: u64,
    /// Broadcast period in milliseconds
    #[clap(short, long, default_value_t = BROADCAST_PERIOD_MS)]
    broadcast_ms: u64,
    /// What happens to a player's body after they disconnect
    #[clap(long, value_enum, default_value_t = DisconnectPolicy::Continue)]
    on_disconnect: DisconnectPolicy,
    /// Seed for target placement
    #[clap(long)]
    seed: Option<u64>,
}

/// Parses command-line arguments, then runs the server until Ctrl+C or SIGTERM.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = ServerConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        tick_period: Duration::from_millis(args.tick_ms),
        broadcast_period: Duration::from_millis(args.broadcast_ms),
        disconnect_policy: args.on_disconnect,
        seed: args.seed,
        ..ServerConfig::default()
    };

    info!(
        "Starting server: tick {:?}, broadcast {:?}, on disconnect {:?}",
        config.tick_period, config.broadcast_period, config.disconnect_policy
    );

    let server = Server::bind(config).await?;
    server.run().await?;

    Ok(())
}
