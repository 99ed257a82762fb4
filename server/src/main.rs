use clap::Parser;
use log::info;
use server::config::RelayConfig;
use server::network::{BoxError, Server};
use shared::{NAUTICAL_MILE, OBSERVER_PREFIX};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// UDP port to listen on
    #[arg(short, long, env = "MPRELAY_PORT", default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Maximum distance between sender and receiver in nautical miles
    #[arg(short = 'd', long, default_value_t = 100.0)]
    max_distance_nm: f64,

    /// Callsign prefix identifying observers
    #[arg(long, default_value = OBSERVER_PREFIX)]
    observer_prefix: String,

    /// Seconds of silence after which a peer is dropped
    #[arg(short = 't', long, default_value_t = 10)]
    peer_timeout_secs: u64,
}

impl Args {
    fn into_config(self) -> RelayConfig {
        RelayConfig {
            host: self.host,
            port: self.port,
            max_distance: self.max_distance_nm * NAUTICAL_MILE,
            observer_prefix: self.observer_prefix,
            peer_timeout: Duration::from_secs(self.peer_timeout_secs),
            ..RelayConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = Args::parse().into_config();
    info!(
        "Relaying within {:.0} NM, observers prefixed '{}'",
        config.max_distance / NAUTICAL_MILE,
        config.observer_prefix
    );

    let mut server = Server::new(config).await?;
    let relay = server.relay();

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            let dropped = relay.clear_peers();
            info!("Dropped {} peers", dropped);
        }
    }

    Ok(())
}
