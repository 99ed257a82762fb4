use clap::Parser;
use client::flight::Flight;
use client::network::Client;
use log::info;
use rand::Rng;
use shared::{Geodetic, KNOT};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay address to report to
    #[arg(short = 's', long, default_value = "127.0.0.1:5000")]
    server: String,

    /// Callsign to fly as, random if omitted
    #[arg(short = 'c', long)]
    callsign: Option<String>,

    /// Latitude of the circle centre in degrees
    #[arg(long, default_value_t = 47.45)]
    lat: f64,

    /// Longitude of the circle centre in degrees
    #[arg(long, default_value_t = 8.54)]
    lon: f64,

    /// Altitude in metres
    #[arg(long, default_value_t = 900.0)]
    alt: f64,

    /// Circle radius in metres
    #[arg(short = 'r', long, default_value_t = 5000.0)]
    radius: f64,

    /// Ground speed in knots
    #[arg(long, default_value_t = 120.0)]
    speed: f64,

    /// Position reports per second
    #[arg(long, default_value_t = 1.0)]
    rate: f64,

    /// Aircraft model path reported to other peers
    #[arg(short = 'm', long, default_value = client::flight::DEFAULT_MODEL)]
    model: String,

    /// Chat line sent once after the first report
    #[arg(long)]
    chat: Option<String>,
}

fn random_callsign() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..3)
        .map(|_| char::from(rng.gen_range(b'A'..=b'Z')))
        .collect();
    format!("TG-{}", suffix)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let callsign = args.callsign.unwrap_or_else(random_callsign);

    info!("Starting traffic client...");
    info!("Reporting to: {}", args.server);
    info!(
        "Circling {:.4} {:.4} at {:.0} kt, radius {:.0} m",
        args.lat, args.lon, args.speed, args.radius
    );

    let center = Geodetic::from_degrees(args.lon, args.lat, args.alt);
    let flight = Flight::random(center, args.radius, args.speed * KNOT).with_model(args.model);

    let mut client = Client::new(&args.server, callsign, flight, args.rate, args.chat).await?;

    tokio::select! {
        result = client.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
    }

    info!("Received {} packets from the relay", client.received());

    Ok(())
}
