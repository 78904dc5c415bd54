use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sensor_simulator::errors::{Error, Result};
use sensor_simulator::runner;
use sensor_simulator::shutdown;
use sensor_simulator::sensor::{
    PresenceSensor, RainGauge, RainSchedule, Sensor, PRESENCE_DEVICE_ID, RAIN_DEVICE_ID,
};
use sensor_simulator::transmit::{Endpoint, Transmitter, DEFAULT_API_URL, DEFAULT_COMPLEX_ID};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Simulated court sensors posting telemetry to the complex API
#[derive(Debug, Parser)]
#[command(name = "sensor-simulator", version, about)]
struct Cli {
    /// Base URL of the telemetry API
    #[arg(long, env = "SIM_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// Complex the device belongs to
    #[arg(long, env = "SIM_COMPLEX_ID", default_value_t = DEFAULT_COMPLEX_ID, global = true)]
    complex_id: u32,

    /// HTTP request timeout; the client default applies when unset
    #[arg(long, env = "SIM_TIMEOUT_SECS", global = true)]
    timeout_secs: Option<u64>,

    /// Stop after this many readings instead of running forever
    #[arg(long, env = "SIM_ITERATIONS", global = true)]
    iterations: Option<u64>,

    /// Seed for a reproducible sequence of readings
    #[arg(long, env = "SIM_SEED", global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    sensor: SensorCommand,
}

#[derive(Debug, Subcommand)]
enum SensorCommand {
    /// Presence sensor: random occupied/free flag at a fixed interval
    Presence {
        #[arg(long, env = "SIM_DEVICE_ID", default_value_t = PRESENCE_DEVICE_ID)]
        device_id: u32,

        #[arg(long, env = "SIM_INTERVAL_SECS", default_value_t = 15)]
        interval_secs: u64,
    },
    /// Rain gauge: random intensity in mm/h, sampled faster in heavy rain
    Rain {
        #[arg(long, env = "SIM_DEVICE_ID", default_value_t = RAIN_DEVICE_ID)]
        device_id: u32,

        /// Intensity at or above which the heavy-rain interval applies
        #[arg(long, env = "SIM_RAIN_THRESHOLD", default_value_t = 2.5)]
        threshold: f64,

        #[arg(long, env = "SIM_RAIN_CALM_SECS", default_value_t = 15)]
        calm_secs: u64,

        #[arg(long, env = "SIM_RAIN_HEAVY_SECS", default_value_t = 5)]
        heavy_secs: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Status lines own stdout; diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.sensor {
        SensorCommand::Presence {
            device_id,
            interval_secs,
        } => {
            let sensor = PresenceSensor::new(*device_id, Duration::from_secs(*interval_secs));
            simulate(&cli, sensor).await
        }
        SensorCommand::Rain {
            device_id,
            threshold,
            calm_secs,
            heavy_secs,
        } => {
            if !threshold.is_finite() {
                error!("{}", Error::Config(format!("rain threshold {} is not finite", threshold)));
                std::process::exit(1);
            }
            let schedule = RainSchedule {
                threshold: *threshold,
                calm: Duration::from_secs(*calm_secs),
                heavy: Duration::from_secs(*heavy_secs),
            };
            simulate(&cli, RainGauge::new(*device_id, schedule)).await
        }
    };

    if let Err(e) = result {
        error!("Simulator failed: {}", e);
        std::process::exit(1);
    }
}

async fn simulate<S: Sensor>(cli: &Cli, sensor: S) -> Result<()> {
    let endpoint = Endpoint::new(&cli.api_url, cli.complex_id, sensor.device_id())?;
    let transmitter = Transmitter::new(&endpoint, cli.timeout_secs.map(Duration::from_secs))?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!("Starting {} sensor simulation", sensor.name());
    info!("Posting telemetry to {}", transmitter.url());

    let mut stdout = std::io::stdout();
    tokio::select! {
        summary = runner::run(&sensor, &transmitter, &mut rng, &mut stdout, cli.iterations) => {
            info!(
                "Finished after {} readings ({} delivered, {} failed)",
                summary.iterations, summary.delivered, summary.failed
            );
        }
        _ = shutdown::wait_for(tokio::signal::ctrl_c()) => {}
    }

    Ok(())
}
