//! Daemon that polls a GMC Geiger counter and logs its sensor values.
//!
//! On startup the device identity and calibration are probed, then a poll
//! task publishes CPM, dose rate and battery voltage at a fixed interval
//! until Ctrl-C.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_serial::SerialStream;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gmcread::{GmcClient, Poller, SensorState, DEFAULT_BAUD, DEFAULT_CALIBRATION_FACTOR};

// How many times to re-open and probe the device before giving up at startup
const SETUP_ATTEMPTS: u32 = 3;

#[derive(Parser)]
#[command(about = "Poll a GQ GMC Geiger counter over a serial connection")]
struct Args {
    /// Serial device path, e.g. /dev/ttyUSB0
    port: String,

    /// Baud rate of the serial connection
    #[arg(long, default_value_t = DEFAULT_BAUD)]
    baud: u32,

    /// Seconds between poll cycles
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Override the CPM → µSv/h calibration factor instead of reading it
    /// from the device
    #[arg(long)]
    calibration: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let (client, calibration_factor) = connect_and_probe(&args)
        .await
        .with_context(|| format!("could not set up GMC device at {}", args.port))?;

    let (poller, mut state_rx) =
        Poller::spawn(client, Duration::from_secs(args.interval), calibration_factor);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                match state {
                    SensorState::Available(reading) => info!(
                        cpm = reading.cpm,
                        dose_rate_usv_h = %format!("{:.3}", reading.dose_rate_usv_h),
                        battery_voltage_v = reading.battery_voltage_v,
                        "reading"
                    ),
                    SensorState::Unavailable => warn!("sensors unavailable"),
                }
            }
        }
    }

    poller.stop().await;
    Ok(())
}

/// Open the device, read its identity and calibration, retrying from scratch
/// a few times since these devices occasionally garble their first exchanges.
async fn connect_and_probe(args: &Args) -> anyhow::Result<(GmcClient<SerialStream>, f64)> {
    let mut attempt = 1;
    loop {
        match probe(args).await {
            Ok(probed) => return Ok(probed),
            Err(err) if attempt < SETUP_ATTEMPTS => {
                warn!(%err, attempt, "device probe failed, retrying");
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn probe(args: &Args) -> anyhow::Result<(GmcClient<SerialStream>, f64)> {
    let mut client = GmcClient::open(&args.port, args.baud)?;

    let serial_number = client.get_serial_number().await?;
    let version = client.get_version().await?;
    info!(
        model = %version.model,
        revision = %version.revision,
        %serial_number,
        "connected to GMC device"
    );

    let calibration_factor = match args.calibration {
        Some(factor) => factor,
        None => match client.get_calibration_factor().await {
            Ok(factor) => factor,
            Err(err) => {
                warn!(
                    %err,
                    "could not read calibration from device, using default {DEFAULT_CALIBRATION_FACTOR}"
                );
                DEFAULT_CALIBRATION_FACTOR
            }
        },
    };
    info!(calibration_factor, "using calibration");

    Ok((client, calibration_factor))
}
