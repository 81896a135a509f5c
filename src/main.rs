//! Evotherm - View Honeywell Evohome room temperatures
//!
//! A command-line tool that reads room temperatures from the Evohome web
//! service through a shared read-through cache, so the polling loop stays
//! within the staleness TTL instead of hammering the vendor API.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use evotherm::api::RestBackend;
use evotherm::cache::{CacheError, ThermostatCache};
use evotherm::cli::{Cli, RunConfig};
use evotherm::data::{Credentials, RoomReading, TemperatureUnit};

/// Initializes the tracing subscriber; --debug raises the default level
fn setup_logging(debug: bool) {
    let default_filter = if debug { "evotherm=debug" } else { "evotherm=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints one reading as a single aligned line
fn print_reading(reading: &RoomReading) {
    println!(
        "{:<20} {:>6.1}{unit}  (target {:.1}{unit})",
        reading.name,
        reading.current_temperature,
        reading.setpoint,
        unit = TemperatureUnit::Celsius,
    );
}

/// Reads and prints either one room or the whole snapshot
async fn show(
    cache: &ThermostatCache,
    config: &RunConfig,
    force_refresh: bool,
) -> Result<(), CacheError> {
    match &config.room {
        Some(room) => {
            let reading = cache.room_temperature(room, force_refresh).await?;
            print_reading(&reading);
        }
        None => {
            for reading in cache.room_temperatures(force_refresh).await? {
                print_reading(&reading);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    setup_logging(args.debug);

    let config = match RunConfig::from_cli(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let backend = Arc::new(RestBackend::new());
    let cache = ThermostatCache::new(backend);
    let credentials = Credentials::new(args.username, args.password, args.debug);
    if let Err(e) = cache.init(credentials).await {
        eprintln!("Failed to initialize: {}", e);
        return ExitCode::FAILURE;
    }

    // First read honors --force-refresh; later watch iterations rely on the
    // staleness TTL to decide when to refetch.
    if let Err(e) = show(&cache, &config, config.force_refresh).await {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    if let Some(interval) = config.watch {
        loop {
            tokio::time::sleep(interval).await;
            if let Err(e) = show(&cache, &config, false).await {
                // Keep polling; the cache re-attempts login on the next read.
                eprintln!("{}", e);
            }
        }
    }

    ExitCode::SUCCESS
}
