//! Demo recharging station.
//!
//! Launches a ring of MAVs, lets them fly missions for a while, reporting
//! the station's state once a second, then lands them all.
//!
//! # Usage
//!
//! ```bash
//! recharge [mavs] [seconds] [pretty|compact|json]
//! ```
//!
//! # Example
//!
//! ```bash
//! recharge 10 10 compact
//! ```

use core::time::Duration;
use recharge_station::prelude::*;
use recharge_tracing::{TracingConfig, TracingFormat};
use std::time::Instant;

/// Command line settings, positional and all optional.
struct Args {
    mavs: usize,
    seconds: u64,
    format: TracingFormat,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let mut args = std::env::args().skip(1);
        let mavs: usize = match args.next() {
            Some(raw) => raw.parse().map_err(|_| format!("invalid MAV count: {raw}"))?,
            None => 10,
        };
        let seconds: u64 = match args.next() {
            Some(raw) => raw.parse().map_err(|_| format!("invalid duration: {raw}"))?,
            None => 10,
        };
        let format = match args.next() {
            Some(raw) => {
                TracingFormat::from_name(&raw).ok_or_else(|| format!("unknown format: {raw}"))?
            }
            None => TracingFormat::Compact,
        };
        Ok(Self {
            mavs,
            seconds,
            format,
        })
    }
}

fn summary(station: &Station) -> String {
    station
        .states()
        .iter()
        .map(|state| match state {
            Some(MavState::Flying) => 'F',
            Some(MavState::Waiting) => 'W',
            Some(MavState::Charging) => 'C',
            Some(MavState::Stopped) => 'S',
            None => '-',
        })
        .collect()
}

fn run(args: &Args) -> Result<(), StationError> {
    let mut station = Station::new(StationConfig::new(args.mavs))?;
    station.start()?;

    let flight = Duration::from_secs(args.seconds);
    let started = Instant::now();
    while started.elapsed() < flight {
        std::thread::sleep(Duration::from_secs(1).min(flight.saturating_sub(started.elapsed())));
        tracing::info!(states = %summary(&station), "station report");
    }

    tracing::info!("landing all MAVs");
    station.shutdown()?;

    for mav in station.mavs() {
        tracing::info!(mav = %mav.name(), charges = mav.charges(), "mission log");
    }
    Ok(())
}

fn main() {
    let args = Args::parse().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("Usage: recharge [mavs] [seconds] [pretty|compact|json]");
        std::process::exit(1);
    });

    TracingConfig::new().with_format(args.format).init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
