//! The core of the MAV recharging station.
//!
//! `recharge_station` models *n* MAVs that repeatedly fly a mission, land,
//! charge from two electrodes on a shared ring, and take off again:
//!
//! - [`electrode`] - Exclusive charging slots and their scoped guards
//! - [`bay`] - Deadlock-free acquisition of an electrode pair
//! - [`mav`] - The per-MAV worker thread and its state machine
//! - [`station`] - Ring wiring and collective start/shutdown
//! - [`config`] - Station configuration
//!
//! # Deadlock freedom
//!
//! Neighbouring MAVs share an electrode, so the ring is a dining-philosophers
//! table. Each MAV locks the lower-numbered of its two electrodes first (see
//! [`bay::ChargingBay`]), which rules out a circular wait for any ring of two
//! or more electrodes.
//!
//! # Example
//!
//! ```
//! use core::time::Duration;
//! use recharge_station::prelude::*;
//!
//! let config = StationConfig::from_secs(3, 0.005, 0.005).unwrap();
//! let mut station = Station::new(config).unwrap();
//!
//! station.start().unwrap();
//! std::thread::sleep(Duration::from_millis(40));
//! station.shutdown().unwrap();
//!
//! for mav in station.mavs() {
//!     assert_eq!(mav.state(), Some(MavState::Stopped));
//! }
//! ```

/// Deadlock-free acquisition of an electrode pair.
pub mod bay;

/// Station configuration.
pub mod config;

/// Exclusive charging slots.
pub mod electrode;

/// MAV workers and their mission cycle.
pub mod mav;

/// Ring wiring and station lifecycle.
pub mod station;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::bay::ChargingBay;
    pub use crate::config::{DEFAULT_CHARGE_TIME, DEFAULT_FLY_TIME, StationConfig};
    pub use crate::electrode::{Electrode, ElectrodeError, ElectrodeGuard};
    pub use crate::mav::{Mav, MavError, MavState};
    pub use crate::station::{Station, StationError};
}
