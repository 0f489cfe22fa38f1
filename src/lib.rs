//! A multi-MAV recharging station.
//!
//! MAVs fly missions, land, and charge from two electrodes on a shared ring.
//! Neighbouring MAVs share an electrode, and the station keeps the ring free
//! of deadlock by acquiring each pair in electrode order.
//!
//! Enable the `tracing` feature to re-export the `recharge_tracing`
//! subscriber setup as `recharge::tracing`.

pub use recharge_station::*;

/// Tracing subscriber setup.
#[cfg(feature = "tracing")]
pub use recharge_tracing as tracing;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use recharge_station::prelude::*;
}
