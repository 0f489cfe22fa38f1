//! The charging station.
//!
//! A [`Station`] owns a ring of electrodes and the MAVs that share them. MAV
//! *i* is bound to electrode *i* (its "left") and electrode *i − 1 mod m*
//! (its "right"), so each electrode is shared by exactly two neighbouring
//! MAVs when the ring is full.
//!
//! # Lifecycle
//!
//! 1. [`Station::new`] validates the configuration and wires the ring
//! 2. [`Station::start`] launches one worker thread per MAV
//! 3. [`Station::shutdown`] asks every MAV to stop, then joins each in turn
//!
//! Dropping a running station performs the shutdown.
//!
//! # Example
//!
//! ```
//! use core::time::Duration;
//! use recharge_station::config::StationConfig;
//! use recharge_station::mav::MavState;
//! use recharge_station::station::Station;
//!
//! let config = StationConfig::new(4)
//!     .with_fly_time(Duration::from_millis(5))
//!     .with_charge_time(Duration::from_millis(5));
//!
//! let mut station = Station::new(config).unwrap();
//! station.start().unwrap();
//! std::thread::sleep(Duration::from_millis(50));
//! station.shutdown().unwrap();
//!
//! assert!(station.states().iter().all(|s| *s == Some(MavState::Stopped)));
//! ```

use crate::config::StationConfig;
use crate::electrode::Electrode;
use crate::mav::{Mav, MavError, MavState};
use std::sync::Arc;

/// Errors that can occur while building or running a station.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// The station was configured without MAVs.
    #[error("a station needs at least one MAV")]
    NoMavs,

    /// The ring is too small for any MAV to hold two distinct electrodes.
    #[error("a ring needs at least two electrodes, got {electrodes}")]
    RingTooSmall {
        /// Configured ring size.
        electrodes: usize,
    },

    /// More MAVs than electrodes to bind them to.
    #[error("{mavs} MAVs cannot share a ring of {electrodes} electrodes")]
    RingMismatch {
        /// Configured MAV count.
        mavs: usize,
        /// Configured ring size.
        electrodes: usize,
    },

    /// A timing of zero was configured.
    #[error("{phase} time must be greater than zero")]
    ZeroDuration {
        /// Which timing was rejected (`"fly"` or `"charge"`).
        phase: &'static str,
    },

    /// A timing in seconds was not a positive, finite number.
    #[error("{phase} time of {secs} seconds is not a positive duration")]
    InvalidSeconds {
        /// Which timing was rejected (`"fly"` or `"charge"`).
        phase: &'static str,
        /// The rejected value.
        secs: f64,
    },

    /// A MAV failed to start or finished with an error.
    #[error(transparent)]
    Mav(#[from] MavError),
}

/// The charging station: a ring of electrodes and the MAVs sharing it.
#[derive(Debug)]
pub struct Station {
    electrodes: Vec<Arc<Electrode>>,
    mavs: Vec<Mav>,
}

impl Station {
    /// Builds the electrode ring and binds every MAV to it.
    ///
    /// No worker is started.
    ///
    /// # Errors
    ///
    /// Returns the [`StationError`] from [`StationConfig::validate`].
    pub fn new(config: StationConfig) -> Result<Self, StationError> {
        config.validate()?;

        let ring = config.electrode_count();
        let electrodes: Vec<Arc<Electrode>> =
            (0..ring).map(|id| Arc::new(Electrode::new(id))).collect();

        let mavs = (0..config.mavs)
            .map(|i| {
                Mav::new(
                    format!("MAV {i}"),
                    Arc::clone(&electrodes[i]),
                    Arc::clone(&electrodes[(i + ring - 1) % ring]),
                    config.fly_time,
                    config.charge_time,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(mavs = mavs.len(), electrodes = ring, "station wired");
        Ok(Self { electrodes, mavs })
    }

    /// Returns the electrode ring.
    #[must_use]
    pub fn electrodes(&self) -> &[Arc<Electrode>] {
        &self.electrodes
    }

    /// Returns the electrode at ring index `id`.
    #[must_use]
    pub fn electrode(&self, id: usize) -> Option<&Electrode> {
        self.electrodes.get(id).map(Arc::as_ref)
    }

    /// Returns all MAVs in ring order.
    #[must_use]
    pub fn mavs(&self) -> &[Mav] {
        &self.mavs
    }

    /// Returns MAV `index`.
    #[must_use]
    pub fn mav(&self, index: usize) -> Option<&Mav> {
        self.mavs.get(index)
    }

    /// Returns a snapshot of every MAV's state, in ring order.
    #[must_use]
    pub fn states(&self) -> Vec<Option<MavState>> {
        self.mavs.iter().map(Mav::state).collect()
    }

    /// Launches every MAV.
    ///
    /// A station starts once. A repeated call is rejected before any worker
    /// is touched, so a running station keeps running. If a worker cannot be
    /// spawned, the workers launched by this call are landed again before the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::Mav`] wrapping [`MavError::AlreadyStarted`]
    /// or [`MavError::Spawn`].
    pub fn start(&mut self) -> Result<(), StationError> {
        if let Some(mav) = self.mavs.iter().find(|mav| mav.is_started()) {
            return Err(MavError::AlreadyStarted {
                name: mav.name().to_owned(),
            }
            .into());
        }

        for index in 0..self.mavs.len() {
            if let Err(err) = self.mavs[index].start() {
                tracing::error!(mav = %self.mavs[index].name(), error = %err, "launch failed");
                self.land(index);
                return Err(err.into());
            }
        }
        tracing::info!(mavs = self.mavs.len(), "station started");
        Ok(())
    }

    /// Stops and joins the first `count` MAVs after a failed start.
    fn land(&mut self, count: usize) {
        let launched = &mut self.mavs[..count];
        for mav in launched.iter() {
            mav.stop();
        }
        for mav in launched {
            if let Err(err) = mav.join() {
                tracing::error!(mav = %mav.name(), error = %err, "worker failed after a failed launch");
            }
        }
    }

    /// Asks every MAV to stop after its current cycle without waiting.
    pub fn request_stop(&self) {
        for mav in &self.mavs {
            mav.stop();
        }
    }

    /// Stops every MAV and waits for each one to land.
    ///
    /// Every worker is joined even if an earlier one failed. Returns
    /// immediately for MAVs that were never started.
    ///
    /// # Errors
    ///
    /// Returns the first worker error encountered.
    pub fn shutdown(&mut self) -> Result<(), StationError> {
        self.request_stop();

        let mut first_error = None;
        for mav in &mut self.mavs {
            if let Err(err) = mav.join() {
                tracing::error!(mav = %mav.name(), error = %err, "worker failed");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err.into()),
            None => {
                tracing::info!("station shut down");
                Ok(())
            }
        }
    }

    /// Returns whether any worker thread is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.mavs.iter().any(Mav::is_active)
    }
}

impl Drop for Station {
    fn drop(&mut self) {
        if !self.mavs.iter().any(Mav::has_worker) {
            return;
        }
        if let Err(err) = self.shutdown() {
            tracing::error!(error = %err, "station shutdown on drop failed");
        }
    }
}
