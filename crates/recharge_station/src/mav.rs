//! MAV workers.
//!
//! A [`Mav`] flies missions on its own OS thread. Each cycle it flies for
//! its fly time, lands and waits for both of its electrodes, charges for its
//! charge time, then disconnects and either takes off again or stops:
//!
//! ```text
//! Flying ─▶ Waiting ─▶ Charging ─┬─▶ Flying   (still running)
//!                                └─▶ Stopped  (stop requested)
//! ```
//!
//! The current [`MavState`] is published before the MAV begins the matching
//! sleep or wait, so a poller never sees a state the MAV has not reached yet
//! nor one it has already left.
//!
//! Stopping is cooperative. [`Mav::stop`] only clears the running flag; the
//! worker checks it once per cycle, after the electrodes are released, so a
//! MAV always finishes the cycle it is in.

use crate::bay::ChargingBay;
use crate::electrode::{Electrode, ElectrodeError};
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use core::time::Duration;
use parking_lot::{Mutex, RwLock};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Phase of a MAV's mission cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MavState {
    /// Flying a mission.
    Flying,
    /// Landed, waiting for both electrodes.
    Waiting,
    /// Holding both electrodes and charging.
    Charging,
    /// Finished its last cycle. Terminal.
    Stopped,
}

impl fmt::Display for MavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Flying => "flying",
            Self::Waiting => "waiting",
            Self::Charging => "charging",
            Self::Stopped => "stopped",
        })
    }
}

/// Errors raised by a MAV or its worker thread.
#[derive(Debug, thiserror::Error)]
pub enum MavError {
    /// A fly or charge time of zero was supplied.
    #[error("{name}: {phase} time must be greater than zero")]
    ZeroDuration {
        /// Name of the MAV.
        name: String,
        /// Which timing was rejected (`"fly"` or `"charge"`).
        phase: &'static str,
    },

    /// Both bindings refer to the same electrode.
    #[error("{name}: left and right electrodes are both electrode {id}")]
    SameElectrode {
        /// Name of the MAV.
        name: String,
        /// The shared electrode id.
        id: usize,
    },

    /// `start()` was called on a MAV that has already been launched.
    #[error("{name} has already been started")]
    AlreadyStarted {
        /// Name of the MAV.
        name: String,
    },

    /// The OS refused to spawn the worker thread.
    #[error("failed to spawn worker for {name}")]
    Spawn {
        /// Name of the MAV.
        name: String,
        /// Underlying spawn error.
        #[source]
        source: io::Error,
    },

    /// The worker thread panicked.
    #[error("worker for {name} panicked")]
    WorkerPanicked {
        /// Name of the MAV.
        name: String,
    },

    /// An electrode was released while not held.
    #[error(transparent)]
    Electrode(#[from] ElectrodeError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared worker state
// ─────────────────────────────────────────────────────────────────────────────

/// State shared between a [`Mav`] handle and its worker thread.
struct Flight {
    name: String,
    state: RwLock<Option<MavState>>,
    fly_time: Mutex<Duration>,
    charge_time: Mutex<Duration>,
    running: AtomicBool,
    charges: AtomicU64,
    left: Arc<Electrode>,
    right: Arc<Electrode>,
    #[cfg(test)]
    fail_while_charging: AtomicBool,
}

impl Flight {
    fn enter(&self, state: MavState) {
        *self.state.write() = Some(state);
        tracing::debug!(mav = %self.name, %state, "state changed");
    }

    /// Runs mission cycles until a stop is requested.
    fn fly_missions(&self) -> Result<(), MavError> {
        tracing::info!(mav = %self.name, "taking off");
        loop {
            let fly_time = *self.fly_time.lock();
            self.enter(MavState::Flying);
            thread::sleep(fly_time);

            self.enter(MavState::Waiting);
            let bay = ChargingBay::connect(&self.left, &self.right);

            let charge_time = *self.charge_time.lock();
            self.enter(MavState::Charging);
            #[cfg(test)]
            if self.fail_while_charging.load(Ordering::SeqCst) {
                panic!("{} lost power while charging", self.name);
            }
            thread::sleep(charge_time);
            bay.disconnect()?;
            let charges = self.charges.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::trace!(mav = %self.name, charges, "charge complete");

            if !self.running.load(Ordering::SeqCst) {
                break;
            }
        }
        self.enter(MavState::Stopped);
        tracing::info!(mav = %self.name, "landed for good");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mav
// ─────────────────────────────────────────────────────────────────────────────

/// A MAV bound to two electrodes of the station ring.
///
/// The MAV shares its electrodes with its neighbours; it never owns them.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use std::sync::Arc;
/// use recharge_station::electrode::Electrode;
/// use recharge_station::mav::{Mav, MavState};
///
/// let left = Arc::new(Electrode::new(1));
/// let right = Arc::new(Electrode::new(0));
/// let mut mav = Mav::new(
///     "MAV 1",
///     left,
///     right,
///     Duration::from_millis(5),
///     Duration::from_millis(5),
/// )
/// .unwrap();
///
/// assert_eq!(mav.state(), None);
/// mav.start().unwrap();
/// mav.stop();
/// mav.join().unwrap();
/// assert_eq!(mav.state(), Some(MavState::Stopped));
/// assert_eq!(mav.charges(), 1);
/// ```
pub struct Mav {
    flight: Arc<Flight>,
    worker: Option<JoinHandle<Result<(), MavError>>>,
    started: bool,
}

impl Mav {
    /// Creates a MAV bound to `left` and `right`. The worker is not started.
    ///
    /// # Errors
    ///
    /// - [`MavError::ZeroDuration`] if either timing is zero
    /// - [`MavError::SameElectrode`] if both bindings share an id
    pub fn new(
        name: impl Into<String>,
        left: Arc<Electrode>,
        right: Arc<Electrode>,
        fly_time: Duration,
        charge_time: Duration,
    ) -> Result<Self, MavError> {
        let name = name.into();
        check_duration(&name, "fly", fly_time)?;
        check_duration(&name, "charge", charge_time)?;
        if left.id() == right.id() {
            return Err(MavError::SameElectrode { name, id: left.id() });
        }

        Ok(Self {
            flight: Arc::new(Flight {
                name,
                state: RwLock::new(None),
                fly_time: Mutex::new(fly_time),
                charge_time: Mutex::new(charge_time),
                running: AtomicBool::new(true),
                charges: AtomicU64::new(0),
                left,
                right,
                #[cfg(test)]
                fail_while_charging: AtomicBool::new(false),
            }),
            worker: None,
            started: false,
        })
    }

    /// Returns the MAV's name, which also names its worker thread.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.flight.name
    }

    /// Returns the current phase, or `None` if the worker has not begun.
    #[must_use]
    pub fn state(&self) -> Option<MavState> {
        *self.flight.state.read()
    }

    /// Returns the electrode at this MAV's own ring index.
    #[must_use]
    pub fn left(&self) -> &Arc<Electrode> {
        &self.flight.left
    }

    /// Returns the electrode shared with the previous MAV on the ring.
    #[must_use]
    pub fn right(&self) -> &Arc<Electrode> {
        &self.flight.right
    }

    /// Returns the current fly time.
    #[must_use]
    pub fn fly_time(&self) -> Duration {
        *self.flight.fly_time.lock()
    }

    /// Returns the current charge time.
    #[must_use]
    pub fn charge_time(&self) -> Duration {
        *self.flight.charge_time.lock()
    }

    /// Changes the fly time. Applies from the next `Flying` phase.
    ///
    /// # Errors
    ///
    /// Returns [`MavError::ZeroDuration`] if `fly_time` is zero.
    pub fn set_fly_time(&self, fly_time: Duration) -> Result<(), MavError> {
        check_duration(&self.flight.name, "fly", fly_time)?;
        *self.flight.fly_time.lock() = fly_time;
        Ok(())
    }

    /// Changes the charge time. Applies from the next `Charging` phase.
    ///
    /// # Errors
    ///
    /// Returns [`MavError::ZeroDuration`] if `charge_time` is zero.
    pub fn set_charge_time(&self, charge_time: Duration) -> Result<(), MavError> {
        check_duration(&self.flight.name, "charge", charge_time)?;
        *self.flight.charge_time.lock() = charge_time;
        Ok(())
    }

    /// Returns how many charging cycles have completed.
    #[must_use]
    pub fn charges(&self) -> u64 {
        self.flight.charges.load(Ordering::SeqCst)
    }

    /// Returns whether the MAV will start another cycle after this one.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.flight.running.load(Ordering::SeqCst)
    }

    /// Returns whether [`start`](Self::start) has succeeded.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Returns whether the worker thread is still alive.
    ///
    /// False before [`start`](Self::start) and once the worker has ended,
    /// however it ended.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// Returns whether a worker was launched and has not been joined yet.
    pub(crate) fn has_worker(&self) -> bool {
        self.worker.is_some()
    }

    /// Launches the worker thread.
    ///
    /// # Errors
    ///
    /// - [`MavError::AlreadyStarted`] if the MAV was started before
    /// - [`MavError::Spawn`] if the thread could not be created
    pub fn start(&mut self) -> Result<(), MavError> {
        if self.started {
            return Err(MavError::AlreadyStarted {
                name: self.flight.name.clone(),
            });
        }

        let flight = Arc::clone(&self.flight);
        let worker = thread::Builder::new()
            .name(self.flight.name.clone())
            .spawn(move || flight.fly_missions())
            .map_err(|source| MavError::Spawn {
                name: self.flight.name.clone(),
                source,
            })?;

        self.worker = Some(worker);
        self.started = true;
        Ok(())
    }

    /// Asks the MAV to stop after its current cycle. Does not wait.
    pub fn stop(&self) {
        self.flight.running.store(false, Ordering::SeqCst);
    }

    /// Waits for the worker thread to finish.
    ///
    /// Call [`stop`](Self::stop) first, otherwise this waits forever. Returns
    /// immediately if there is no worker to wait for.
    ///
    /// # Errors
    ///
    /// - [`MavError::WorkerPanicked`] if the worker panicked
    /// - the worker's own error, e.g. [`MavError::Electrode`]
    pub fn join(&mut self) -> Result<(), MavError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        worker.join().map_err(|_| MavError::WorkerPanicked {
            name: self.flight.name.clone(),
        })?
    }
}

impl Drop for Mav {
    fn drop(&mut self) {
        if self.worker.is_none() {
            return;
        }
        self.stop();
        if let Err(err) = self.join() {
            tracing::error!(mav = %self.flight.name, error = %err, "worker failed");
        }
    }
}

impl fmt::Debug for Mav {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mav")
            .field("name", &self.flight.name)
            .field("state", &self.state())
            .field("left", &self.flight.left.id())
            .field("right", &self.flight.right.id())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

fn check_duration(name: &str, phase: &'static str, duration: Duration) -> Result<(), MavError> {
    if duration.is_zero() {
        return Err(MavError::ZeroDuration {
            name: name.to_owned(),
            phase,
        });
    }
    Ok(())
}
