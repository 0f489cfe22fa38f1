//! Exclusive charging slots.
//!
//! An [`Electrode`] is a single mutual-exclusion slot on the station ring.
//! Two neighbouring MAVs share each electrode, and a MAV must own both of
//! its electrodes at once to charge.
//!
//! Ownership is tracked as a `held` flag guarded by a [`parking_lot::Mutex`]
//! and a [`parking_lot::Condvar`] that wakes blocked acquirers. Unlike a
//! standard mutex guard, an electrode may be released from any thread: a
//! caller acquires it with [`Electrode::acquire`] and gives it back with
//! [`Electrode::release`], or uses the scoped [`ElectrodeGuard`] returned by
//! [`Electrode::lock`].
//!
//! # Fairness
//!
//! There is no first-come-first-served promise. A release wakes one waiter,
//! and `parking_lot` only guarantees eventual fairness for the inner mutex, so
//! a thread that re-acquires immediately after releasing may win against a
//! thread that has been waiting longer.
//!
//! # Example
//!
//! ```
//! use recharge_station::electrode::{Electrode, ElectrodeError};
//!
//! let electrode = Electrode::new(0);
//! assert!(electrode.acquire(true));
//! assert!(!electrode.acquire(false));
//! electrode.release().unwrap();
//!
//! // Releasing again is a caller bug and is reported.
//! assert!(matches!(electrode.release(), Err(ElectrodeError::NotHeld { id: 0 })));
//! ```

use core::fmt;
use parking_lot::{Condvar, Mutex};

/// Errors that can occur when handing an electrode back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElectrodeError {
    /// `release()` was called on an electrode nobody holds.
    #[error("electrode {id} released while not held")]
    NotHeld {
        /// Ring index of the electrode.
        id: usize,
    },
}

/// A single exclusive slot on the charging ring.
///
/// The `id` is the electrode's position in the ring. MAVs order their
/// acquisitions by it, so it must be unique within a station.
pub struct Electrode {
    id: usize,
    held: Mutex<bool>,
    freed: Condvar,
}

impl Electrode {
    /// Creates a free electrode with the given ring index.
    #[must_use]
    pub fn new(id: usize) -> Self {
        Self {
            id,
            held: Mutex::new(false),
            freed: Condvar::new(),
        }
    }

    /// Returns the electrode's ring index.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns whether someone currently holds this electrode.
    ///
    /// The answer may be stale by the time the caller reads it. Intended for
    /// displays and diagnostics, not for deciding whether to acquire.
    #[must_use]
    pub fn is_held(&self) -> bool {
        *self.held.lock()
    }

    /// Attempts to take the electrode.
    ///
    /// With `blocking` set, waits as long as necessary for the electrode to
    /// become free, marks it held and returns `true`. Without it, returns
    /// `true` only if the electrode was free, and `false` (leaving the current
    /// holder untouched) otherwise.
    pub fn acquire(&self, blocking: bool) -> bool {
        let mut held = self.held.lock();
        if *held {
            if !blocking {
                return false;
            }
            tracing::trace!(electrode = self.id, "waiting for electrode");
            while *held {
                self.freed.wait(&mut held);
            }
        }
        *held = true;
        true
    }

    /// Marks the electrode free and wakes one waiter.
    ///
    /// # Errors
    ///
    /// Returns [`ElectrodeError::NotHeld`] if the electrode is not held. This
    /// always indicates a logic bug in the caller.
    pub fn release(&self) -> Result<(), ElectrodeError> {
        let mut held = self.held.lock();
        if !*held {
            return Err(ElectrodeError::NotHeld { id: self.id });
        }
        *held = false;
        drop(held);
        self.freed.notify_one();
        Ok(())
    }

    /// Blocks until the electrode is free and returns a guard that releases
    /// it when dropped.
    pub fn lock(&self) -> ElectrodeGuard<'_> {
        self.acquire(true);
        ElectrodeGuard::new(self)
    }

    /// Takes the electrode if it is free, without blocking.
    pub fn try_lock(&self) -> Option<ElectrodeGuard<'_>> {
        self.acquire(false).then(|| ElectrodeGuard::new(self))
    }
}

impl fmt::Debug for Electrode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Electrode")
            .field("id", &self.id)
            .field("held", &self.is_held())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ElectrodeGuard
// ─────────────────────────────────────────────────────────────────────────────

/// Scoped ownership of an [`Electrode`].
///
/// The electrode is released when the guard goes out of scope, including
/// while unwinding from a panic. Use [`ElectrodeGuard::release`] to hand it
/// back explicitly and observe a failed release.
#[must_use = "dropping the guard releases the electrode immediately"]
pub struct ElectrodeGuard<'a> {
    electrode: &'a Electrode,
    released: bool,
}

impl<'a> ElectrodeGuard<'a> {
    fn new(electrode: &'a Electrode) -> Self {
        Self {
            electrode,
            released: false,
        }
    }

    /// Returns the guarded electrode.
    #[must_use]
    pub fn electrode(&self) -> &Electrode {
        self.electrode
    }

    /// Releases the electrode now.
    ///
    /// # Errors
    ///
    /// Returns [`ElectrodeError::NotHeld`] if the electrode was already
    /// released behind the guard's back.
    pub fn release(mut self) -> Result<(), ElectrodeError> {
        self.released = true;
        self.electrode.release()
    }
}

impl Drop for ElectrodeGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.electrode.release() {
            // Drop cannot propagate; the explicit `release()` path does.
            tracing::error!(electrode = self.electrode.id, error = %err, "guard release failed");
        }
    }
}

impl fmt::Debug for ElectrodeGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElectrodeGuard")
            .field("electrode", &self.electrode.id)
            .field("released", &self.released)
            .finish()
    }
}
