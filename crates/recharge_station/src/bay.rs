//! Ordered acquisition of an electrode pair.
//!
//! Every MAV needs two adjacent electrodes on a ring. If each MAV took its
//! "left" electrode and then its "right", all of them could end up holding
//! one electrode each while waiting on a neighbour forever. A
//! [`ChargingBay`] instead always locks the electrode with the lower
//! [`id`](Electrode::id) first, so the ring's highest electrode can never
//! close a waiting cycle.

use crate::electrode::{Electrode, ElectrodeError, ElectrodeGuard};

/// Both electrodes of a charging MAV, held together.
///
/// Dropping the bay releases the higher electrode and then the lower one.
#[must_use = "dropping the bay disconnects both electrodes immediately"]
#[derive(Debug)]
pub struct ChargingBay<'a> {
    // Field order is drop order: higher id first.
    higher: ElectrodeGuard<'a>,
    lower: ElectrodeGuard<'a>,
}

impl<'a> ChargingBay<'a> {
    /// Blocks until both electrodes are held, lower id first.
    ///
    /// The two electrodes must have distinct ids.
    pub fn connect(a: &'a Electrode, b: &'a Electrode) -> Self {
        debug_assert_ne!(a.id(), b.id(), "a bay needs two distinct electrodes");
        let (lower, higher) = if a.id() < b.id() { (a, b) } else { (b, a) };

        let lower = lower.lock();
        tracing::trace!(electrode = lower.electrode().id(), "connected lower electrode");
        let higher = higher.lock();
        tracing::trace!(electrode = higher.electrode().id(), "connected higher electrode");

        Self { higher, lower }
    }

    /// Returns the ids of the held electrodes, lower first.
    #[must_use]
    pub fn ids(&self) -> (usize, usize) {
        (self.lower.electrode().id(), self.higher.electrode().id())
    }

    /// Releases both electrodes, higher id first.
    ///
    /// # Errors
    ///
    /// Returns the first [`ElectrodeError`] encountered. The lower electrode
    /// is still released if the higher one fails.
    pub fn disconnect(self) -> Result<(), ElectrodeError> {
        let Self { higher, lower } = self;
        higher.release()?;
        lower.release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn connect_orders_by_id_not_argument_position() {
        let e3 = Electrode::new(3);
        let e0 = Electrode::new(0);

        let bay = ChargingBay::connect(&e3, &e0);
        assert_eq!(bay.ids(), (0, 3));
        assert!(e0.is_held() && e3.is_held());

        bay.disconnect().unwrap();
        assert!(!e0.is_held() && !e3.is_held());
    }

    #[test]
    fn drop_releases_both() {
        let a = Electrode::new(1);
        let b = Electrode::new(2);
        {
            let _bay = ChargingBay::connect(&a, &b);
        }
        assert!(!a.is_held());
        assert!(!b.is_held());
    }

    #[test]
    fn disconnect_releases_lower_even_if_higher_fails() {
        let a = Electrode::new(1);
        let b = Electrode::new(2);
        let bay = ChargingBay::connect(&a, &b);

        // Someone else wrongly frees the higher electrode.
        b.release().unwrap();

        assert_eq!(bay.disconnect(), Err(ElectrodeError::NotHeld { id: 2 }));
        assert!(!a.is_held());
    }

    #[test]
    fn waits_on_lower_without_touching_higher() {
        let low = Arc::new(Electrode::new(0));
        let high = Arc::new(Electrode::new(1));
        assert!(low.acquire(false));

        let (l, h) = (Arc::clone(&low), Arc::clone(&high));
        let waiter = thread::spawn(move || {
            let bay = ChargingBay::connect(&h, &l);
            bay.disconnect().unwrap();
        });

        thread::sleep(Duration::from_millis(30));
        // The waiter is blocked on the lower electrode and holds nothing.
        assert!(!high.is_held());

        low.release().unwrap();
        waiter.join().expect("waiter panicked");
        assert!(!low.is_held() && !high.is_held());
    }
}
