//! Station configuration.
//!
//! [`StationConfig`] describes the size of the ring and the timing of each
//! MAV's mission cycle. It is validated once, by [`StationConfig::validate`],
//! before any electrode or worker exists.

use crate::station::StationError;
use core::time::Duration;

/// Time a MAV spends flying a mission when not configured otherwise.
pub const DEFAULT_FLY_TIME: Duration = Duration::from_millis(500);

/// Time a MAV spends charging when not configured otherwise.
pub const DEFAULT_CHARGE_TIME: Duration = Duration::from_millis(1500);

/// Configuration for a [`Station`](crate::station::Station).
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use recharge_station::config::StationConfig;
///
/// let config = StationConfig::new(5)
///     .with_fly_time(Duration::from_millis(50))
///     .with_charge_time(Duration::from_millis(150));
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.electrode_count(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationConfig {
    /// Number of MAVs using the station.
    pub mavs: usize,
    /// Number of electrodes on the ring. Defaults to one per MAV.
    pub electrodes: Option<usize>,
    /// Time spent flying each mission.
    pub fly_time: Duration,
    /// Time spent charging after each mission.
    pub charge_time: Duration,
}

impl StationConfig {
    /// Creates a configuration for `mavs` MAVs with default timings.
    #[must_use]
    pub fn new(mavs: usize) -> Self {
        Self {
            mavs,
            electrodes: None,
            fly_time: DEFAULT_FLY_TIME,
            charge_time: DEFAULT_CHARGE_TIME,
        }
    }

    /// Creates a configuration from timings given in (fractional) seconds.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::InvalidSeconds`] if either timing is zero,
    /// negative, NaN or too large to represent.
    ///
    /// # Example
    ///
    /// ```
    /// use recharge_station::config::StationConfig;
    ///
    /// let config = StationConfig::from_secs(4, 0.5, 1.5).unwrap();
    /// assert_eq!(config.fly_time.as_millis(), 500);
    ///
    /// assert!(StationConfig::from_secs(4, -1.0, 0.15).is_err());
    /// ```
    pub fn from_secs(mavs: usize, fly_secs: f64, charge_secs: f64) -> Result<Self, StationError> {
        Ok(Self::new(mavs)
            .with_fly_time(duration_from_secs("fly", fly_secs)?)
            .with_charge_time(duration_from_secs("charge", charge_secs)?))
    }

    /// Sets the number of electrodes on the ring.
    #[must_use]
    pub fn with_electrodes(mut self, electrodes: usize) -> Self {
        self.electrodes = Some(electrodes);
        self
    }

    /// Sets the flying time.
    #[must_use]
    pub fn with_fly_time(mut self, fly_time: Duration) -> Self {
        self.fly_time = fly_time;
        self
    }

    /// Sets the charging time.
    #[must_use]
    pub fn with_charge_time(mut self, charge_time: Duration) -> Self {
        self.charge_time = charge_time;
        self
    }

    /// Returns the ring size this configuration produces.
    #[must_use]
    pub fn electrode_count(&self) -> usize {
        self.electrodes.unwrap_or(self.mavs)
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// - [`StationError::NoMavs`] if there are no MAVs
    /// - [`StationError::RingTooSmall`] if the ring has fewer than two electrodes
    /// - [`StationError::RingMismatch`] if there are more MAVs than electrodes
    /// - [`StationError::ZeroDuration`] if a timing is zero
    pub fn validate(&self) -> Result<(), StationError> {
        if self.mavs == 0 {
            return Err(StationError::NoMavs);
        }
        let electrodes = self.electrode_count();
        if electrodes < 2 {
            return Err(StationError::RingTooSmall { electrodes });
        }
        if self.mavs > electrodes {
            return Err(StationError::RingMismatch {
                mavs: self.mavs,
                electrodes,
            });
        }
        if self.fly_time.is_zero() {
            return Err(StationError::ZeroDuration { phase: "fly" });
        }
        if self.charge_time.is_zero() {
            return Err(StationError::ZeroDuration { phase: "charge" });
        }
        Ok(())
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self::new(10)
    }
}

fn duration_from_secs(phase: &'static str, secs: f64) -> Result<Duration, StationError> {
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        _ => Err(StationError::InvalidSeconds { phase, secs }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_mission_timings() {
        let config = StationConfig::default();
        assert_eq!(config.mavs, 10);
        assert_eq!(config.electrode_count(), 10);
        assert_eq!(config.fly_time, Duration::from_millis(500));
        assert_eq!(config.charge_time, Duration::from_millis(1500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_mavs_rejected() {
        let err = StationConfig::new(0).validate().unwrap_err();
        assert!(matches!(err, StationError::NoMavs));
    }

    #[test]
    fn single_electrode_ring_rejected() {
        let err = StationConfig::new(1).validate().unwrap_err();
        assert!(matches!(err, StationError::RingTooSmall { electrodes: 1 }));

        // One MAV on a two-electrode ring is fine.
        assert!(StationConfig::new(1).with_electrodes(2).validate().is_ok());
    }

    #[test]
    fn more_mavs_than_electrodes_rejected() {
        let err = StationConfig::new(5).with_electrodes(4).validate().unwrap_err();
        assert!(matches!(
            err,
            StationError::RingMismatch {
                mavs: 5,
                electrodes: 4
            }
        ));
    }

    #[test]
    fn zero_durations_rejected() {
        let err = StationConfig::new(3)
            .with_fly_time(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(matches!(err, StationError::ZeroDuration { phase: "fly" }));

        let err = StationConfig::new(3)
            .with_charge_time(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(matches!(err, StationError::ZeroDuration { phase: "charge" }));
    }

    #[test]
    fn from_secs_rejects_non_positive_and_nan() {
        for bad in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            assert!(StationConfig::from_secs(3, bad, 1.0).is_err());
            assert!(StationConfig::from_secs(3, 1.0, bad).is_err());
        }
    }

    #[test]
    fn from_secs_converts_fractions() {
        let config = StationConfig::from_secs(2, 0.25, 1.5).unwrap();
        assert_eq!(config.fly_time, Duration::from_millis(250));
        assert_eq!(config.charge_time, Duration::from_millis(1500));
    }
}
