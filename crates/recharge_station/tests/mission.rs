//! Mission-cycle tests for a single MAV and for station wiring.
//!
//! The harness holds a MAV's electrodes itself and hands them over after a
//! delay, so each phase lasts long enough to be observed by polling.

use core::time::Duration;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use recharge_station::prelude::*;

/// How often the tests sample a MAV's state.
const POLL: Duration = Duration::from_millis(10);

/// Upper bound on any single test scenario.
const DEADLINE: Duration = Duration::from_secs(5);

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// A MAV bound to electrodes 1 (left) and 0 (right).
fn mav_with_pair(fly: Duration, charge: Duration) -> (Mav, Arc<Electrode>, Arc<Electrode>) {
    let low = Arc::new(Electrode::new(0));
    let high = Arc::new(Electrode::new(1));
    let mav = Mav::new("MAV 1", Arc::clone(&high), Arc::clone(&low), fly, charge).unwrap();
    (mav, low, high)
}

/// Polls until `done` holds or the deadline passes.
fn wait_until(mut done: impl FnMut() -> bool) {
    let start = Instant::now();
    while !done() {
        assert!(start.elapsed() < DEADLINE, "condition not reached in time");
        thread::sleep(ms(1));
    }
}

/// Test the full observed sequence of two cycles, with the stop requested
/// during the second flight.
#[test]
fn two_cycles_then_stop() {
    let fly = ms(50);
    let charge = ms(150);
    let (mut mav, low, high) = mav_with_pair(fly, charge);

    // The harness owns both electrodes until it decides to hand them over.
    assert!(low.acquire(false));
    assert!(high.acquire(false));

    let start = Instant::now();
    let supplier = {
        let (low, high) = (Arc::clone(&low), Arc::clone(&high));
        thread::spawn(move || {
            for round in 0..2 {
                thread::sleep(charge * 2);
                low.release().unwrap();
                thread::sleep(charge * 2);
                high.release().unwrap();

                // The MAV keeps the lower electrode until it disconnects.
                wait_until(|| !low.is_held() && !high.is_held());
                if round == 0 {
                    assert!(low.acquire(true));
                    assert!(high.acquire(true));
                }
            }
        })
    };

    mav.start().unwrap();

    let mut seen: Vec<MavState> = Vec::new();
    let mut first_charging = None;
    let mut stop_requested = false;
    loop {
        assert!(start.elapsed() < DEADLINE, "sequence so far: {seen:?}");
        let state = mav.state();
        if let Some(state) = state {
            if seen.last() != Some(&state) {
                seen.push(state);
                if state == MavState::Charging && first_charging.is_none() {
                    first_charging = Some(start.elapsed());
                }
                if state == MavState::Stopped {
                    // Stopped only ever follows the second completed charge.
                    assert_eq!(mav.charges(), 2);
                    break;
                }
            }
            if state == MavState::Flying && mav.charges() == 1 && !stop_requested {
                mav.stop();
                stop_requested = true;
            }
        }
        thread::sleep(POLL);
    }

    supplier.join().expect("Supplier thread panicked");
    mav.join().unwrap();

    assert_eq!(
        seen,
        [
            MavState::Flying,
            MavState::Waiting,
            MavState::Charging,
            MavState::Flying,
            MavState::Waiting,
            MavState::Charging,
            MavState::Stopped,
        ]
    );
    // Charging cannot begin before the harness supplied the second electrode.
    assert!(first_charging.unwrap() >= charge * 4);
    assert!(!low.is_held() && !high.is_held());
}

/// Test that a stop requested mid-charge lets the charge finish first.
#[test]
fn stop_while_charging_finishes_the_charge() {
    let charge = ms(200);
    let (mut mav, low, high) = mav_with_pair(ms(20), charge);
    mav.start().unwrap();

    wait_until(|| mav.state() == Some(MavState::Charging));
    let requested = Instant::now();
    mav.stop();

    wait_until(|| mav.state() != Some(MavState::Charging));
    assert_eq!(mav.state(), Some(MavState::Stopped));
    // Charging began at most one poll before the request.
    assert!(requested.elapsed() >= charge - ms(20));

    mav.join().unwrap();
    assert_eq!(mav.charges(), 1);
    assert!(!low.is_held() && !high.is_held());
}

/// Test that a stop requested while waiting still waits, charges, then stops.
#[test]
fn stop_while_waiting_still_charges() {
    let (mut mav, low, high) = mav_with_pair(ms(10), ms(30));
    assert!(low.acquire(false));
    mav.start().unwrap();

    wait_until(|| mav.state() == Some(MavState::Waiting));
    mav.stop();

    thread::sleep(ms(100));
    assert_eq!(mav.state(), Some(MavState::Waiting));
    assert!(!high.is_held(), "must not take the higher electrode first");

    low.release().unwrap();
    mav.join().unwrap();
    assert_eq!(mav.state(), Some(MavState::Stopped));
    assert_eq!(mav.charges(), 1);
}

/// Test that new timings apply from the next phase, not retroactively.
#[test]
fn timing_changes_apply_to_the_next_phase() {
    let (mut mav, _low, _high) = mav_with_pair(ms(300), ms(5));
    mav.start().unwrap();

    wait_until(|| mav.state() == Some(MavState::Flying));
    mav.set_fly_time(ms(5)).unwrap();

    // Still on the original, longer first flight.
    thread::sleep(ms(100));
    assert_eq!(mav.state(), Some(MavState::Flying));
    assert_eq!(mav.charges(), 0);

    // Later flights use the shorter time.
    wait_until(|| mav.charges() >= 3);
    mav.stop();
    mav.join().unwrap();
}

/// Test that an electrode freed behind the MAV's back surfaces as an error on
/// join and the other electrode is not left stranded.
#[test]
fn bad_release_during_charge_is_reported() {
    let (mut mav, low, high) = mav_with_pair(ms(5), ms(150));
    mav.start().unwrap();

    wait_until(|| mav.state() == Some(MavState::Charging));
    high.release().unwrap();
    mav.stop();

    let err = mav.join().unwrap_err();
    assert!(matches!(
        err,
        MavError::Electrode(ElectrodeError::NotHeld { id: 1 })
    ));
    assert!(!low.is_held());
    assert_ne!(mav.state(), Some(MavState::Stopped));
}

/// Test the ring wiring of a four-MAV station.
#[test]
fn four_mav_ring_wiring() {
    let station = Station::new(StationConfig::new(4)).unwrap();

    let mav = station.mav(2).unwrap();
    assert_eq!(mav.left().id(), 2);
    assert_eq!(mav.right().id(), 1);

    let sharing: Vec<&str> = station
        .mavs()
        .iter()
        .filter(|m| m.left().id() == 2 || m.right().id() == 2)
        .map(Mav::name)
        .collect();
    assert_eq!(sharing, ["MAV 2", "MAV 3"]);

    // Every electrode is shared by exactly two MAVs.
    for electrode in station.electrodes() {
        let users = station
            .mavs()
            .iter()
            .filter(|m| Arc::ptr_eq(m.left(), electrode) || Arc::ptr_eq(m.right(), electrode))
            .count();
        assert_eq!(users, 2);
    }
}
