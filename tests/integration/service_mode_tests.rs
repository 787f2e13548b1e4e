//! Service mode: a long hold on the service button latches automatic
//! lock/unlock cycling.
//!
//! With [`test_config`] the threshold is 50 ms and one toggle period is
//! 45 ms (longest burst) + 20 ms = 65 ms.

use super::mock_hw::{Sim, test_config};

use doorlock::app::events::DoorEvent;
use doorlock::config::DoorConfig;
use doorlock::drivers::indicator::Indicator;
use doorlock::fsm::DoorState;

#[test]
fn long_hold_cycles_lock_without_presses() {
    let mut sim = Sim::new(test_config());
    sim.hold_service(60);
    assert!(sim.ctl.in_service_mode());
    assert_eq!(sim.sink.count(DoorEvent::ServiceModeEntered), 1);

    sim.run_ms(1_000);
    let entered = sim.sink.states_entered();
    let opens = entered.iter().filter(|s| **s == DoorState::Open).count();
    let closes = entered.iter().filter(|s| **s == DoorState::Closed).count();
    assert!(opens >= 5, "only {opens} unlocks");
    assert!(closes >= 5, "only {closes} locks");
    assert!(!sim.hw.overlap);
}

#[test]
fn toggles_follow_the_service_period() {
    let mut sim = Sim::new(test_config());
    // Latches at t=51; first toggle runs on the next poll.
    sim.hold_service(60);

    let changes: Vec<(u32, DoorState)> = sim
        .sink
        .events
        .iter()
        .filter_map(|(t, e)| match e {
            DoorEvent::StateChanged { to, .. } => Some((*t, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![(52, DoorState::Opening)]);

    assert_eq!(sim.run_until(DoorState::Open, 100), Some(97));
    assert_eq!(sim.run_until(DoorState::Closing, 100), Some(116));
    assert_eq!(sim.run_until(DoorState::Closed, 100), Some(146));
    assert_eq!(sim.run_until(DoorState::Opening, 100), Some(181));
}

#[test]
fn presses_are_ignored_in_service_mode() {
    let mut sim = Sim::new(test_config());
    sim.hold_service(60);
    sim.press(100);

    assert_eq!(
        sim.sink.states_entered(),
        vec![
            DoorState::Opening,
            DoorState::Open,
            DoorState::Closing,
            DoorState::Closed
        ]
    );
    assert_eq!(sim.sink.count(DoorEvent::HoldExtended), 0);
    assert_eq!(sim.sink.count(DoorEvent::OpenDeferred), 0);
    assert!(!sim.ctl.pending_open());
}

#[test]
fn open_has_no_hold_timer_in_service_mode() {
    let config = DoorConfig {
        service_interval_ms: 300,
        ..test_config()
    };
    let mut sim = Sim::new(config);
    sim.hold_service(60);

    // Open at t=97.  The 100 ms hold would close at t=197; the next toggle
    // is due at 51 + 345 = 396.
    sim.run_ms(240);
    assert_eq!(sim.ctl.state(), DoorState::Open);
    assert_eq!(sim.run_until(DoorState::Closing, 200), Some(396));
}

#[test]
fn bouncing_taps_do_not_latch() {
    let mut sim = Sim::new(test_config());
    for _ in 0..20 {
        sim.hold_service(30);
        sim.run_ms(40);
    }
    assert!(!sim.ctl.in_service_mode());
    assert_eq!(sim.sink.count(DoorEvent::ServiceModeEntered), 0);
}

#[test]
fn entering_service_while_open_drops_the_hold() {
    let mut sim = Sim::new(test_config());
    sim.press(1);
    assert_eq!(sim.run_until(DoorState::Open, 200), Some(46));

    // Latches at t=97; the toggle locks at t=98 instead of the hold at 146.
    sim.hold_service(60);
    assert!(sim.sink.events.contains(&(
        98,
        DoorEvent::StateChanged {
            from: DoorState::Open,
            to: DoorState::Closing
        }
    )));
    assert!(matches!(
        sim.hw.last_indicator(),
        Some(Indicator::Service { .. })
    ));
}

#[test]
fn service_indicator_mirrors_bolt() {
    let mut sim = Sim::new(test_config());
    sim.hold_service(60);
    sim.run_until(DoorState::Open, 100);
    assert_eq!(
        sim.hw.last_indicator(),
        Some(Indicator::Service { unlocked: true })
    );
    sim.run_until(DoorState::Closed, 100);
    assert_eq!(
        sim.hw.last_indicator(),
        Some(Indicator::Service { unlocked: false })
    );
}
