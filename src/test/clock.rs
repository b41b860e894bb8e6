use crate::sim::{Clock, SimTime, Speed};

#[test]
fn clock_delta_tracks_real_time_by_default() {
    let clock = Clock::default();
    assert_eq!(clock.speed(), Speed::RealTime);
    assert_eq!(clock.delta_ms(SimTime::from_secs(1)), 1_000.0);
}

#[test]
fn clock_delta_is_continuous_across_speed_changes() {
    let mut clock = Clock::default();
    // 1s of real time, then 1s at 10x, then frozen
    clock.set_speed(SimTime::from_secs(1), Speed::Faster);
    assert_eq!(clock.delta_ms(SimTime::from_secs(1)), 1_000.0);
    assert_eq!(clock.delta_ms(SimTime::from_secs(2)), 11_000.0);
    clock.set_speed(SimTime::from_secs(2), Speed::Paused);
    assert_eq!(clock.delta_ms(SimTime::from_secs(50)), 11_000.0);
    clock.set_speed(SimTime::from_secs(50), Speed::Slower);
    assert_eq!(clock.delta_ms(SimTime::from_secs(60)), 12_000.0);
}

#[test]
fn clock_delays_are_none_while_paused() {
    let mut clock = Clock::default();
    clock.set_speed(SimTime::ZERO, Speed::Paused);
    assert_eq!(clock.light_delay(1.0), None);
    assert_eq!(clock.transmission_delay(1.0), None);
}

#[test]
fn clock_scales_light_and_transmission_delays_independently() {
    let mut clock = Clock::default();
    clock.set_speed(SimTime::ZERO, Speed::Faster);

    // 1 model second of propagation shrinks to ~0.1s of timeline
    let light = clock.light_delay(1.0).expect("not paused");
    assert!(light >= SimTime::from_millis(100));
    assert!(light <= SimTime::from_millis(101));

    // transmission compresses much harder (1e5)
    let tx = clock.transmission_delay(1.0).expect("not paused");
    assert!(tx >= SimTime::from_micros(10));
    assert!(tx <= SimTime::from_micros(11));
}
