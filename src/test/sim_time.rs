use crate::sim::SimTime;

#[test]
fn sim_time_unit_conversions() {
    assert_eq!(SimTime::from_micros(1), SimTime(1_000));
    assert_eq!(SimTime::from_millis(1), SimTime(1_000_000));
    assert_eq!(SimTime::from_secs(1), SimTime(1_000_000_000));
}

#[test]
fn sim_time_unit_conversions_saturate_on_overflow() {
    assert_eq!(SimTime::from_micros(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_millis(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_secs(u64::MAX), SimTime(u64::MAX));
}

#[test]
fn sim_time_from_secs_f64_rounds_up_to_nanos() {
    assert_eq!(SimTime::from_secs_f64(1.0), SimTime::from_secs(1));
    assert_eq!(SimTime::from_secs_f64(1.5e-9), SimTime(2));
    assert_eq!(SimTime::from_secs_f64(0.0), SimTime::ZERO);
    // negative delays clamp to zero instead of wrapping
    assert_eq!(SimTime::from_secs_f64(-1.0), SimTime::ZERO);
}

#[test]
fn sim_time_saturating_arithmetic() {
    assert_eq!(SimTime(5).saturating_sub(SimTime(10)), SimTime::ZERO);
    assert_eq!(
        SimTime(u64::MAX).saturating_add(SimTime(1)),
        SimTime(u64::MAX)
    );
}
