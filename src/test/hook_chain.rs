use crate::hook::{dispatch, IfaceEvent, IfaceEventBus, Verdict};
use crate::net::{IfaceId, NodeId};
use std::sync::{Arc, Mutex};

#[test]
fn all_continue_runs_every_listener_and_allows_default() {
    let mut called = Vec::new();
    let mut listeners = [1, 2, 3];
    let suppressed = dispatch(&mut listeners, false, |l| {
        called.push(*l);
        Verdict::Continue
    });
    assert!(!suppressed);
    assert_eq!(called, vec![1, 2, 3]);
}

#[test]
fn handled_suppresses_default_and_stops_notification() {
    let mut called = Vec::new();
    let mut listeners = [1, 2, 3];
    let suppressed = dispatch(&mut listeners, false, |l| {
        called.push(*l);
        if *l == 2 {
            Verdict::Handled
        } else {
            Verdict::Continue
        }
    });
    assert!(suppressed);
    assert_eq!(called, vec![1, 2]);
}

#[test]
fn handled_keeps_notifying_when_the_flag_says_so() {
    let mut called = Vec::new();
    let mut listeners = [1, 2, 3];
    let suppressed = dispatch(&mut listeners, true, |l| {
        called.push(*l);
        if *l == 2 {
            Verdict::Handled
        } else {
            Verdict::Continue
        }
    });
    // the rest still hear about the frame, the default action stays suppressed
    assert!(suppressed);
    assert_eq!(called, vec![1, 2, 3]);
}

#[test]
fn stop_short_circuits_regardless_of_the_flag() {
    let mut called = Vec::new();
    let mut listeners = [1, 2, 3];
    let suppressed = dispatch(&mut listeners, true, |l| {
        called.push(*l);
        if *l == 1 {
            Verdict::Stop
        } else {
            Verdict::Continue
        }
    });
    assert!(suppressed);
    assert_eq!(called, vec![1]);
}

#[test]
fn event_bus_notifies_subscribers_in_registration_order() {
    let log: Arc<Mutex<Vec<(u32, IfaceEvent)>>> = Arc::new(Mutex::new(Vec::new()));
    let mut bus = IfaceEventBus::default();
    for id in [1u32, 2] {
        let log = Arc::clone(&log);
        bus.subscribe(Box::new(move |_node, _iface, ev| {
            log.lock().expect("log lock").push((id, ev));
            Verdict::Continue
        }));
    }

    let suppressed = bus.emit(NodeId(0), IfaceId(0), IfaceEvent::Up);
    assert!(!suppressed);
    assert_eq!(
        *log.lock().expect("log lock"),
        vec![(1, IfaceEvent::Up), (2, IfaceEvent::Up)]
    );
}

#[test]
fn event_bus_respects_handled_subscribers() {
    let mut bus = IfaceEventBus::default();
    bus.subscribe(Box::new(|_, _, _| Verdict::Handled));
    bus.subscribe(Box::new(|_, _, _| panic!("must not be notified")));
    assert!(bus.emit(NodeId(0), IfaceId(0), IfaceEvent::Down));
}
