use crate::addr::IPAddress;
use crate::error::SimError;
use crate::net::{NetWorld, TraceEvent};
use crate::node::SwitchHost;
use crate::sim::{Scheduler, SimTime};
use crate::topo::{build_office_lan, OfficeLan, OfficeLanOpts};

fn office() -> (Scheduler, NetWorld, OfficeLan) {
    let mut sched = Scheduler::default();
    let mut world = NetWorld::default();
    let lan = build_office_lan(&mut world, &mut sched, &OfficeLanOpts::default())
        .expect("build office lan");
    (sched, world, lan)
}

#[test]
fn ping_across_the_switch_resolves_arp_first() {
    let (mut sched, mut world, lan) = office();
    let (c0, _) = lan.computers[0];

    let ident = world
        .net
        .ping(&mut sched, c0, lan.server_ip, 5.0)
        .expect("start ping");
    sched.run_until(SimTime::from_secs(30), &mut world);

    let rtt = world
        .net
        .ping_result(ident)
        .expect("resolved")
        .expect("no timeout");
    assert!(rtt >= 0.0);

    // the echo never moves before the broadcast request and unicast reply
    assert!(world.net.trace.count(|e| matches!(e, TraceEvent::ArpRequestSent { .. })) >= 1);
    assert!(world.net.trace.count(|e| matches!(e, TraceEvent::ArpReplyRecv { .. })) >= 1);

    // the switch learned both conversation endpoints on the way
    let sw = world
        .net
        .node(lan.switch)
        .expect("switch present")
        .as_any()
        .downcast_ref::<SwitchHost>()
        .expect("switch node");
    assert!(sw.mac_table().len() >= 2);
}

#[test]
fn long_text_is_fragmented_and_reassembled_end_to_end() {
    let (mut sched, mut world, lan) = office();
    let (c0, c0_ip) = lan.computers[0];
    let text: String = "x".repeat(4000);

    world
        .net
        .send_text(&mut sched, c0, lan.server_ip, text.clone())
        .expect("send text");
    sched.run_until(SimTime::from_secs(30), &mut world);

    let delivered: Vec<&TraceEvent> = world
        .net
        .trace
        .events
        .iter()
        .filter(|(_, e)| matches!(e, TraceEvent::TextDelivered { .. }))
        .map(|(_, e)| e)
        .collect();
    assert_eq!(delivered.len(), 1);
    let TraceEvent::TextDelivered { node, from, text: got } = delivered[0] else {
        unreachable!()
    };
    assert_eq!(*node, lan.server);
    assert_eq!(*from, c0_ip);
    assert_eq!(got.len(), 4000);
    assert_eq!(*got, text);
}

#[test]
fn broadcast_text_reaches_every_other_host() {
    let (mut sched, mut world, lan) = office();
    let (c0, _) = lan.computers[0];

    world
        .net
        .send_text(&mut sched, c0, IPAddress::BROADCAST, "wakeup")
        .expect("send broadcast");
    sched.run_until(SimTime::from_secs(10), &mut world);

    // server and the second computer both deliver; the sender does not
    assert_eq!(
        world.net.trace.count(|e| matches!(e, TraceEvent::TextDelivered { .. })),
        2
    );
}

#[test]
fn switch_originated_frames_flood_every_port() {
    let (mut sched, mut world, lan) = office();

    world
        .net
        .send_frame(&mut sched, lan.switch, "maintenance notice")
        .expect("send frame");
    sched.run_until(SimTime::from_secs(1), &mut world);

    // a switch has no source interface: each port sends with its own MAC
    // and every attached host hears the broadcast
    assert_eq!(
        world.net.trace.count(
            |e| matches!(e, TraceEvent::FrameRecv { dst: Some(d), .. } if d.is_broadcast())
        ),
        3
    );
}

#[test]
fn ping_to_own_address_loops_back() {
    let (mut sched, mut world, lan) = office();
    let (c0, c0_ip) = lan.computers[0];

    let ident = world.net.ping(&mut sched, c0, c0_ip, 5.0).expect("start ping");
    sched.run_until(SimTime::from_secs(10), &mut world);

    assert!(matches!(world.net.ping_result(ident), Some(Some(_))));
    // nothing had to touch the wire for a loopback echo
    assert_eq!(world.net.trace.count(|e| matches!(e, TraceEvent::ArpRequestSent { .. })), 0);
}

#[test]
fn unroutable_destination_fails_fast() {
    let (mut sched, mut world, lan) = office();
    let (c0, _) = lan.computers[0];
    let dst = IPAddress::parse("8.8.8.8").expect("addr");

    // no gateway configured, no connected subnet: routing fails synchronously
    assert_eq!(
        world.net.ping(&mut sched, c0, dst, 5.0),
        Err(SimError::NoRouteFound(dst))
    );
    assert_eq!(
        world.net.send_text(&mut sched, c0, dst, "lost"),
        Err(SimError::NoRouteFound(dst))
    );
}

#[test]
fn downed_interface_drops_out_of_routing() {
    let (mut sched, mut world, lan) = office();
    let (c0, _) = lan.computers[0];
    let port = world
        .net
        .node(c0)
        .expect("computer present")
        .ifaces()
        .ids()
        .next()
        .expect("one port");

    world.net.set_down(port);
    assert!(matches!(
        world.net.ping(&mut sched, c0, lan.server_ip, 5.0),
        Err(SimError::NoRouteFound(_))
    ));
}
