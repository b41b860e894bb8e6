use crate::net::{IfaceId, NetWorld, NodeId, PortKind, TraceEvent};
use crate::node::SwitchHost;
use crate::proto::{PortRole, PortState};
use crate::sim::{Scheduler, SimTime};

/// Two switches joined by two parallel links: a topology loop that only
/// spanning tree can break.
fn looped_pair() -> (Scheduler, NetWorld, NodeId, NodeId) {
    let mut sched = Scheduler::default();
    let mut world = NetWorld::default();
    let s1 = world.net.add_switch("s1");
    let s2 = world.net.add_switch("s2");
    for _ in 0..2 {
        let p1 = world.net.add_iface(s1, PortKind::GigabitEthernet);
        let p2 = world.net.add_iface(s2, PortKind::GigabitEthernet);
        world.net.connect(&mut sched, p1, p2, 10.0).expect("link");
    }
    world.net.enable_stp(&mut sched, s1);
    world.net.enable_stp(&mut sched, s2);
    (sched, world, s1, s2)
}

/// Three switches in a full triangle plus a host hanging off the third one.
fn triangle_with_leaf() -> (Scheduler, NetWorld, [NodeId; 3], IfaceId) {
    let mut sched = Scheduler::default();
    let mut world = NetWorld::default();
    let switches = ["t1", "t2", "t3"].map(|n| world.net.add_switch(n));
    for (a, b) in [(0, 1), (1, 2), (2, 0)] {
        let pa = world.net.add_iface(switches[a], PortKind::GigabitEthernet);
        let pb = world.net.add_iface(switches[b], PortKind::GigabitEthernet);
        world.net.connect(&mut sched, pa, pb, 10.0).expect("link");
    }
    let leaf = world.net.add_computer("leaf");
    let uplink = world.net.add_iface(switches[2], PortKind::GigabitEthernet);
    let leaf_port = world.net.add_iface(leaf, PortKind::GigabitEthernet);
    world
        .net
        .connect(&mut sched, uplink, leaf_port, 10.0)
        .expect("link");
    for s in switches {
        world.net.enable_stp(&mut sched, s);
    }
    (sched, world, switches, uplink)
}

fn switch<'a>(world: &'a NetWorld, node: NodeId) -> &'a SwitchHost {
    world
        .net
        .node(node)
        .expect("node present")
        .as_any()
        .downcast_ref::<SwitchHost>()
        .expect("switch node")
}

#[test]
fn exactly_one_bridge_wins_the_root_election() {
    let (mut sched, mut world, s1, s2) = looped_pair();
    sched.run_until(SimTime::from_secs(10), &mut world);

    let r1 = world.net.is_stp_root(s1).expect("stp enabled");
    let r2 = world.net.is_stp_root(s2).expect("stp enabled");
    assert_ne!(r1, r2, "the loop must elect a single root");
    assert!(
        world.net.trace.count(|e| matches!(e, TraceEvent::StpRoleChange { .. })) >= 1
    );
}

#[test]
fn the_non_root_bridge_blocks_its_redundant_uplink() {
    let (mut sched, mut world, s1, s2) = looped_pair();
    sched.run_until(SimTime::from_secs(60), &mut world);

    let non_root = if world.net.is_stp_root(s1).expect("stp") { s2 } else { s1 };
    let sw = switch(&world, non_root);
    let stp = sw.stp().expect("stp enabled");

    let ports: Vec<_> = world
        .net
        .node(non_root)
        .expect("node present")
        .ifaces()
        .ids()
        .collect();
    let roles: Vec<PortRole> = ports
        .iter()
        .map(|&p| stp.port_role(p).expect("enrolled"))
        .collect();
    assert_eq!(
        roles.iter().filter(|r| **r == PortRole::Root).count(),
        1,
        "one path to the root"
    );
    assert_eq!(
        roles.iter().filter(|r| **r == PortRole::Blocked).count(),
        1,
        "the redundant path is cut"
    );

    // state follows role: the blocked port stays down in Blocking, the root
    // port walked Listening/Learning up to Forwarding long ago
    for (&port, &role) in ports.iter().zip(&roles) {
        match role {
            PortRole::Blocked => assert_eq!(stp.port_state(port), PortState::Blocking),
            _ => assert_eq!(stp.port_state(port), PortState::Forwarding),
        }
    }
}

#[test]
fn the_root_bridge_keeps_all_ports_designated_and_forwarding() {
    let (mut sched, mut world, s1, s2) = looped_pair();
    sched.run_until(SimTime::from_secs(60), &mut world);

    let root = if world.net.is_stp_root(s1).expect("stp") { s1 } else { s2 };
    let sw = switch(&world, root);
    let stp = sw.stp().expect("stp enabled");
    for port in world.net.node(root).expect("node present").ifaces().ids() {
        assert_eq!(stp.port_role(port), Some(PortRole::Designated));
        assert_eq!(stp.port_state(port), PortState::Forwarding);
    }
}

#[test]
fn a_triangle_with_a_leaf_elects_one_root_and_cuts_one_link() {
    let (mut sched, mut world, switches, uplink) = triangle_with_leaf();
    sched.run_until(SimTime::from_secs(60), &mut world);

    let roots = switches
        .iter()
        .filter(|&&s| world.net.is_stp_root(s).expect("stp on"))
        .count();
    assert_eq!(roots, 1, "exactly one root bridge");

    // one loop, one cut: a single blocked port across the whole triangle
    let mut blocked = 0;
    for &s in &switches {
        let sw = switch(&world, s);
        let stp = sw.stp().expect("stp enabled");
        for port in world.net.node(s).expect("node present").ifaces().ids() {
            if stp.port_role(port) == Some(PortRole::Blocked) {
                blocked += 1;
                assert_eq!(stp.port_state(port), PortState::Blocking);
            }
        }
    }
    assert_eq!(blocked, 1);

    // the leaf-facing port is not part of any loop and carries traffic
    let stp = switch(&world, switches[2]).stp().expect("stp enabled");
    assert_eq!(stp.port_role(uplink), Some(PortRole::Designated));
    assert_eq!(stp.port_state(uplink), PortState::Forwarding);
}

#[test]
fn the_survivor_reclaims_rootship_when_the_root_goes_silent() {
    let (mut sched, mut world, s1, s2) = looped_pair();
    sched.run_until(SimTime::from_secs(60), &mut world);
    let (root, non_root) = if world.net.is_stp_root(s1).expect("stp") {
        (s1, s2)
    } else {
        (s2, s1)
    };
    assert!(!world.net.is_stp_root(non_root).expect("stp"));

    // the root falls silent: both of its ports go down
    let ports: Vec<IfaceId> = world
        .net
        .node(root)
        .expect("node present")
        .ifaces()
        .ids()
        .collect();
    for p in ports {
        world.net.set_down(p);
    }
    sched.run_until(SimTime::from_secs(120), &mut world);

    // stale peer info ages out and the survivor elects itself
    assert!(world.net.is_stp_root(non_root).expect("stp"));
    let stp = switch(&world, non_root).stp().expect("stp enabled");
    for port in world.net.node(non_root).expect("node present").ifaces().ids() {
        assert_eq!(stp.port_role(port), Some(PortRole::Designated));
    }
}

#[test]
fn locally_originated_frames_skip_blocked_ports() {
    let (mut sched, mut world, s1, s2) = looped_pair();
    sched.run_until(SimTime::from_secs(60), &mut world);
    let non_root = if world.net.is_stp_root(s1).expect("stp") { s2 } else { s1 };

    let ports: Vec<IfaceId> = world
        .net
        .node(non_root)
        .expect("node present")
        .ifaces()
        .ids()
        .collect();
    let stp = switch(&world, non_root).stp().expect("stp enabled");
    let blocked = *ports
        .iter()
        .find(|&&p| stp.port_role(p) == Some(PortRole::Blocked))
        .expect("one blocked port");
    let forwarding = *ports
        .iter()
        .find(|&&p| stp.port_role(p) == Some(PortRole::Root))
        .expect("one root port");

    let sent_at = |world: &NetWorld, p: IfaceId| {
        world
            .net
            .trace
            .count(|e| matches!(e, TraceEvent::BitsSent { iface, .. } if *iface == p))
    };
    let blocked_before = sent_at(&world, blocked);
    let forwarding_before = sent_at(&world, forwarding);
    world
        .net
        .send_frame(&mut sched, non_root, "hello floor")
        .expect("send frame");
    // bits leave synchronously: the cut port stays quiet
    assert_eq!(sent_at(&world, blocked), blocked_before);
    assert_eq!(sent_at(&world, forwarding), forwarding_before + 1);
}

#[test]
fn disabling_stp_releases_the_ports() {
    let (mut sched, mut world, s1, _s2) = looped_pair();
    sched.run_until(SimTime::from_secs(10), &mut world);

    world.net.disable_stp(&mut sched, s1);
    assert_eq!(world.net.is_stp_root(s1), None);
    // without the service every port reads as plain Forwarding again
    let sw = switch(&world, s1);
    assert!(sw.stp().is_none());
}
