use crate::addr::IPAddress;
use crate::error::SimError;
use crate::net::{IfaceId, NetWorld, NodeId, PortKind, TraceEvent};
use crate::node::{EndHost, RouterHost};
use crate::proto::DhcpPool;
use crate::sim::{Scheduler, SimTime};
use crate::topo::build_routed_campus;

fn ip(s: &str) -> IPAddress {
    IPAddress::parse(s).expect("valid address")
}

fn mask24() -> IPAddress {
    IPAddress::parse_mask("255.255.255.0").expect("mask")
}

/// Router and client back to back, with one pool mounted on the router.
fn router_with_pool(
    router_addr: &str,
    pool: DhcpPool,
) -> (Scheduler, NetWorld, NodeId, IfaceId) {
    let mut sched = Scheduler::default();
    let mut world = NetWorld::default();
    let router = world.net.add_router("r0");
    let client = world.net.add_computer("c0");
    let rp = world.net.add_iface(router, PortKind::GigabitEthernet);
    let cp = world.net.add_iface(client, PortKind::GigabitEthernet);
    world.net.connect(&mut sched, rp, cp, 10.0).expect("link");
    world
        .net
        .set_net_address(rp, ip(router_addr), mask24())
        .expect("router address");
    world
        .net
        .node_mut(router)
        .and_then(|n| n.as_any_mut().downcast_mut::<RouterHost>())
        .expect("router node")
        .dhcp_mut()
        .add_pool(pool);
    world.net.start_sweeps(&mut sched);
    (sched, world, client, cp)
}

#[test]
fn pool_bounds_must_live_inside_the_gateway_network() {
    let err = DhcpPool::new(ip("10.0.2.1"), mask24(), ip("10.0.3.100"), ip("10.0.3.120"))
        .expect_err("range outside the subnet");
    assert_eq!(err, SimError::InvalidPool);
}

#[test]
fn campus_client_walks_the_full_lease_handshake() {
    let mut sched = Scheduler::default();
    let mut world = NetWorld::default();
    let campus = build_routed_campus(&mut world, &mut sched).expect("build campus");
    let (client, client_port) = campus.dhcp_client;

    let xid = world
        .net
        .dhcp_discover(&mut sched, client, client_port, 10.0)
        .expect("start discover");
    sched.run_until(SimTime::from_secs(10), &mut world);

    let leased = world
        .net
        .dhcp_result(xid)
        .expect("resolved")
        .expect("no timeout");
    assert_eq!(leased, ip("10.0.2.100"));

    // the address is installed on the interface, the gateway on the host
    let l3 = world.net.iface(client_port).l3.as_ref().expect("l3 present");
    assert!(l3.holds(&leased));
    let host = world
        .net
        .node(client)
        .expect("client present")
        .as_any()
        .downcast_ref::<EndHost>()
        .expect("end host");
    assert_eq!(host.gateway(), Some(ip("10.0.2.1")));

    assert!(world.net.trace.count(|e| matches!(e, TraceEvent::DhcpOffered { .. })) >= 1);
    assert!(world.net.trace.count(|e| matches!(e, TraceEvent::DhcpAcked { .. })) >= 1);
}

#[test]
fn a_fresh_lease_is_immediately_routable() {
    let mut sched = Scheduler::default();
    let mut world = NetWorld::default();
    let campus = build_routed_campus(&mut world, &mut sched).expect("build campus");
    let (client, client_port) = campus.dhcp_client;

    let xid = world
        .net
        .dhcp_discover(&mut sched, client, client_port, 10.0)
        .expect("start discover");
    sched.run_until(SimTime::from_secs(10), &mut world);
    assert!(matches!(world.net.dhcp_result(xid), Some(Some(_))));

    // cross-subnet ping through the gateway learned from the Ack
    let ident = world
        .net
        .ping(&mut sched, client, campus.left_host_ip, 5.0)
        .expect("start ping");
    sched.run_until(SimTime::from_secs(40), &mut world);
    assert!(matches!(world.net.ping_result(ident), Some(Some(_))));
}

#[test]
fn the_gateway_address_is_never_offered() {
    let pool = DhcpPool::new(ip("10.0.5.1"), mask24(), ip("10.0.5.1"), ip("10.0.5.5"))
        .expect("pool starting at the gateway");
    let (mut sched, mut world, client, cp) = router_with_pool("10.0.5.1", pool);

    let xid = world
        .net
        .dhcp_discover(&mut sched, client, cp, 5.0)
        .expect("start discover");
    sched.run_until(SimTime::from_secs(10), &mut world);

    let leased = world
        .net
        .dhcp_result(xid)
        .expect("resolved")
        .expect("no timeout");
    assert_eq!(leased, ip("10.0.5.2"));
}

#[test]
fn discover_is_silently_ignored_without_a_matching_pool() {
    // pool is internally consistent but serves a network the router is not on
    let pool = DhcpPool::new(ip("10.0.9.1"), mask24(), ip("10.0.9.100"), ip("10.0.9.110"))
        .expect("pool");
    let (mut sched, mut world, client, cp) = router_with_pool("10.0.3.1", pool);

    let xid = world
        .net
        .dhcp_discover(&mut sched, client, cp, 2.0)
        .expect("start discover");
    sched.run_until(SimTime::from_secs(10), &mut world);

    // no Nak on the wire, just a timeout on the client side
    assert_eq!(world.net.dhcp_result(xid), Some(None));
    assert!(world.net.trace.count(|e| matches!(e, TraceEvent::DhcpIgnored { .. })) >= 1);
    assert_eq!(
        world.net.trace.count(|e| matches!(e, TraceEvent::DhcpOffered { .. })),
        0
    );
}
