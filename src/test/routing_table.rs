use crate::addr::IPAddress;
use crate::error::SimError;
use crate::proto::RoutingTable;

fn ip(s: &str) -> IPAddress {
    IPAddress::parse(s).expect("valid address")
}

fn mask(s: &str) -> IPAddress {
    IPAddress::parse_mask(s).expect("valid mask")
}

#[test]
fn duplicate_routes_are_rejected() {
    let mut table = RoutingTable::default();
    table
        .add(ip("10.0.0.0"), mask("255.255.255.0"), ip("192.168.0.1"))
        .expect("first route");
    assert_eq!(
        table.add(ip("10.0.0.0"), mask("255.255.255.0"), ip("192.168.0.2")),
        Err(SimError::RouteAlreadyExists)
    );
    // same network under a different mask is a distinct entry
    table
        .add(ip("10.0.0.0"), mask("255.255.0.0"), ip("192.168.0.2"))
        .expect("wider route");
    assert_eq!(table.len(), 2);
}

#[test]
fn removing_an_absent_route_fails() {
    let mut table = RoutingTable::default();
    assert_eq!(
        table.remove(&ip("10.0.0.0"), &mask("255.255.255.0")),
        Err(SimError::RouteNotFound)
    );
    table
        .add(ip("10.0.0.0"), mask("255.255.255.0"), ip("192.168.0.1"))
        .expect("route");
    table
        .remove(&ip("10.0.0.0"), &mask("255.255.255.0"))
        .expect("remove existing");
    assert!(table.is_empty());
}

#[test]
fn lookup_prefers_the_longest_prefix() {
    let mut table = RoutingTable::default();
    table
        .add(ip("0.0.0.0"), mask("0.0.0.0"), ip("192.168.0.254"))
        .expect("default route");
    table
        .add(ip("10.0.0.0"), mask("255.0.0.0"), ip("192.168.0.1"))
        .expect("/8");
    table
        .add(ip("10.1.0.0"), mask("255.255.0.0"), ip("192.168.0.2"))
        .expect("/16");

    assert_eq!(
        table.lookup(&ip("10.1.2.3")).expect("route").gateway,
        ip("192.168.0.2")
    );
    assert_eq!(
        table.lookup(&ip("10.9.2.3")).expect("route").gateway,
        ip("192.168.0.1")
    );
    assert_eq!(
        table.lookup(&ip("8.8.8.8")).expect("default").gateway,
        ip("192.168.0.254")
    );
}

#[test]
fn equal_prefix_length_keeps_the_first_registration() {
    let mut table = RoutingTable::default();
    table
        .add(ip("10.1.0.0"), mask("255.255.0.0"), ip("192.168.0.1"))
        .expect("first");
    table
        .add(ip("10.0.0.0"), mask("255.0.0.0"), ip("192.168.0.9"))
        .expect("wider, registered later");
    // 10.1.x matches both; the /16 wins on prefix length, not insertion order
    assert_eq!(
        table.lookup(&ip("10.1.5.5")).expect("route").gateway,
        ip("192.168.0.1")
    );

    // two zero-length prefixes both match everything; the earlier one wins
    let mut tied = RoutingTable::default();
    tied.add(ip("0.0.0.0"), mask("0.0.0.0"), ip("192.168.0.1"))
        .expect("first default");
    tied.add(ip("128.0.0.0"), mask("0.0.0.0"), ip("192.168.0.2"))
        .expect("second catch-all");
    assert_eq!(
        tied.lookup(&ip("1.2.3.4")).expect("route").gateway,
        ip("192.168.0.1")
    );
}

#[test]
fn lookup_misses_return_none() {
    let mut table = RoutingTable::default();
    table
        .add(ip("10.0.0.0"), mask("255.0.0.0"), ip("192.168.0.1"))
        .expect("route");
    assert!(table.lookup(&ip("11.0.0.1")).is_none());
}
