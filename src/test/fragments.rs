use crate::addr::IPAddress;
use crate::msg::{Ipv4Packet, Ipv4Payload, Payload};
use crate::net::{Network, PortKind};
use crate::proto::frag;

fn ip(s: &str) -> IPAddress {
    IPAddress::parse(s).expect("valid address")
}

fn net_with_l3_iface() -> (Network, crate::net::IfaceId) {
    let mut net = Network::with_seed(1);
    let host = net.add_computer("c0");
    let iface = net.add_iface(host, PortKind::FastEthernet);
    net.set_net_address(
        iface,
        ip("10.0.0.1"),
        IPAddress::parse_mask("255.255.255.0").expect("mask"),
    )
    .expect("address");
    (net, iface)
}

fn three_fragments() -> Vec<Ipv4Packet> {
    Ipv4Packet::builder()
        .src(ip("10.0.0.2"))
        .dst(ip("10.0.0.1"))
        .ident(7)
        .payload(Ipv4Payload::Text(Payload::from("z".repeat(250))))
        .fragment(100)
        .expect("fragments")
}

#[test]
fn non_fragments_pass_straight_through() {
    let (mut net, iface) = net_with_l3_iface();
    let pkt = Ipv4Packet::builder()
        .src(ip("10.0.0.2"))
        .dst(ip("10.0.0.1"))
        .payload(Ipv4Payload::Text(Payload::from("hi")))
        .build()
        .expect("packet");
    let out = frag::ingest(&mut net, iface, pkt.clone(), 0.0).expect("passthrough");
    assert_eq!(out, pkt);
}

#[test]
fn reassembly_completes_when_the_tail_arrives_last() {
    let (mut net, iface) = net_with_l3_iface();
    let frags = three_fragments();

    // middle, head, then tail
    assert!(frag::ingest(&mut net, iface, frags[1].clone(), 0.0).is_none());
    assert!(frag::ingest(&mut net, iface, frags[0].clone(), 0.0).is_none());
    let whole = frag::ingest(&mut net, iface, frags[2].clone(), 0.0).expect("reassembled");

    assert!(!whole.is_fragment());
    assert_eq!(whole.payload_len, 250);
    assert_eq!(whole.total_length, 250);
    assert_eq!(frag::text_of(&whole).expect("text").len(), 250);
    // the buffer is gone once the packet is delivered
    let l3 = net.iface_mut(iface).l3_mut();
    assert!(l3.reassembly.is_empty());
}

#[test]
fn duplicate_offsets_are_ignored() {
    let (mut net, iface) = net_with_l3_iface();
    let frags = three_fragments();

    assert!(frag::ingest(&mut net, iface, frags[1].clone(), 0.0).is_none());
    assert!(frag::ingest(&mut net, iface, frags[1].clone(), 0.0).is_none());
    let l3 = net.iface_mut(iface).l3_mut();
    let buf = l3
        .reassembly
        .get(&(ip("10.0.0.2"), 7))
        .expect("buffer exists");
    assert_eq!(buf.spans.len(), 1);
}

#[test]
fn sweep_discards_stale_incomplete_buffers() {
    let (mut net, iface) = net_with_l3_iface();
    let frags = three_fragments();

    assert!(frag::ingest(&mut net, iface, frags[0].clone(), 0.0).is_none());
    // still young: kept
    frag::sweep(&mut net, iface, 10_000.0);
    assert_eq!(net.iface_mut(iface).l3_mut().reassembly.len(), 1);
    // beyond the 30s ageing window: dropped
    frag::sweep(&mut net, iface, 31_000.0);
    assert!(net.iface_mut(iface).l3_mut().reassembly.is_empty());
}

#[test]
fn interleaved_sources_reassemble_independently() {
    let (mut net, iface) = net_with_l3_iface();
    let a = three_fragments();
    let b = Ipv4Packet::builder()
        .src(ip("10.0.0.3"))
        .dst(ip("10.0.0.1"))
        .ident(7)
        .payload(Ipv4Payload::Text(Payload::from("y".repeat(150))))
        .fragment(100)
        .expect("fragments");

    assert!(frag::ingest(&mut net, iface, a[0].clone(), 0.0).is_none());
    assert!(frag::ingest(&mut net, iface, b[0].clone(), 0.0).is_none());
    // same ident, different source: keys stay apart
    let whole_b = frag::ingest(&mut net, iface, b[1].clone(), 0.0).expect("b complete");
    assert_eq!(whole_b.src, ip("10.0.0.3"));
    assert_eq!(whole_b.total_length, 150);
    assert_eq!(net.iface_mut(iface).l3_mut().reassembly.len(), 1);
}
