use std::str::FromStr;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::addr::{IPAddress, MacAddress};
use crate::error::SimError;

#[test]
fn mac_parses_and_displays_colon_hex() {
    let mac = MacAddress::from_str("02:0a:FF:00:01:2c").expect("valid mac");
    assert_eq!(mac.octets(), [0x02, 0x0A, 0xFF, 0x00, 0x01, 0x2C]);
    assert_eq!(mac.to_string(), "02:0A:FF:00:01:2C");
}

#[test]
fn mac_rejects_malformed_text() {
    // "+a" would survive a bare from_str_radix, so it gets its own entry
    for bad in ["02:0a:ff:00:01", "02:0a:ff:00:01:2c:33", "2:a:f:0:1:c", "02-0a-ff-00-01-2c", "zz:00:00:00:00:00", "02:+a:00:00:00:01"] {
        assert!(
            matches!(MacAddress::from_str(bad), Err(SimError::InvalidAddressFormat(_))),
            "{bad} should be rejected"
        );
    }
}

#[test]
fn mac_broadcast_matches_only_itself() {
    assert!(MacAddress::BROADCAST.is_broadcast());
    assert!(!MacAddress::new([0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE]).is_broadcast());
}

#[test]
fn generated_macs_are_unicast_and_locally_administered() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..64 {
        let mac = MacAddress::generate(&mut rng);
        let first = mac.octets()[0];
        assert_eq!(first & 0x01, 0, "multicast bit must be clear");
        assert_eq!(first & 0x02, 0x02, "local bit must be set");
    }
}

#[test]
fn ip_parses_dotted_decimal() {
    let a = IPAddress::parse("192.168.1.200").expect("valid address");
    assert_eq!(a.octets(), [192, 168, 1, 200]);
    assert_eq!(a.to_string(), "192.168.1.200");
    assert!(!a.is_mask());
}

#[test]
fn ip_rejects_malformed_text() {
    for bad in ["1.2.3", "1.2.3.4.5", "1.2.3.256", "1.2.3.", "01.2.3.4", "1.2.3.4a", " 1.2.3.4"] {
        assert!(
            matches!(IPAddress::parse(bad), Err(SimError::InvalidAddressFormat(_))),
            "{bad} should be rejected"
        );
    }
    // "0" is fine, "00" is not
    assert!(IPAddress::parse("0.0.0.0").is_ok());
    assert!(IPAddress::parse("0.0.0.00").is_err());
}

#[test]
fn masks_must_have_contiguous_leading_ones() {
    for good in ["255.255.255.0", "255.255.255.255", "0.0.0.0", "255.254.0.0"] {
        assert!(IPAddress::parse_mask(good).is_ok(), "{good} is a valid mask");
    }
    for bad in ["255.0.255.0", "0.255.0.0", "255.255.255.1"] {
        assert!(
            matches!(IPAddress::parse_mask(bad), Err(SimError::InvalidAddressFormat(_))),
            "{bad} is not a valid mask"
        );
    }
    assert!(IPAddress::parse_mask("255.255.255.0").expect("mask").is_mask());
}

#[test]
fn default_mask_is_derived_from_address_class() {
    let class_a = IPAddress::parse("10.1.2.3").expect("addr");
    let class_b = IPAddress::parse("172.16.5.5").expect("addr");
    let class_c = IPAddress::parse("192.168.0.9").expect("addr");
    assert_eq!(class_a.generate_mask().octets(), [255, 0, 0, 0]);
    assert_eq!(class_b.generate_mask().octets(), [255, 255, 0, 0]);
    assert_eq!(class_c.generate_mask().octets(), [255, 255, 255, 0]);
}

#[test]
fn add_and_subtract_carry_across_octets() {
    let a = IPAddress::parse("10.0.0.255").expect("addr");
    assert_eq!(a.add(1).octets(), [10, 0, 1, 0]);
    assert_eq!(a.add(1).subtract(1), a);
    assert_eq!(a.add(257).octets(), [10, 0, 2, 0]);
}

#[test]
fn network_and_broadcast_addresses() {
    let mask = IPAddress::parse_mask("255.255.255.0").expect("mask");
    let a = IPAddress::parse("192.168.3.77").expect("addr");
    assert_eq!(a.network_ip(&mask).octets(), [192, 168, 3, 0]);
    assert_eq!(a.broadcast_ip(&mask).octets(), [192, 168, 3, 255]);
    // both are idempotent
    assert_eq!(a.network_ip(&mask).network_ip(&mask), a.network_ip(&mask));
    assert_eq!(
        a.broadcast_ip(&mask).broadcast_ip(&mask),
        a.broadcast_ip(&mask)
    );
}

#[test]
fn same_network_membership_and_prefix_length() {
    let mask = IPAddress::parse_mask("255.255.255.0").expect("mask");
    let a = IPAddress::parse("192.168.3.77").expect("addr");
    let b = IPAddress::parse("192.168.3.1").expect("addr");
    let c = IPAddress::parse("192.168.4.1").expect("addr");
    assert!(a.in_same_network(&mask, &b));
    assert!(!a.in_same_network(&mask, &c));
    assert_eq!(mask.cidr(), 24);
    assert_eq!(IPAddress::parse_mask("255.255.255.255").expect("mask").cidr(), 32);
    assert_eq!(IPAddress::parse_mask("0.0.0.0").expect("mask").cidr(), 0);
}

#[test]
fn well_known_addresses() {
    assert!(IPAddress::BROADCAST.is_broadcast());
    assert!(IPAddress::UNSPECIFIED.is_unspecified());
    assert!(!IPAddress::parse("255.255.255.254").expect("addr").is_broadcast());
}
