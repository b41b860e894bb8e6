//! 报文类型
//!
//! 分层报文模型：帧（以太网/802.1Q）承载 IPv4、ARP、自协商码字、BPDU；
//! IPv4 承载 ICMP、DHCP 或不透明文本。全部经构建器校验后不可变。

mod control;
mod dhcp;
mod frame;
mod icmp;
mod ipv4;
mod payload;

pub use control::{ArpOp, ArpPayload, Bpdu, CodeWord, GIG_FULL, GIG_HALF, TECH_100_FULL, TECH_100_HALF, TECH_10_FULL, TECH_10_HALF};
pub use dhcp::{DhcpMessage, DhcpMessageBuilder, DhcpOp, DHCP_BYTES};
pub use frame::{Frame, FrameBuilder, FramePayload, DOT1Q_HEADER_BYTES, ETHERNET_HEADER_BYTES};
pub use icmp::{IcmpKind, IcmpMessage, IcmpMessageBuilder, ICMP_HEADER_BYTES};
pub use ipv4::{IpProto, Ipv4Builder, Ipv4Packet, Ipv4Payload, IPV4_HEADER_BYTES};
pub use payload::Payload;
