//! 协议模块
//!
//! 各层协议状态机：自协商、ARP、IPv4 分片重组、ICMP、生成树、DHCP、
//! 路由表。它们经监听器链挂在接口/节点上，在默认转发前拦截报文。

pub mod arp;
pub mod autoneg;
pub mod dhcp;
pub mod frag;
pub mod icmp;
pub mod route;
pub mod stp;

pub use dhcp::{DhcpPool, DhcpServer};
pub use route::{Route, RoutingTable};
pub use stp::{PortRole, PortState, StpService};
