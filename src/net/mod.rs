//! 网络世界
//!
//! 节点、接口、链路统一放在索引式 arena 里（`Network`），
//! 比特在链路上的飞行、回环投递、超时都以调度器事件表达。
//! `NetWorld` 把 `Network` 接进调度器的 `World` 接口。

mod deliver;
mod id;
mod iface;
mod link;
mod net_world;
mod network;
mod trace;

pub use deliver::{DeliverBits, DeliverPacket, DhcpTimeout, PingTimeout};
pub use id::{IfaceId, LinkId, NodeId};
pub use iface::{ArpState, AutonegRx, Iface, L3, PortKind, ReassemblyBuf, VlanConfig, VlanMode};
pub use link::Link;
pub use net_world::NetWorld;
pub use network::{Network, PingState, MTU_PAYLOAD_BYTES, SWEEP_PERIOD_SECS};
pub(crate) use network::LOOPBACK_DELAY_SECS;
pub use trace::{Stats, Trace, TraceEvent};
