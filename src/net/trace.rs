//! 观测面
//!
//! 每次 bits/帧/报文的收发、协议里程碑（ARP、自协商、生成树、DHCP）
//! 都记录到事件流上，供 UI 与测试订阅检视。另有简单的计数统计。

use super::id::{IfaceId, NodeId};
use crate::addr::{IPAddress, MacAddress};
use crate::sim::SimTime;

/// 观测事件。
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    BitsSent {
        iface: IfaceId,
        bytes: u32,
    },
    BitsRecv {
        iface: IfaceId,
        bytes: u32,
    },
    FrameRecv {
        iface: IfaceId,
        src: Option<MacAddress>,
        dst: Option<MacAddress>,
        vlan: u16,
    },
    PacketRecv {
        node: NodeId,
        src: IPAddress,
        dst: IPAddress,
        ident: u16,
        fragment: bool,
    },
    /// 文本送达应用层
    TextDelivered {
        node: NodeId,
        from: IPAddress,
        text: String,
    },
    ArpRequestSent {
        iface: IfaceId,
        target: IPAddress,
    },
    ArpRequestRecv {
        iface: IfaceId,
        target: IPAddress,
    },
    ArpReplySent {
        iface: IfaceId,
        target: IPAddress,
    },
    ArpReplyRecv {
        iface: IfaceId,
        resolved: IPAddress,
    },
    AutonegResolved {
        iface: IfaceId,
        speed: u64,
        duplex: bool,
    },
    AutonegFailed {
        iface: IfaceId,
    },
    StpRoleChange {
        node: NodeId,
        iface: IfaceId,
        role: &'static str,
    },
    DhcpOffered {
        node: NodeId,
        addr: IPAddress,
    },
    DhcpAcked {
        node: NodeId,
        addr: IPAddress,
    },
    /// 无匹配地址池，静默丢弃（不发 Nak，保留原始行为）
    DhcpIgnored {
        node: NodeId,
    },
    PingCompleted {
        node: NodeId,
        ident: u16,
        rtt_ms: Option<f64>,
    },
}

/// 事件流记录器。
#[derive(Debug, Default)]
pub struct Trace {
    pub events: Vec<(SimTime, TraceEvent)>,
}

impl Trace {
    pub fn record(&mut self, at: SimTime, ev: TraceEvent) {
        self.events.push((at, ev));
    }

    /// 满足谓词的事件计数（测试用）。
    pub fn count(&self, mut pred: impl FnMut(&TraceEvent) -> bool) -> usize {
        self.events.iter().filter(|(_, e)| pred(e)).count()
    }
}

/// 网络统计信息。
#[derive(Debug, Default)]
pub struct Stats {
    pub delivered_frames: u64,
    pub delivered_packets: u64,
    pub delivered_bytes: u64,
}
