//! 节点模型
//!
//! 四类设备：交换机（纯链路层）、路由器（转发 + DHCP 服务）、
//! 服务器与计算机（终端主机）。节点间不互相持有引用，统一放在
//! `Network` 的 arena 里，经 take/put 出入以避免可变借用环。
//! 协议拦截走节点自己的监听器链（封闭标签枚举 + `hook::dispatch`），
//! 全部放行时才落到默认的转发/本机投递逻辑。

mod host;
mod router;
mod switch;

pub use host::{ComputerHost, EndHost, ServerHost};
pub use router::RouterHost;
pub use switch::SwitchHost;

use std::any::Any;

use crate::addr::IPAddress;
use crate::msg::{Frame, IcmpKind, Ipv4Packet, Ipv4Payload};
use crate::net::{DeliverPacket, IfaceId, Network, NodeId, TraceEvent};
use crate::proto::{arp, frag, icmp};
use crate::sim::Scheduler;
use tracing::{debug, trace};

/// 设备类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Switch,
    Router,
    Server,
    Computer,
}

/// 按插入顺序保存的 名字 → 接口 映射。
///
/// 顺序有语义：路由决策、泛洪顺序都按接口添加顺序确定，
/// 方便测试断言。
#[derive(Debug, Default)]
pub struct IfaceMap {
    entries: Vec<(String, IfaceId)>,
}

impl IfaceMap {
    pub fn insert(&mut self, name: String, id: IfaceId) {
        self.entries.push((name, id));
    }

    pub fn get(&self, name: &str) -> Option<IfaceId> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, i)| *i)
    }

    pub fn ids(&self) -> impl Iterator<Item = IfaceId> + '_ {
        self.entries.iter().map(|(_, i)| *i)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, IfaceId)> {
        self.entries.iter().map(|(n, i)| (n.as_str(), *i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 仿真节点。
pub trait Node: Any {
    fn id(&self) -> NodeId;
    fn name(&self) -> &str;
    fn kind(&self) -> NodeKind;
    fn ifaces(&self) -> &IfaceMap;
    fn ifaces_mut(&mut self) -> &mut IfaceMap;

    /// 一个帧（已通过入方向 VLAN 判定）到达本节点的某接口。
    /// 调用时节点已从 arena 中取出，可自由可变借用 `net`。
    fn on_frame(
        &mut self,
        iface: IfaceId,
        frame: Frame,
        vlan: u16,
        sched: &mut Scheduler,
        net: &mut Network,
    );

    /// 选路：目的地址的 (出接口, 下一跳)。选不出来返回 None。
    fn resolve_route(&self, net: &Network, dst: &IPAddress) -> Option<(IfaceId, IPAddress)>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// 直连子网匹配：返回 (前缀长, 出接口)，取最长前缀。
pub(crate) fn connected_route(
    net: &Network,
    ifaces: &IfaceMap,
    dst: &IPAddress,
) -> Option<(u32, IfaceId)> {
    let mut best: Option<(u32, IfaceId)> = None;
    for id in ifaces.ids() {
        let ifc = net.iface(id);
        if !ifc.up {
            continue;
        }
        let Some(l3) = &ifc.l3 else { continue };
        for (addr, mask) in &l3.addrs {
            if addr.in_same_network(mask, dst) {
                let c = mask.cidr();
                if best.is_none_or(|(bc, _)| c > bc) {
                    best = Some((c, id));
                }
            }
        }
    }
    best
}

/// 本节点是否持有该地址（任一接口）。
pub(crate) fn holds_addr(net: &Network, ifaces: &IfaceMap, addr: &IPAddress) -> bool {
    ifaces
        .ids()
        .any(|id| net.iface(id).l3.as_ref().map(|l3| l3.holds(addr)).unwrap_or(false))
}

/// 到达本机的报文：分片重组、按上层协议分发。
///
/// 回显请求在这里自动应答；回显应答结清在途 ping；文本载荷
/// 记入观测事件流视作"送达应用层"。DHCP 报文由节点的监听器链
/// 先行拦截，走到这里的直接忽略。
pub(crate) fn deliver_local(
    this: &dyn Node,
    net: &mut Network,
    sched: &mut Scheduler,
    iface: IfaceId,
    pkt: Ipv4Packet,
) {
    let node = this.id();
    net.trace.record(
        sched.now(),
        TraceEvent::PacketRecv {
            node,
            src: pkt.src,
            dst: pkt.dst,
            ident: pkt.ident,
            fragment: pkt.is_fragment(),
        },
    );
    let now_ms = sched.delta_ms();
    let Some(whole) = frag::ingest(net, iface, pkt, now_ms) else {
        return;
    };
    net.stats.delivered_packets += 1;
    net.stats.delivered_bytes += whole.len_bytes() as u64;

    match &whole.payload {
        Ipv4Payload::Icmp(msg) => match msg.kind {
            IcmpKind::EchoRequest => {
                debug!(node = this.name(), from = %whole.src, "回显请求，自动应答");
                let reply = icmp::echo_reply(&whole, msg, net.alloc_ident());
                // 自己 ping 自己：应答走回环，不进 ARP
                if holds_addr(net, this.ifaces(), &whole.src) {
                    sched.once(
                        crate::net::LOOPBACK_DELAY_SECS,
                        DeliverPacket {
                            node,
                            iface,
                            pkt: reply,
                        },
                    );
                    return;
                }
                let Some((out, next_hop)) = this.resolve_route(net, &whole.src) else {
                    trace!(node = this.name(), dst = %whole.src, "应答无路可走，丢弃");
                    return;
                };
                let _ = arp::enqueue(net, sched, out, next_hop, reply);
            }
            IcmpKind::EchoReply => icmp::on_echo_reply(net, sched, node, msg),
        },
        Ipv4Payload::Text(payload) => {
            if let Some(text) = payload.text() {
                debug!(node = this.name(), from = %whole.src, text, "文本送达");
                net.trace.record(
                    sched.now(),
                    TraceEvent::TextDelivered {
                        node,
                        from: whole.src,
                        text: text.to_string(),
                    },
                );
            }
        }
        Ipv4Payload::Dhcp(_) | Ipv4Payload::Empty => {}
    }
}
