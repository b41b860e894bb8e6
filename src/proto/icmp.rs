//! ICMP 回显
//!
//! 回显请求自动应答；应答到达时结清按 identification 配对的
//! 在途 ping，与调度器超时赛跑（超时落空得到 None，不是错误）。

use crate::addr::IPAddress;
use crate::error::SimError;
use crate::msg::{IcmpKind, IcmpMessage, IpProto, Ipv4Packet, Ipv4Payload};
use crate::net::{Network, NodeId, TraceEvent};
use crate::sim::Scheduler;
use tracing::debug;

/// 构建回显请求报文。
pub fn echo_request(
    src: IPAddress,
    dst: IPAddress,
    ident: u16,
    pkt_ident: u16,
) -> Result<Ipv4Packet, SimError> {
    let icmp = IcmpMessage::builder()
        .kind(IcmpKind::EchoRequest)
        .ident(ident)
        .data("abcdefgh")
        .build()?;
    Ipv4Packet::builder()
        .src(src)
        .dst(dst)
        .ident(pkt_ident)
        .protocol(IpProto::Icmp)
        .payload(Ipv4Payload::Icmp(icmp))
        .build()
}

/// 由到达的回显请求构建应答报文（源/目的对调，ident 带回）。
pub fn echo_reply(req_pkt: &Ipv4Packet, req: &IcmpMessage, pkt_ident: u16) -> Ipv4Packet {
    let reply = IcmpMessage::reply_to(req);
    Ipv4Packet::builder()
        .src(req_pkt.dst)
        .dst(req_pkt.src)
        .ident(pkt_ident)
        .protocol(IpProto::Icmp)
        .payload(Ipv4Payload::Icmp(reply))
        .build()
        .expect("src/dst present")
}

/// 回显应答到达：结清对应的在途 ping。重复/迟到的应答被忽略。
pub fn on_echo_reply(net: &mut Network, sched: &mut Scheduler, node: NodeId, icmp: &IcmpMessage) {
    let now_ms = sched.delta_ms();
    let Some(ping) = net.ping_state_mut(icmp.ident) else {
        return;
    };
    if ping.result.is_some() {
        return;
    }
    let rtt = now_ms - ping.started_ms;
    ping.result = Some(Some(rtt));
    debug!(ident = icmp.ident, rtt_ms = rtt, "回显应答到达");
    net.trace.record(
        sched.now(),
        TraceEvent::PingCompleted {
            node,
            ident: icmp.ident,
            rtt_ms: Some(rtt),
        },
    );
}
