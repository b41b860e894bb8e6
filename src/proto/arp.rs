//! ARP 地址解析
//!
//! 网络地址到硬件地址的解析：命中缓存直接发送；解析在途则排队；
//! 否则广播请求并排队。持有被询问地址的一方单播应答；
//! 应答到达后刷缓存并放行全部排队报文。表项 5 分钟（模拟时间）老化。

use crate::addr::{IPAddress, MacAddress};
use crate::error::SimError;
use crate::hook::Verdict;
use crate::msg::{ArpOp, ArpPayload, Frame, FramePayload, Ipv4Packet};
use crate::net::{IfaceId, Network, TraceEvent};
use crate::sim::Scheduler;
use tracing::{debug, trace};

/// ARP 表项老化窗口（模拟秒）。
pub const ARP_AGE_SECS: f64 = 300.0;

/// 经 ARP 把报文发往下一跳。
pub fn enqueue(
    net: &mut Network,
    sched: &mut Scheduler,
    iface: IfaceId,
    next_hop: IPAddress,
    pkt: Ipv4Packet,
) -> Result<(), SimError> {
    let now_ms = sched.delta_ms();
    let ifc = net.iface_mut(iface);
    let src_mac = ifc.mac;
    let l3 = ifc.l3_mut();

    // 受限广播不经解析，直接打广播 MAC
    if next_hop.is_broadcast() {
        let frame = Frame::builder()
            .src(src_mac)
            .dst(MacAddress::BROADCAST)
            .payload(FramePayload::Ipv4(pkt))
            .build()?;
        return net.send_bits(sched, iface, frame);
    }

    if let Some((mac, last_seen)) = l3.arp.table.get_mut(&next_hop) {
        *last_seen = now_ms;
        let mac = *mac;
        trace!(%next_hop, %mac, "ARP 缓存命中");
        let frame = Frame::builder()
            .src(src_mac)
            .dst(mac)
            .payload(FramePayload::Ipv4(pkt))
            .build()?;
        return net.send_bits(sched, iface, frame);
    }

    if let Some(queue) = l3.arp.pending.get_mut(&next_hop) {
        trace!(%next_hop, queued = queue.len() + 1, "ARP 解析在途，排队");
        queue.push(pkt);
        return Ok(());
    }

    // 首个等待者：广播请求
    let sender_ip = l3
        .addrs
        .first()
        .map(|(a, _)| *a)
        .unwrap_or(IPAddress::UNSPECIFIED);
    l3.arp.pending.insert(next_hop, vec![pkt]);
    debug!(%next_hop, "广播 ARP 请求");
    net.trace.record(
        sched.now(),
        TraceEvent::ArpRequestSent {
            iface,
            target: next_hop,
        },
    );
    let req = ArpPayload {
        op: ArpOp::Request,
        sender_mac: src_mac,
        sender_ip,
        target_mac: None,
        target_ip: next_hop,
    };
    let frame = Frame::builder()
        .src(src_mac)
        .dst(MacAddress::BROADCAST)
        .payload(FramePayload::Arp(req))
        .build()?;
    net.send_bits(sched, iface, frame)
}

/// 接口收到 ARP 帧。
pub fn on_frame(
    net: &mut Network,
    sched: &mut Scheduler,
    iface: IfaceId,
    arp: &ArpPayload,
) -> Verdict {
    let now_ms = sched.delta_ms();
    match arp.op {
        ArpOp::Request => {
            net.trace.record(
                sched.now(),
                TraceEvent::ArpRequestRecv {
                    iface,
                    target: arp.target_ip,
                },
            );
            let ifc = net.iface_mut(iface);
            let src_mac = ifc.mac;
            let owns = ifc
                .l3
                .as_ref()
                .map(|l3| l3.holds(&arp.target_ip))
                .unwrap_or(false);
            if !owns {
                return Verdict::Handled;
            }
            // 顺手学习请求方
            ifc.l3_mut()
                .arp
                .table
                .insert(arp.sender_ip, (arp.sender_mac, now_ms));
            debug!(target = %arp.target_ip, "单播 ARP 应答");
            net.trace.record(
                sched.now(),
                TraceEvent::ArpReplySent {
                    iface,
                    target: arp.sender_ip,
                },
            );
            let reply = ArpPayload {
                op: ArpOp::Reply,
                sender_mac: src_mac,
                sender_ip: arp.target_ip,
                target_mac: Some(arp.sender_mac),
                target_ip: arp.sender_ip,
            };
            let frame = Frame::builder()
                .src(src_mac)
                .dst(arp.sender_mac)
                .payload(FramePayload::Arp(reply))
                .build()
                .expect("all fields set");
            let _ = net.send_bits(sched, iface, frame);
            Verdict::Handled
        }
        ArpOp::Reply => {
            net.trace.record(
                sched.now(),
                TraceEvent::ArpReplyRecv {
                    iface,
                    resolved: arp.sender_ip,
                },
            );
            let ifc = net.iface_mut(iface);
            let src_mac = ifc.mac;
            let l3 = ifc.l3_mut();
            l3.arp
                .table
                .insert(arp.sender_ip, (arp.sender_mac, now_ms));
            let queued = l3.arp.pending.remove(&arp.sender_ip).unwrap_or_default();
            debug!(resolved = %arp.sender_ip, flushed = queued.len(), "ARP 应答到达，放行排队报文");
            for pkt in queued {
                let frame = Frame::builder()
                    .src(src_mac)
                    .dst(arp.sender_mac)
                    .payload(FramePayload::Ipv4(pkt))
                    .build()
                    .expect("all fields set");
                let _ = net.send_bits(sched, iface, frame);
            }
            Verdict::Handled
        }
    }
}

/// 周期清扫：清掉超过老化窗口未见的表项。
pub fn sweep(net: &mut Network, iface: IfaceId, now_ms: f64) {
    let Some(l3) = net.iface_mut(iface).l3.as_mut() else {
        return;
    };
    let before = l3.arp.table.len();
    l3.arp
        .table
        .retain(|_, (_, last_seen)| now_ms - *last_seen < ARP_AGE_SECS * 1000.0);
    let removed = before - l3.arp.table.len();
    if removed > 0 {
        debug!(removed, "ARP 表老化清扫");
    }
}
