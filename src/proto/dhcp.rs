//! DHCP
//!
//! 地址池租约协议（UDP 风格请求/应答，叠在网络层之上）。
//! 客户端：Discover 广播 → 等 Offer → 自动回 Request → 等 Ack，
//! 拿到地址后装到接口上并结清协商。服务器：按收包接口的既有子网
//! 匹配地址池；Discover 先以短租约临时预留，Request 换全天租约并 Ack；
//! 无匹配地址池时静默忽略（不发 Nak，保留原始行为）。

use std::collections::HashMap;

use crate::addr::{IPAddress, MacAddress};
use crate::error::SimError;
use crate::hook::Verdict;
use crate::msg::{DhcpMessage, DhcpOp, Frame, FramePayload, IpProto, Ipv4Packet, Ipv4Payload};
use crate::net::{IfaceId, Network, NodeId, TraceEvent};
use crate::sim::Scheduler;
use tracing::{debug, trace};

/// Offer 的临时预留租期（模型秒）。
pub const OFFER_LEASE_SECS: u32 = 60;
/// Ack 的正式租期（模型秒）：一整天。
pub const ACK_LEASE_SECS: u32 = 86_400;

/// 一个地址池。
#[derive(Debug)]
pub struct DhcpPool {
    pub gateway: IPAddress,
    pub netmask: IPAddress,
    pub start: IPAddress,
    pub end: IPAddress,
    /// 预留：地址 → 到期时间戳（delta_ms）
    pub reservations: HashMap<IPAddress, f64>,
}

impl DhcpPool {
    /// 创建地址池；start/end 必须落在网关所在网络内。
    pub fn new(
        gateway: IPAddress,
        netmask: IPAddress,
        start: IPAddress,
        end: IPAddress,
    ) -> Result<Self, SimError> {
        if !gateway.in_same_network(&netmask, &start) || !gateway.in_same_network(&netmask, &end) {
            return Err(SimError::InvalidPool);
        }
        Ok(DhcpPool {
            gateway,
            netmask,
            start,
            end,
            reservations: HashMap::new(),
        })
    }

    /// 池内第一个未预留的地址。
    fn first_free(&self, now_ms: f64) -> Option<IPAddress> {
        let mut cur = self.start;
        loop {
            let reserved = self
                .reservations
                .get(&cur)
                .map(|&expires| expires > now_ms)
                .unwrap_or(false);
            if !reserved && cur != self.gateway {
                return Some(cur);
            }
            if cur == self.end {
                return None;
            }
            cur = cur.add(1);
        }
    }

    fn contains(&self, addr: &IPAddress) -> bool {
        self.gateway.in_same_network(&self.netmask, addr)
    }
}

/// DHCP 服务器（路由器服务）。
#[derive(Debug, Default)]
pub struct DhcpServer {
    pools: Vec<DhcpPool>,
}

impl DhcpServer {
    pub fn add_pool(&mut self, pool: DhcpPool) {
        self.pools.push(pool);
    }

    pub fn pools(&self) -> &[DhcpPool] {
        &self.pools
    }

    /// 监听器链入口：拦截发给本服务器的 DHCP 报文。
    pub fn on_frame(
        &mut self,
        node: NodeId,
        iface: IfaceId,
        frame: &Frame,
        sched: &mut Scheduler,
        net: &mut Network,
    ) -> Verdict {
        let FramePayload::Ipv4(pkt) = &frame.payload else {
            return Verdict::Continue;
        };
        let Ipv4Payload::Dhcp(dhcp) = &pkt.payload else {
            return Verdict::Continue;
        };
        match dhcp.op {
            DhcpOp::Discover => self.on_discover(node, iface, dhcp, sched, net),
            DhcpOp::Request => self.on_request(node, iface, dhcp, sched, net),
            // Offer/Ack 是服务器自己发出的方向，不拦截
            _ => Verdict::Continue,
        }
    }

    fn matching_pool(&mut self, net: &Network, iface: IfaceId) -> Option<usize> {
        let ifc = net.iface(iface);
        let addrs = ifc.l3.as_ref()?.addrs.clone();
        self.pools.iter().position(|pool| {
            addrs.iter().any(|(a, _)| pool.contains(a))
        })
    }

    fn on_discover(
        &mut self,
        node: NodeId,
        iface: IfaceId,
        dhcp: &DhcpMessage,
        sched: &mut Scheduler,
        net: &mut Network,
    ) -> Verdict {
        let now_ms = sched.delta_ms();
        let Some(pool_idx) = self.matching_pool(net, iface) else {
            // 无匹配地址池：静默丢弃
            debug!(?node, "Discover 无匹配地址池，忽略");
            net.trace.record(sched.now(), TraceEvent::DhcpIgnored { node });
            return Verdict::Handled;
        };
        let pool = &mut self.pools[pool_idx];
        let Some(offer_addr) = pool.first_free(now_ms) else {
            debug!(?node, "地址池耗尽，忽略");
            net.trace.record(sched.now(), TraceEvent::DhcpIgnored { node });
            return Verdict::Handled;
        };
        pool.reservations
            .insert(offer_addr, now_ms + OFFER_LEASE_SECS as f64 * 1000.0);
        let (gateway, netmask) = (pool.gateway, pool.netmask);
        debug!(?node, addr = %offer_addr, "发送 Offer");
        net.trace.record(
            sched.now(),
            TraceEvent::DhcpOffered {
                node,
                addr: offer_addr,
            },
        );
        let offer = DhcpMessage::builder()
            .op(DhcpOp::Offer)
            .xid(dhcp.xid)
            .client_mac(dhcp.client_mac)
            .yiaddr(offer_addr)
            .mask(netmask)
            .gateway(gateway)
            .lease_secs(OFFER_LEASE_SECS)
            .build()
            .expect("all fields set");
        send_server_reply(net, sched, iface, dhcp.client_mac, gateway, offer);
        Verdict::Handled
    }

    fn on_request(
        &mut self,
        node: NodeId,
        iface: IfaceId,
        dhcp: &DhcpMessage,
        sched: &mut Scheduler,
        net: &mut Network,
    ) -> Verdict {
        let now_ms = sched.delta_ms();
        let Some(requested) = dhcp.yiaddr else {
            return Verdict::Handled;
        };
        let Some(pool) = self.pools.iter_mut().find(|p| p.contains(&requested)) else {
            debug!(?node, addr = %requested, "Request 无匹配地址池，忽略");
            net.trace.record(sched.now(), TraceEvent::DhcpIgnored { node });
            return Verdict::Handled;
        };
        // 换成正式租约
        pool.reservations
            .insert(requested, now_ms + ACK_LEASE_SECS as f64 * 1000.0);
        let (gateway, netmask) = (pool.gateway, pool.netmask);
        debug!(?node, addr = %requested, "发送 Ack");
        let ack = DhcpMessage::builder()
            .op(DhcpOp::Ack)
            .xid(dhcp.xid)
            .client_mac(dhcp.client_mac)
            .yiaddr(requested)
            .mask(netmask)
            .gateway(gateway)
            .lease_secs(ACK_LEASE_SECS)
            .build()
            .expect("all fields set");
        send_server_reply(net, sched, iface, dhcp.client_mac, gateway, ack);
        Verdict::Handled
    }

    /// 周期清扫：清掉已到期的预留。
    pub fn sweep(&mut self, now_ms: f64) {
        for pool in &mut self.pools {
            let before = pool.reservations.len();
            pool.reservations.retain(|_, &mut expires| expires > now_ms);
            let removed = before - pool.reservations.len();
            if removed > 0 {
                trace!(removed, "过期 DHCP 预留清除");
            }
        }
    }
}

// 服务器应答：IP 层广播（客户端尚无地址），帧层单播到客户端 MAC。
fn send_server_reply(
    net: &mut Network,
    sched: &mut Scheduler,
    iface: IfaceId,
    client_mac: MacAddress,
    server_ip: IPAddress,
    msg: DhcpMessage,
) {
    let pkt = Ipv4Packet::builder()
        .src(server_ip)
        .dst(IPAddress::BROADCAST)
        .ident(net.alloc_ident())
        .protocol(IpProto::Udp)
        .payload(Ipv4Payload::Dhcp(msg))
        .build()
        .expect("src/dst present");
    let src_mac = net.iface(iface).mac;
    let frame = Frame::builder()
        .src(src_mac)
        .dst(client_mac)
        .payload(FramePayload::Ipv4(pkt))
        .build()
        .expect("all fields set");
    let _ = net.send_bits(sched, iface, frame);
}

/// 客户端：发起一次 DHCP 协商。返回事务标识。
pub fn discover(
    net: &mut Network,
    sched: &mut Scheduler,
    node: NodeId,
    iface: IfaceId,
    timeout_secs: f64,
) -> Result<u32, SimError> {
    let xid = net.begin_dhcp_session(node, iface);
    let mac = net.iface(iface).mac;
    debug!(?node, xid, "广播 Discover");
    let msg = DhcpMessage::builder()
        .op(DhcpOp::Discover)
        .xid(xid)
        .client_mac(mac)
        .build()?;
    let pkt = Ipv4Packet::builder()
        .src(IPAddress::UNSPECIFIED)
        .dst(IPAddress::BROADCAST)
        .ident(net.alloc_ident())
        .protocol(IpProto::Udp)
        .payload(Ipv4Payload::Dhcp(msg))
        .build()?;
    let frame = Frame::builder()
        .src(mac)
        .dst(MacAddress::BROADCAST)
        .payload(FramePayload::Ipv4(pkt))
        .build()?;
    net.send_bits(sched, iface, frame)?;
    net.arm_dhcp_timeout(sched, xid, timeout_secs);
    Ok(xid)
}

/// 客户端监听器：处理发到本接口的 Offer / Ack。
pub fn client_on_frame(
    net: &mut Network,
    sched: &mut Scheduler,
    node: NodeId,
    iface: IfaceId,
    frame: &Frame,
) -> Verdict {
    let FramePayload::Ipv4(pkt) = &frame.payload else {
        return Verdict::Continue;
    };
    let Ipv4Payload::Dhcp(dhcp) = &pkt.payload else {
        return Verdict::Continue;
    };
    let my_mac = net.iface(iface).mac;
    if dhcp.client_mac != my_mac {
        return Verdict::Continue;
    }
    match dhcp.op {
        DhcpOp::Offer => {
            if !net.dhcp_session_discovering(dhcp.xid, iface) {
                return Verdict::Handled;
            }
            let Some(offered) = dhcp.yiaddr else {
                return Verdict::Handled;
            };
            debug!(?node, xid = dhcp.xid, addr = %offered, "收到 Offer，自动回 Request");
            net.dhcp_session_requesting(dhcp.xid);
            let request = DhcpMessage::builder()
                .op(DhcpOp::Request)
                .xid(dhcp.xid)
                .client_mac(my_mac)
                .yiaddr(offered)
                .build()
                .expect("all fields set");
            let req_pkt = Ipv4Packet::builder()
                .src(IPAddress::UNSPECIFIED)
                .dst(IPAddress::BROADCAST)
                .ident(net.alloc_ident())
                .protocol(IpProto::Udp)
                .payload(Ipv4Payload::Dhcp(request))
                .build()
                .expect("src/dst present");
            let req_frame = Frame::builder()
                .src(my_mac)
                .dst(MacAddress::BROADCAST)
                .payload(FramePayload::Ipv4(req_pkt))
                .build()
                .expect("all fields set");
            let _ = net.send_bits(sched, iface, req_frame);
            Verdict::Handled
        }
        DhcpOp::Ack => {
            let Some(addr) = dhcp.yiaddr else {
                return Verdict::Handled;
            };
            let mask = dhcp.mask.unwrap_or_else(|| addr.generate_mask());
            debug!(?node, xid = dhcp.xid, addr = %addr, "收到 Ack，安装地址");
            if net.finish_dhcp_session(dhcp.xid, addr) {
                let _ = net.set_net_address(iface, addr, mask);
                net.trace
                    .record(sched.now(), TraceEvent::DhcpAcked { node, addr });
            }
            Verdict::Handled
        }
        _ => Verdict::Continue,
    }
}
