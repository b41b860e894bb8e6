//! 网络 arena
//!
//! 所有节点、接口、链路的属主。节点经 take/put 出入 arena 处理帧，
//! 期间可以自由可变借用 `Network` 本身；接口与链路用整数句柄互指，
//! 不存在引用环。ping 与 DHCP 协商的在途状态也记在这里，
//! 由回包与调度器超时赛跑结清。

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, trace, warn};

use super::deliver::{DeliverBits, DeliverPacket, DhcpTimeout, PingTimeout};
use super::id::{IfaceId, LinkId, NodeId};
use super::iface::{Iface, PortKind, VlanConfig};
use super::link::Link;
use super::trace::{Stats, Trace, TraceEvent};
use crate::addr::{IPAddress, MacAddress};
use crate::error::SimError;
use crate::hook::{IfaceEvent, IfaceEventBus};
use crate::msg::{Frame, FramePayload, IpProto, Ipv4Packet, Ipv4Payload, Payload};
use crate::node::{EndHost, Node, NodeKind, RouterHost, SwitchHost};
use crate::proto::{arp, autoneg, dhcp, frag, icmp, stp, PortState, StpService};
use crate::sim::{Scheduler, TimerKey};

/// 分片阈值：单片最大载荷字节数。
pub const MTU_PAYLOAD_BYTES: u32 = 1480;
/// 老化清扫周期（模型秒）。
pub const SWEEP_PERIOD_SECS: f64 = 10.0;
/// 回环投递的名义时延（模型秒）。
pub(crate) const LOOPBACK_DELAY_SECS: f64 = 1e-6;

/// 在途 ping 的状态。
#[derive(Debug)]
pub struct PingState {
    pub node: NodeId,
    pub dst: IPAddress,
    pub started_ms: f64,
    /// None = 在途；Some(None) = 超时；Some(Some(rtt)) = 成功
    pub result: Option<Option<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DhcpPhase {
    Discovering,
    Requesting,
}

#[derive(Debug)]
struct DhcpSession {
    iface: IfaceId,
    phase: DhcpPhase,
    /// None = 在途；Some(None) = 超时；Some(Some(addr)) = 拿到租约
    result: Option<Option<IPAddress>>,
}

/// 网络世界的 arena。
pub struct Network {
    nodes: Vec<Option<Box<dyn Node>>>,
    ifaces: Vec<Iface>,
    links: Vec<Link>,
    pub trace: Trace,
    pub stats: Stats,
    pub bus: IfaceEventBus,
    /// 监听器链的 Handled 语义旗标（见 `hook::dispatch`）
    pub handled_notifies_rest: bool,
    rng: StdRng,
    next_ident: u16,
    next_ping_ident: u16,
    next_xid: u32,
    pings: HashMap<u16, PingState>,
    dhcp_sessions: HashMap<u32, DhcpSession>,
}

impl Default for Network {
    fn default() -> Self {
        Network::with_seed(0x6c_61_6e)
    }
}

impl Network {
    pub fn new() -> Self {
        Network::default()
    }

    /// 固定随机种子（MAC 生成），测试可复现。
    pub fn with_seed(seed: u64) -> Self {
        Network {
            nodes: Vec::new(),
            ifaces: Vec::new(),
            links: Vec::new(),
            trace: Trace::default(),
            stats: Stats::default(),
            bus: IfaceEventBus::default(),
            handled_notifies_rest: false,
            rng: StdRng::seed_from_u64(seed),
            next_ident: 0,
            next_ping_ident: 0,
            next_xid: 0,
            pings: HashMap::new(),
            dhcp_sessions: HashMap::new(),
        }
    }

    // ---- 拓扑搭建 ----

    fn push_node(&mut self, node: Box<dyn Node>) -> NodeId {
        let id = node.id();
        self.nodes.push(Some(node));
        id
    }

    pub fn add_switch(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.push_node(Box::new(SwitchHost::new(id, name.into())))
    }

    pub fn add_router(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.push_node(Box::new(RouterHost::new(id, name.into())))
    }

    pub fn add_server(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.push_node(Box::new(EndHost::new(id, name.into(), NodeKind::Server)))
    }

    pub fn add_computer(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.push_node(Box::new(EndHost::new(id, name.into(), NodeKind::Computer)))
    }

    /// 给节点加一个接口，按端口类型前缀自动命名（Cisco 风格 `前缀0/序号`）。
    pub fn add_iface(&mut self, node: NodeId, kind: PortKind) -> IfaceId {
        let id = IfaceId(self.ifaces.len());
        let mac = MacAddress::generate(&mut self.rng);
        let n = self.nodes[node.0].as_mut().expect("node present");
        let index = n
            .ifaces()
            .iter()
            .filter(|(name, _)| name.starts_with(kind.prefix()))
            .count();
        let name = format!("{}0/{}", kind.prefix(), index);
        n.ifaces_mut().insert(name.clone(), id);
        self.ifaces.push(Iface::new(id, node, name, kind, mac));
        self.emit_iface_event(node, id, IfaceEvent::Added);
        id
    }

    /// 把两个接口连成一条链路。接口已接线或两端相同时报错。
    /// 链路比特率取两端当前速率的较小值，随后续自协商结果刷新。
    pub fn connect(
        &mut self,
        sched: &mut Scheduler,
        a: IfaceId,
        b: IfaceId,
        length_m: f64,
    ) -> Result<LinkId, SimError> {
        if a == b {
            return Err(SimError::LinkEndpointMismatch);
        }
        for id in [a, b] {
            if self.ifaces[id.0].link.is_some() {
                return Err(SimError::AlreadyConnected(self.ifaces[id.0].name.clone()));
            }
        }
        let bitrate = self.ifaces[a.0].speed.min(self.ifaces[b.0].speed) * 1_000_000;
        let link = LinkId(self.links.len());
        self.links.push(Link::new(a, b, length_m, bitrate));
        self.ifaces[a.0].link = Some(link);
        self.ifaces[b.0].link = Some(link);
        info!(?a, ?b, length_m, bitrate, "🔗 链路接通");
        autoneg::start(self, sched, a);
        autoneg::start(self, sched, b);
        Ok(link)
    }

    // ---- 访问器 ----

    pub fn iface(&self, id: IfaceId) -> &Iface {
        &self.ifaces[id.0]
    }

    pub fn iface_mut(&mut self, id: IfaceId) -> &mut Iface {
        &mut self.ifaces[id.0]
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    pub fn node(&self, id: NodeId) -> Option<&dyn Node> {
        self.nodes.get(id.0)?.as_deref()
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut (dyn Node + 'static)> {
        self.nodes.get_mut(id.0)?.as_deref_mut()
    }

    pub fn iface_by_name(&self, node: NodeId, name: &str) -> Option<IfaceId> {
        self.node(node)?.ifaces().get(name)
    }

    // ---- 接口管理 ----

    pub fn set_up(&mut self, sched: &mut Scheduler, iface: IfaceId) {
        let ifc = &mut self.ifaces[iface.0];
        if ifc.up {
            return;
        }
        ifc.up = true;
        let owner = ifc.owner;
        let link = ifc.link;
        info!(?iface, "接口上线");
        self.emit_iface_event(owner, iface, IfaceEvent::Up);
        // 两端都在线才会协商成功，起来时双向重启
        if let Some(l) = link {
            let [a, b] = self.links[l.0].endpoints;
            autoneg::start(self, sched, a);
            autoneg::start(self, sched, b);
        }
    }

    pub fn set_down(&mut self, iface: IfaceId) {
        let ifc = &mut self.ifaces[iface.0];
        if !ifc.up {
            return;
        }
        ifc.up = false;
        let owner = ifc.owner;
        info!(?iface, "接口下线");
        self.emit_iface_event(owner, iface, IfaceEvent::Down);
    }

    /// 设定接口速率（语义见 `Iface::set_speed`），成功后刷新链路比特率。
    /// 速率 0 表示待协商：接口已接线时立即在两端重启自协商。
    pub fn set_speed(
        &mut self,
        sched: &mut Scheduler,
        iface: IfaceId,
        speed: u64,
    ) -> Result<(), SimError> {
        self.ifaces[iface.0].set_speed(speed)?;
        let owner = self.ifaces[iface.0].owner;
        self.emit_iface_event(owner, iface, IfaceEvent::Changed);
        if speed == 0 {
            if let Some(l) = self.ifaces[iface.0].link {
                let [a, b] = self.links[l.0].endpoints;
                autoneg::start(self, sched, a);
                autoneg::start(self, sched, b);
            }
        }
        Ok(())
    }

    pub fn set_duplex(&mut self, iface: IfaceId, full: bool) -> Result<(), SimError> {
        self.ifaces[iface.0].set_duplex(full)?;
        let owner = self.ifaces[iface.0].owner;
        self.emit_iface_event(owner, iface, IfaceEvent::Changed);
        Ok(())
    }

    /// 配置 802.1Q。VLAN 号超过 4094 的配置被拒绝。
    pub fn set_vlan(&mut self, iface: IfaceId, cfg: VlanConfig) -> Result<(), SimError> {
        if let Some(&bad) = cfg.vlans.iter().find(|&&v| v > 4094) {
            return Err(SimError::InvalidVlanAssignment(bad));
        }
        if cfg.native > 4094 {
            return Err(SimError::InvalidVlanAssignment(cfg.native));
        }
        self.ifaces[iface.0].vlan = Some(cfg);
        Ok(())
    }

    pub fn set_net_address(
        &mut self,
        iface: IfaceId,
        addr: IPAddress,
        mask: IPAddress,
    ) -> Result<(), SimError> {
        self.ifaces[iface.0].add_net_address(addr, mask)
    }

    pub fn set_gateway(&mut self, node: NodeId, gateway: IPAddress) {
        if let Some(host) = self
            .node_mut(node)
            .and_then(|n| n.as_any_mut().downcast_mut::<EndHost>())
        {
            host.set_gateway(Some(gateway));
        }
    }

    pub fn add_route(
        &mut self,
        node: NodeId,
        network: IPAddress,
        mask: IPAddress,
        gateway: IPAddress,
    ) -> Result<(), SimError> {
        match self
            .node_mut(node)
            .and_then(|n| n.as_any_mut().downcast_mut::<RouterHost>())
        {
            Some(r) => r.routing_mut().add(network, mask, gateway),
            None => Err(SimError::RouteNotFound),
        }
    }

    pub fn remove_route(
        &mut self,
        node: NodeId,
        network: &IPAddress,
        mask: &IPAddress,
    ) -> Result<(), SimError> {
        match self
            .node_mut(node)
            .and_then(|n| n.as_any_mut().downcast_mut::<RouterHost>())
        {
            Some(r) => r.routing_mut().remove(network, mask),
            None => Err(SimError::RouteNotFound),
        }
    }

    // ---- 生成树 ----

    /// 在交换机上开启生成树：桥 MAC 取全部端口 MAC 的最小值，
    /// 全部端口入栈（Designated/Blocking 起步），并启动 hello 周期。
    pub fn enable_stp(&mut self, sched: &mut Scheduler, node: NodeId) {
        let Some(n) = self.node(node) else { return };
        let ids: Vec<IfaceId> = n.ifaces().ids().collect();
        let Some(bridge_mac) = ids.iter().map(|&i| self.ifaces[i.0].mac).min() else {
            warn!(?node, "无接口，生成树未启动");
            return;
        };
        let Some(sw) = self
            .node_mut(node)
            .and_then(|n| n.as_any_mut().downcast_mut::<SwitchHost>())
        else {
            return;
        };
        let mut svc = StpService::new(node, bridge_mac);
        for id in &ids {
            svc.enroll_port(*id, sched);
        }
        sw.set_stp(Some(svc));
        info!(?node, %bridge_mac, "🌲 生成树启动");
        stp::start_hello(node, sched);
    }

    pub fn disable_stp(&mut self, sched: &mut Scheduler, node: NodeId) {
        if let Some(sw) = self
            .node_mut(node)
            .and_then(|n| n.as_any_mut().downcast_mut::<SwitchHost>())
        {
            sw.set_stp(None);
            sched.cancel_repeat(TimerKey::StpHello(node));
        }
    }

    pub fn is_stp_root(&self, node: NodeId) -> Option<bool> {
        self.node(node)?
            .as_any()
            .downcast_ref::<SwitchHost>()?
            .stp()
            .map(|s| s.is_root())
    }

    // ---- 物理层 ----

    /// 把一个帧从接口发上链路。接口 down 报错；未接线的接口
    /// 把比特发进虚空（丢弃）。
    pub fn send_bits(
        &mut self,
        sched: &mut Scheduler,
        iface: IfaceId,
        frame: Frame,
    ) -> Result<(), SimError> {
        let ifc = &self.ifaces[iface.0];
        if !ifc.up {
            return Err(SimError::InterfaceDown(ifc.name.clone()));
        }
        let Some(link_id) = ifc.link else {
            trace!(?iface, "悬空接口，比特丢弃");
            return Ok(());
        };
        let bytes = frame.len_bytes();
        self.trace
            .record(sched.now(), TraceEvent::BitsSent { iface, bytes });
        let link = &self.links[link_id.0];
        let peer = link.peer(iface)?;
        let prop = link.propagation_secs();
        let tx = link.transmission_secs(bytes);
        sched.once_scaled(prop, tx, DeliverBits { iface: peer, frame });
        Ok(())
    }

    /// 比特到达接收端（`DeliverBits` 事件入口）。
    pub(crate) fn deliver_bits(&mut self, sched: &mut Scheduler, iface: IfaceId, frame: Frame) {
        let ifc = &self.ifaces[iface.0];
        if !ifc.up {
            trace!(?iface, "接口 down，入帧丢弃");
            return;
        }
        let bytes = frame.len_bytes();
        self.trace
            .record(sched.now(), TraceEvent::BitsRecv { iface, bytes });
        self.stats.delivered_frames += 1;

        // 物理层控制帧不进链路层
        if let FramePayload::Autoneg(page) = frame.payload {
            autoneg::on_page(self, sched, iface, page);
            return;
        }

        let ifc = &self.ifaces[iface.0];
        let Some(vlan) = ifc.ingress_vlan(&frame) else {
            debug!(?iface, tag = ?frame.tag, "入方向 VLAN 拒收");
            return;
        };
        self.trace.record(
            sched.now(),
            TraceEvent::FrameRecv {
                iface,
                src: frame.src,
                dst: frame.dst,
                vlan,
            },
        );
        let owner = ifc.owner;
        let Some(mut node) = self.nodes[owner.0].take() else {
            // 节点正在处理其他帧（不应发生：事件是串行的）
            return;
        };
        node.on_frame(iface, frame, vlan, sched, self);
        self.nodes[owner.0] = Some(node);
    }

    /// 回环报文到达（`DeliverPacket` 事件入口）。
    pub(crate) fn deliver_packet(
        &mut self,
        sched: &mut Scheduler,
        node: NodeId,
        iface: IfaceId,
        pkt: Ipv4Packet,
    ) {
        let Some(n) = self.nodes[node.0].take() else {
            return;
        };
        crate::node::deliver_local(&*n, self, sched, iface, pkt);
        self.nodes[node.0] = Some(n);
    }

    // ---- 应用操作 ----

    /// 从节点给目的地址发一段文本，超过分片阈值时自动分片。
    pub fn send_text(
        &mut self,
        sched: &mut Scheduler,
        node: NodeId,
        dst: IPAddress,
        text: impl Into<String>,
    ) -> Result<(), SimError> {
        let (out, next_hop, local) = self.route_from(node, &dst)?;
        let src = self.source_addr(out, &dst, local);
        let ident = self.alloc_ident();
        let frags = Ipv4Packet::builder()
            .src(src)
            .dst(dst)
            .ident(ident)
            .protocol(IpProto::Test)
            .payload(Ipv4Payload::Text(Payload::from(text.into())))
            .fragment(MTU_PAYLOAD_BYTES)?;
        debug!(?node, %dst, pieces = frags.len(), "发送文本");
        for pkt in frags {
            if local {
                sched.once(LOOPBACK_DELAY_SECS, DeliverPacket { node, iface: out, pkt });
            } else {
                arp::enqueue(self, sched, out, next_hop, pkt)?;
            }
        }
        Ok(())
    }

    /// 交换机本地始发帧：交换机没有"源接口"语义，以各出端口自己的
    /// MAC 为源、帧层广播，泛洪到全部转发态、在线且接线的端口。
    pub fn send_frame(
        &mut self,
        sched: &mut Scheduler,
        node: NodeId,
        text: impl Into<String>,
    ) -> Result<(), SimError> {
        let outs: Vec<IfaceId> = match self.node(node) {
            Some(n) => {
                let stp = n
                    .as_any()
                    .downcast_ref::<SwitchHost>()
                    .and_then(|sw| sw.stp());
                n.ifaces()
                    .ids()
                    .filter(|&i| {
                        stp.map(|s| s.port_state(i)).unwrap_or(PortState::Forwarding)
                            == PortState::Forwarding
                    })
                    .collect()
            }
            None => return Ok(()),
        };
        let text = text.into();
        debug!(?node, ports = outs.len(), "本地始发帧泛洪");
        for out in outs {
            let ifc = &self.ifaces[out.0];
            if !ifc.up || ifc.link.is_none() {
                continue;
            }
            let frame = Frame::builder()
                .src(ifc.mac)
                .dst(MacAddress::BROADCAST)
                .payload(FramePayload::Text(text.clone()))
                .build()?;
            // 始发帧归入各端口自己的未打 tag 域
            let Some(vlan) = ifc.ingress_vlan(&frame) else {
                continue;
            };
            let Some(egress) = ifc.egress_frame(&frame, vlan) else {
                continue;
            };
            self.send_bits(sched, out, egress)?;
        }
        Ok(())
    }

    /// 发起一次 ping：发出回显请求并启动超时定时器。
    /// 返回用于查询结果的 identification。
    pub fn ping(
        &mut self,
        sched: &mut Scheduler,
        node: NodeId,
        dst: IPAddress,
        timeout_secs: f64,
    ) -> Result<u16, SimError> {
        let (out, next_hop, local) = self.route_from(node, &dst)?;
        let src = self.source_addr(out, &dst, local);
        let ident = self.alloc_ping_ident();
        let pkt_ident = self.alloc_ident();
        let pkt = icmp::echo_request(src, dst, ident, pkt_ident)?;
        self.pings.insert(
            ident,
            PingState {
                node,
                dst,
                started_ms: sched.delta_ms(),
                result: None,
            },
        );
        debug!(?node, %dst, ident, timeout_secs, "发起 ping");
        sched.once(timeout_secs, PingTimeout { ident });
        if local {
            sched.once(LOOPBACK_DELAY_SECS, DeliverPacket { node, iface: out, pkt });
        } else {
            arp::enqueue(self, sched, out, next_hop, pkt)?;
        }
        Ok(ident)
    }

    /// ping 结果：None = 在途，Some(None) = 超时，Some(Some(rtt_ms)) = 成功。
    pub fn ping_result(&self, ident: u16) -> Option<Option<f64>> {
        self.pings.get(&ident).and_then(|p| p.result)
    }

    /// 在接口上发起 DHCP 协商。返回用于查询结果的事务标识。
    pub fn dhcp_discover(
        &mut self,
        sched: &mut Scheduler,
        node: NodeId,
        iface: IfaceId,
        timeout_secs: f64,
    ) -> Result<u32, SimError> {
        dhcp::discover(self, sched, node, iface, timeout_secs)
    }

    /// DHCP 结果：None = 在途，Some(None) = 超时，Some(Some(addr)) = 拿到租约。
    pub fn dhcp_result(&self, xid: u32) -> Option<Option<IPAddress>> {
        self.dhcp_sessions.get(&xid).and_then(|s| s.result)
    }

    // ---- 选路助手 ----

    /// 节点视角的选路：(出接口, 下一跳, 是否本机地址)。
    fn route_from(
        &self,
        node: NodeId,
        dst: &IPAddress,
    ) -> Result<(IfaceId, IPAddress, bool), SimError> {
        let n = self.node(node).ok_or(SimError::NoRouteFound(*dst))?;
        // 受限广播：第一个有网络层的接口，帧层打广播
        if dst.is_broadcast() {
            let out = n
                .ifaces()
                .ids()
                .find(|&i| self.ifaces[i.0].l3.is_some())
                .ok_or(SimError::NoRouteFound(*dst))?;
            return Ok((out, *dst, false));
        }
        for id in n.ifaces().ids() {
            if let Some(l3) = &self.ifaces[id.0].l3 {
                if l3.holds(dst) {
                    return Ok((id, *dst, true));
                }
            }
        }
        n.resolve_route(self, dst)
            .map(|(out, hop)| (out, hop, false))
            .ok_or(SimError::NoRouteFound(*dst))
    }

    fn source_addr(&self, out: IfaceId, dst: &IPAddress, local: bool) -> IPAddress {
        if local {
            return *dst;
        }
        self.ifaces[out.0]
            .l3
            .as_ref()
            .and_then(|l3| l3.addrs.first().map(|(a, _)| *a))
            .unwrap_or(IPAddress::UNSPECIFIED)
    }

    // ---- 周期任务 ----

    /// 注册全部老化清扫定时器。拓扑搭建完成后调用一次。
    pub fn start_sweeps(&mut self, sched: &mut Scheduler) {
        for ifc in &self.ifaces {
            if ifc.l3.is_some() {
                sched.repeat(TimerKey::ArpSweep(ifc.id), SWEEP_PERIOD_SECS);
                sched.repeat(TimerKey::FragSweep(ifc.id), SWEEP_PERIOD_SECS);
            }
        }
        for node in self.nodes.iter().flatten() {
            match node.kind() {
                NodeKind::Switch => {
                    sched.repeat(TimerKey::MacSweep(node.id()), SWEEP_PERIOD_SECS)
                }
                NodeKind::Router => {
                    let has_dhcp = node
                        .as_any()
                        .downcast_ref::<RouterHost>()
                        .map(|r| r.dhcp().is_some())
                        .unwrap_or(false);
                    if has_dhcp {
                        sched.repeat(TimerKey::DhcpSweep(node.id()), SWEEP_PERIOD_SECS);
                    }
                }
                _ => {}
            }
        }
    }

    /// 周期定时器分发（`World::on_timer` 入口）。
    pub(crate) fn handle_timer(&mut self, key: TimerKey, sched: &mut Scheduler) {
        let now_ms = sched.delta_ms();
        match key {
            TimerKey::ArpSweep(iface) => arp::sweep(self, iface, now_ms),
            TimerKey::FragSweep(iface) => frag::sweep(self, iface, now_ms),
            TimerKey::MacSweep(node) => {
                if let Some(sw) = self
                    .node_mut(node)
                    .and_then(|n| n.as_any_mut().downcast_mut::<SwitchHost>())
                {
                    sw.sweep_macs(now_ms);
                }
            }
            TimerKey::StpHello(node) => {
                let Some(mut n) = self.nodes[node.0].take() else {
                    return;
                };
                if let Some(sw) = n.as_any_mut().downcast_mut::<SwitchHost>() {
                    if let Some(stp) = sw.stp_mut() {
                        stp.on_hello(self, sched);
                    }
                }
                self.nodes[node.0] = Some(n);
            }
            TimerKey::DhcpSweep(node) => {
                if let Some(r) = self
                    .node_mut(node)
                    .and_then(|n| n.as_any_mut().downcast_mut::<RouterHost>())
                {
                    if r.dhcp().is_some() {
                        r.dhcp_mut().sweep(now_ms);
                    }
                }
            }
        }
    }

    /// 生成树驻留定时器到期（`StpDwell` 事件入口）。
    pub(crate) fn stp_dwell(
        &mut self,
        node: NodeId,
        iface: IfaceId,
        generation: u64,
        sched: &mut Scheduler,
    ) {
        if let Some(sw) = self
            .node_mut(node)
            .and_then(|n| n.as_any_mut().downcast_mut::<SwitchHost>())
        {
            if let Some(stp) = sw.stp_mut() {
                stp.on_dwell(iface, generation, sched);
            }
        }
    }

    // ---- 生命周期事件 ----

    /// 通知全体订阅者，并在能力变化时刷新链路比特率。
    pub(crate) fn emit_iface_event(&mut self, node: NodeId, iface: IfaceId, event: IfaceEvent) {
        if event == IfaceEvent::Changed {
            if let Some(link) = self.ifaces[iface.0].link {
                let [a, b] = self.links[link.0].endpoints;
                let bitrate = self.ifaces[a.0].speed.min(self.ifaces[b.0].speed) * 1_000_000;
                self.links[link.0].bitrate_bps = bitrate;
            }
        }
        let mut bus = std::mem::take(&mut self.bus);
        bus.emit(node, iface, event);
        self.bus = bus;
    }

    // ---- 在途状态 ----

    pub(crate) fn alloc_ident(&mut self) -> u16 {
        self.next_ident = self.next_ident.wrapping_add(1);
        self.next_ident
    }

    fn alloc_ping_ident(&mut self) -> u16 {
        self.next_ping_ident = self.next_ping_ident.wrapping_add(1);
        self.next_ping_ident
    }

    pub(crate) fn ping_state_mut(&mut self, ident: u16) -> Option<&mut PingState> {
        self.pings.get_mut(&ident)
    }

    /// ping 超时（`PingTimeout` 事件入口）。回包先到则此处为空操作。
    pub(crate) fn ping_timeout(&mut self, sched: &mut Scheduler, ident: u16) {
        let Some(p) = self.pings.get_mut(&ident) else {
            return;
        };
        if p.result.is_some() {
            return;
        }
        p.result = Some(None);
        let node = p.node;
        debug!(ident, dst = %p.dst, "ping 超时");
        self.trace.record(
            sched.now(),
            TraceEvent::PingCompleted {
                node,
                ident,
                rtt_ms: None,
            },
        );
    }

    pub(crate) fn begin_dhcp_session(&mut self, _node: NodeId, iface: IfaceId) -> u32 {
        self.next_xid = self.next_xid.wrapping_add(1);
        let xid = self.next_xid;
        self.dhcp_sessions.insert(
            xid,
            DhcpSession {
                iface,
                phase: DhcpPhase::Discovering,
                result: None,
            },
        );
        xid
    }

    pub(crate) fn arm_dhcp_timeout(&mut self, sched: &mut Scheduler, xid: u32, secs: f64) {
        sched.once(secs, DhcpTimeout { xid });
    }

    pub(crate) fn dhcp_session_discovering(&self, xid: u32, iface: IfaceId) -> bool {
        self.dhcp_sessions
            .get(&xid)
            .map(|s| s.phase == DhcpPhase::Discovering && s.iface == iface)
            .unwrap_or(false)
    }

    pub(crate) fn dhcp_session_requesting(&mut self, xid: u32) {
        if let Some(s) = self.dhcp_sessions.get_mut(&xid) {
            s.phase = DhcpPhase::Requesting;
        }
    }

    /// 结清一次协商；已超时/已结清时返回 false（迟到的 Ack 被忽略）。
    pub(crate) fn finish_dhcp_session(&mut self, xid: u32, addr: IPAddress) -> bool {
        match self.dhcp_sessions.get_mut(&xid) {
            Some(s) if s.result.is_none() => {
                s.result = Some(Some(addr));
                true
            }
            _ => false,
        }
    }

    /// DHCP 超时（`DhcpTimeout` 事件入口）。
    pub(crate) fn dhcp_timeout(&mut self, xid: u32) {
        if let Some(s) = self.dhcp_sessions.get_mut(&xid) {
            if s.result.is_none() {
                debug!(xid, "DHCP 协商超时");
                s.result = Some(None);
            }
        }
    }
}
