//! 交换机
//!
//! 纯链路层设备：按源 MAC 学习、按目的 MAC 单播或泛洪，
//! 入/出方向都过 VLAN 判定。开启生成树后端口状态约束学习与转发
//! （Blocking/Listening 丢弃、Learning 只学习、Forwarding 全放行）。
//! 学习表按最近可见时间老化。

use std::any::Any;
use std::collections::HashMap;

use super::{IfaceMap, Node, NodeKind};
use crate::addr::{IPAddress, MacAddress};
use crate::hook::{self, Verdict};
use crate::msg::{Frame, FramePayload};
use crate::net::{IfaceId, Network, NodeId};
use crate::proto::stp::{PortState, StpService};
use crate::sim::Scheduler;
use tracing::{debug, trace};

/// MAC 学习表老化窗口（模拟秒）。
pub const MAC_AGE_SECS: f64 = 300.0;

/// 交换机的监听器链标签。
#[derive(Debug, Clone, Copy)]
enum SwitchService {
    Stp,
}

/// 交换机节点。
pub struct SwitchHost {
    id: NodeId,
    name: String,
    ifaces: IfaceMap,
    /// 源 MAC → (学习到的接口, 最近可见时间戳 delta_ms)
    mac_table: HashMap<MacAddress, (IfaceId, f64)>,
    stp: Option<StpService>,
}

impl SwitchHost {
    pub fn new(id: NodeId, name: String) -> Self {
        SwitchHost {
            id,
            name,
            ifaces: IfaceMap::default(),
            mac_table: HashMap::new(),
            stp: None,
        }
    }

    pub fn stp(&self) -> Option<&StpService> {
        self.stp.as_ref()
    }

    pub fn stp_mut(&mut self) -> Option<&mut StpService> {
        self.stp.as_mut()
    }

    pub fn set_stp(&mut self, service: Option<StpService>) {
        self.stp = service;
    }

    pub fn mac_table(&self) -> &HashMap<MacAddress, (IfaceId, f64)> {
        &self.mac_table
    }

    /// 学习表老化清扫。
    pub fn sweep_macs(&mut self, now_ms: f64) {
        let before = self.mac_table.len();
        self.mac_table
            .retain(|_, (_, last_seen)| now_ms - *last_seen < MAC_AGE_SECS * 1000.0);
        let removed = before - self.mac_table.len();
        if removed > 0 {
            debug!(node = %self.name, removed, "MAC 学习表老化清扫");
        }
    }

    fn port_state(&self, iface: IfaceId) -> PortState {
        self.stp
            .as_ref()
            .map(|s| s.port_state(iface))
            .unwrap_or(PortState::Forwarding)
    }

    /// 按学习表单播或泛洪。出方向逐口过 VLAN 变换与生成树状态。
    fn forward(
        &mut self,
        ingress: IfaceId,
        frame: &Frame,
        vlan: u16,
        sched: &mut Scheduler,
        net: &mut Network,
    ) {
        let known = frame
            .dst
            .filter(|d| !d.is_broadcast())
            .and_then(|d| self.mac_table.get(&d).map(|(i, _)| *i));

        if let Some(out) = known {
            if out == ingress || self.port_state(out) != PortState::Forwarding {
                return;
            }
            if let Some(egress) = net.iface(out).egress_frame(frame, vlan) {
                trace!(node = %self.name, ?out, "单播转发");
                let _ = net.send_bits(sched, out, egress);
            }
            return;
        }

        // 未知单播与广播一视同仁：除入口外全泛洪
        let outs: Vec<IfaceId> = self.ifaces.ids().filter(|&i| i != ingress).collect();
        for out in outs {
            if self.port_state(out) != PortState::Forwarding {
                continue;
            }
            let ifc = net.iface(out);
            if !ifc.up || ifc.link.is_none() {
                continue;
            }
            if let Some(egress) = ifc.egress_frame(frame, vlan) {
                trace!(node = %self.name, ?out, "泛洪");
                let _ = net.send_bits(sched, out, egress);
            }
        }
    }
}

impl Node for SwitchHost {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Switch
    }

    fn ifaces(&self) -> &IfaceMap {
        &self.ifaces
    }

    fn ifaces_mut(&mut self) -> &mut IfaceMap {
        &mut self.ifaces
    }

    fn on_frame(
        &mut self,
        iface: IfaceId,
        frame: Frame,
        vlan: u16,
        sched: &mut Scheduler,
        net: &mut Network,
    ) {
        let state = self.port_state(iface);
        if matches!(state, PortState::Blocking | PortState::Listening) {
            // BPDU 仍要进生成树，业务帧一律丢弃
            if let FramePayload::Bpdu(bpdu) = &frame.payload {
                if let Some(stp) = self.stp.as_mut() {
                    stp.on_bpdu(iface, bpdu, net, sched);
                }
            }
            return;
        }

        let mut services = [SwitchService::Stp];
        let flag = net.handled_notifies_rest;
        let suppressed = hook::dispatch(&mut services, flag, |s| match s {
            SwitchService::Stp => match (&frame.payload, self.stp.as_mut()) {
                (FramePayload::Bpdu(bpdu), Some(stp)) => {
                    stp.on_bpdu(iface, bpdu, net, sched);
                    Verdict::Handled
                }
                _ => Verdict::Continue,
            },
        });
        if suppressed {
            return;
        }

        // 学习（Learning 与 Forwarding 都学）
        if let Some(src) = frame.src {
            let now_ms = sched.delta_ms();
            self.mac_table.insert(src, (iface, now_ms));
        }
        if state == PortState::Learning {
            return;
        }
        self.forward(iface, &frame, vlan, sched, net);
    }

    fn resolve_route(&self, _net: &Network, _dst: &IPAddress) -> Option<(IfaceId, IPAddress)> {
        // 链路层设备不选路
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
