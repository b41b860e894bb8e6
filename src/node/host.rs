//! 终端主机
//!
//! 服务器与计算机共用同一套终端逻辑（组合一份 `EndHost`，不做继承）：
//! 只收发目的地为本机的报文，不做转发；选路规则是直连子网优先、
//! 否则走默认网关。DHCP 客户端与 ARP 在监听器链上先行拦截。

use std::any::Any;

use super::{IfaceMap, Node, NodeKind};
use crate::addr::{IPAddress, MacAddress};
use crate::hook::{self, Verdict};
use crate::msg::{DhcpOp, Frame, FramePayload, Ipv4Payload};
use crate::net::{IfaceId, Network, NodeId};
use crate::proto::{arp, dhcp};
use crate::sim::Scheduler;
use tracing::trace;

/// 终端主机的监听器链标签。
#[derive(Debug, Clone, Copy)]
enum HostService {
    DhcpClient,
    Arp,
}

/// 终端主机（服务器 / 计算机）。
pub struct EndHost {
    id: NodeId,
    name: String,
    kind: NodeKind,
    ifaces: IfaceMap,
    gateway: Option<IPAddress>,
}

/// 服务器节点。
pub type ServerHost = EndHost;
/// 计算机节点。
pub type ComputerHost = EndHost;

impl EndHost {
    pub fn new(id: NodeId, name: String, kind: NodeKind) -> Self {
        EndHost {
            id,
            name,
            kind,
            ifaces: IfaceMap::default(),
            gateway: None,
        }
    }

    pub fn gateway(&self) -> Option<IPAddress> {
        self.gateway
    }

    pub fn set_gateway(&mut self, gateway: Option<IPAddress>) {
        self.gateway = gateway;
    }
}

impl Node for EndHost {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        self.kind
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
        let _ = vlan;
        let my_mac = net.iface(iface).mac;
        if frame.dst != Some(my_mac) && frame.dst != Some(MacAddress::BROADCAST) {
            return;
        }

        let node = self.id;
        let mut services = [HostService::DhcpClient, HostService::Arp];
        let flag = net.handled_notifies_rest;
        let gateway_slot = &mut self.gateway;
        let suppressed = hook::dispatch(&mut services, flag, |s| match s {
            HostService::DhcpClient => {
                let verdict = dhcp::client_on_frame(net, sched, node, iface, &frame);
                // Ack 带来的默认网关由主机自己装上（租约已结清才生效）
                if let FramePayload::Ipv4(p) = &frame.payload {
                    if let Ipv4Payload::Dhcp(d) = &p.payload {
                        if d.op == DhcpOp::Ack
                            && matches!(net.dhcp_result(d.xid), Some(Some(_)))
                        {
                            if let Some(gw) = d.gateway {
                                *gateway_slot = Some(gw);
                            }
                        }
                    }
                }
                verdict
            }
            HostService::Arp => match &frame.payload {
                FramePayload::Arp(a) => arp::on_frame(net, sched, iface, a),
                _ => Verdict::Continue,
            },
        });
        if suppressed {
            return;
        }

        let FramePayload::Ipv4(pkt) = frame.payload else {
            return;
        };
        if pkt.dst.is_broadcast() || super::holds_addr(net, &self.ifaces, &pkt.dst) {
            super::deliver_local(&*self, net, sched, iface, pkt);
        } else {
            // 终端不做转发
            trace!(node = %self.name, dst = %pkt.dst, "非本机报文，丢弃");
        }
    }

    fn resolve_route(&self, net: &Network, dst: &IPAddress) -> Option<(IfaceId, IPAddress)> {
        if let Some((_, out)) = super::connected_route(net, &self.ifaces, dst) {
            return Some((out, *dst));
        }
        let gw = self.gateway?;
        super::connected_route(net, &self.ifaces, &gw).map(|(_, out)| (out, gw))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
