//! 路由器
//!
//! 网络层转发设备：目的地址非本机持有时查直连子网与静态路由表
//! （最长前缀匹配，直连与静态条目同台比较），TTL 减一后经 ARP
//! 发往下一跳。可选挂载 DHCP 服务，在监听器链上先于转发逻辑拦截。

use std::any::Any;

use super::{IfaceMap, Node, NodeKind};
use crate::addr::{IPAddress, MacAddress};
use crate::hook::{self, Verdict};
use crate::msg::{Frame, FramePayload};
use crate::net::{IfaceId, Network, NodeId};
use crate::proto::{arp, DhcpServer, RoutingTable};
use crate::sim::Scheduler;
use tracing::{debug, trace};

/// 路由器的监听器链标签。
#[derive(Debug, Clone, Copy)]
enum RouterService {
    Dhcp,
    Arp,
}

/// 路由器节点。
pub struct RouterHost {
    id: NodeId,
    name: String,
    ifaces: IfaceMap,
    routing: RoutingTable,
    dhcp: Option<DhcpServer>,
}

impl RouterHost {
    pub fn new(id: NodeId, name: String) -> Self {
        RouterHost {
            id,
            name,
            ifaces: IfaceMap::default(),
            routing: RoutingTable::default(),
            dhcp: None,
        }
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    pub fn routing_mut(&mut self) -> &mut RoutingTable {
        &mut self.routing
    }

    pub fn dhcp(&self) -> Option<&DhcpServer> {
        self.dhcp.as_ref()
    }

    /// DHCP 服务（第一次调用时挂载）。
    pub fn dhcp_mut(&mut self) -> &mut DhcpServer {
        self.dhcp.get_or_insert_with(DhcpServer::default)
    }

    /// 转发一个目的地址非本机的报文。
    fn forward(
        &self,
        pkt: crate::msg::Ipv4Packet,
        sched: &mut Scheduler,
        net: &mut Network,
    ) {
        let Some(forwarded) = pkt.decrement_ttl() else {
            debug!(node = %self.name, dst = %pkt.dst, "TTL 耗尽，丢弃");
            return;
        };
        let Some((out, next_hop)) = self.resolve_route(net, &forwarded.dst) else {
            debug!(node = %self.name, dst = %forwarded.dst, "无路由，丢弃");
            return;
        };
        trace!(node = %self.name, dst = %forwarded.dst, ?out, %next_hop, "转发");
        let _ = arp::enqueue(net, sched, out, next_hop, forwarded);
    }
}

impl Node for RouterHost {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Router
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
        let mut services = [RouterService::Dhcp, RouterService::Arp];
        let flag = net.handled_notifies_rest;
        let dhcp = &mut self.dhcp;
        let suppressed = hook::dispatch(&mut services, flag, |s| match s {
            RouterService::Dhcp => match dhcp.as_mut() {
                Some(srv) => srv.on_frame(node, iface, &frame, sched, net),
                None => Verdict::Continue,
            },
            RouterService::Arp => match &frame.payload {
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
        let local = pkt.dst.is_broadcast() || super::holds_addr(net, &self.ifaces, &pkt.dst);
        if local {
            super::deliver_local(&*self, net, sched, iface, pkt);
        } else {
            self.forward(pkt, sched, net);
        }
    }

    fn resolve_route(&self, net: &Network, dst: &IPAddress) -> Option<(IfaceId, IPAddress)> {
        let connected = super::connected_route(net, &self.ifaces, dst);
        let via_table = self.routing.lookup(dst).and_then(|route| {
            super::connected_route(net, &self.ifaces, &route.gateway)
                .map(|(_, out)| (route.mask.cidr(), out, route.gateway))
        });
        match (connected, via_table) {
            // 同前缀长度时直连优先
            (Some((cc, out)), Some((rc, rout, gw))) => {
                if rc > cc {
                    Some((rout, gw))
                } else {
                    Some((out, *dst))
                }
            }
            (Some((_, out)), None) => Some((out, *dst)),
            (None, Some((_, rout, gw))) => Some((rout, gw)),
            (None, None) => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
