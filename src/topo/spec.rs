//! 拓扑描述导入
//!
//! JSON 描述 → 完整网络：节点、接口（含地址/VLAN/速率）、链路、
//! 静态路由、DHCP 地址池、生成树开关。接口按 `节点名:接口名` 引用
//! （接口名里有 `/`，所以分隔符用冒号）。

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::addr::IPAddress;
use crate::error::SimError;
use crate::net::{IfaceId, NetWorld, NodeId, PortKind, VlanConfig, VlanMode};
use crate::node::RouterHost;
use crate::proto::DhcpPool;
use crate::sim::Scheduler;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySpec {
    pub schema_version: u32,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeKindSpec {
    Switch,
    Router,
    Server,
    Computer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    pub kind: NodeKindSpec,
    #[serde(default)]
    pub ifaces: Vec<IfaceSpec>,
    /// 终端主机的默认网关
    #[serde(default)]
    pub gateway: Option<String>,
    /// 路由器的静态路由
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
    /// 交换机是否开启生成树
    #[serde(default)]
    pub stp: bool,
    /// 路由器挂载的 DHCP 地址池
    #[serde(default)]
    pub dhcp_pools: Vec<PoolSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfaceSpec {
    /// 端口类型（`GigabitEthernet` 等）
    pub port: String,
    #[serde(default)]
    pub address: Option<String>,
    /// 缺省按地址类别推导
    #[serde(default)]
    pub mask: Option<String>,
    #[serde(default)]
    pub speed: Option<u64>,
    #[serde(default)]
    pub vlan: Option<VlanSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VlanSpec {
    pub mode: VlanModeSpec,
    #[serde(default)]
    pub vlans: Vec<u16>,
    #[serde(default)]
    pub native: Option<u16>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VlanModeSpec {
    Access,
    Trunk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSpec {
    pub network: String,
    pub mask: String,
    pub gateway: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSpec {
    pub gateway: String,
    pub mask: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSpec {
    /// `节点名:接口名`
    pub a: String,
    pub b: String,
    #[serde(default = "default_length_m")]
    pub length_m: f64,
}

fn default_length_m() -> f64 {
    10.0
}

/// 导入结果：节点名到句柄的索引。
#[derive(Debug, Default)]
pub struct TopologyIndex {
    names: HashMap<String, NodeId>,
}

impl TopologyIndex {
    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// 按 `节点名:接口名` 取接口句柄。
    pub fn iface(&self, world: &NetWorld, endpoint: &str) -> Option<IfaceId> {
        let (node, iface) = endpoint.split_once(':')?;
        world.net.iface_by_name(self.node(node)?, iface)
    }
}

fn parse_mask_or_default(mask: &Option<String>, addr: &IPAddress) -> Result<IPAddress, SimError> {
    match mask {
        Some(m) => IPAddress::parse_mask(m),
        None => Ok(addr.generate_mask()),
    }
}

/// 按描述搭建整个网络，最后注册全部老化清扫定时器。
pub fn build(
    world: &mut NetWorld,
    sched: &mut Scheduler,
    spec: &TopologySpec,
) -> Result<TopologyIndex, SimError> {
    let mut index = TopologyIndex::default();

    for node_spec in &spec.nodes {
        let id = match node_spec.kind {
            NodeKindSpec::Switch => world.net.add_switch(node_spec.name.clone()),
            NodeKindSpec::Router => world.net.add_router(node_spec.name.clone()),
            NodeKindSpec::Server => world.net.add_server(node_spec.name.clone()),
            NodeKindSpec::Computer => world.net.add_computer(node_spec.name.clone()),
        };
        index.names.insert(node_spec.name.clone(), id);

        for iface_spec in &node_spec.ifaces {
            let kind = PortKind::parse(&iface_spec.port)?;
            let iface = world.net.add_iface(id, kind);
            if let Some(speed) = iface_spec.speed {
                world.net.set_speed(sched, iface, speed)?;
            }
            if let Some(vlan) = &iface_spec.vlan {
                let mut vlans: BTreeSet<u16> = vlan.vlans.iter().copied().collect();
                if vlans.is_empty() {
                    vlans.insert(0);
                }
                let native = vlan
                    .native
                    .or_else(|| vlans.iter().next().copied())
                    .unwrap_or(0);
                let mode = match vlan.mode {
                    VlanModeSpec::Access => VlanMode::Access,
                    VlanModeSpec::Trunk => VlanMode::Trunk,
                };
                world.net.set_vlan(iface, VlanConfig { mode, vlans, native })?;
            }
            if let Some(addr) = &iface_spec.address {
                let addr = IPAddress::parse(addr)?;
                let mask = parse_mask_or_default(&iface_spec.mask, &addr)?;
                world.net.set_net_address(iface, addr, mask)?;
            }
        }

        if let Some(gw) = &node_spec.gateway {
            let gw = IPAddress::parse(gw)?;
            world.net.set_gateway(id, gw);
        }
        for route in &node_spec.routes {
            world.net.add_route(
                id,
                IPAddress::parse(&route.network)?,
                IPAddress::parse_mask(&route.mask)?,
                IPAddress::parse(&route.gateway)?,
            )?;
        }
        for pool in &node_spec.dhcp_pools {
            let pool = DhcpPool::new(
                IPAddress::parse(&pool.gateway)?,
                IPAddress::parse_mask(&pool.mask)?,
                IPAddress::parse(&pool.start)?,
                IPAddress::parse(&pool.end)?,
            )?;
            let router = world
                .net
                .node_mut(id)
                .and_then(|n| n.as_any_mut().downcast_mut::<RouterHost>())
                .ok_or_else(|| SimError::UnknownTopologyRef(node_spec.name.clone()))?;
            router.dhcp_mut().add_pool(pool);
        }
    }

    for link in &spec.links {
        let a = index
            .iface(world, &link.a)
            .ok_or_else(|| SimError::UnknownTopologyRef(link.a.clone()))?;
        let b = index
            .iface(world, &link.b)
            .ok_or_else(|| SimError::UnknownTopologyRef(link.b.clone()))?;
        world.net.connect(sched, a, b, link.length_m)?;
    }

    // 生成树开在链路接好之后，端口一入栈就能学到真实邻居
    for node_spec in &spec.nodes {
        if node_spec.stp {
            let id = index
                .node(&node_spec.name)
                .ok_or_else(|| SimError::UnknownTopologyRef(node_spec.name.clone()))?;
            world.net.enable_stp(sched, id);
        }
    }

    world.net.start_sweeps(sched);
    info!(
        nodes = spec.nodes.len(),
        links = spec.links.len(),
        "🗺️  拓扑导入完成"
    );
    Ok(index)
}
