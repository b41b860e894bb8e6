//! 常用拓扑的程序化构建

use crate::addr::IPAddress;
use crate::error::SimError;
use crate::net::{IfaceId, NetWorld, NodeId, PortKind};
use crate::node::RouterHost;
use crate::proto::DhcpPool;
use crate::sim::Scheduler;

/// 办公室局域网的配置选项。
#[derive(Debug, Clone)]
pub struct OfficeLanOpts {
    pub computers: usize,
    pub link_length_m: f64,
    pub port_kind: PortKind,
}

impl Default for OfficeLanOpts {
    fn default() -> Self {
        Self {
            computers: 2,
            link_length_m: 10.0,
            port_kind: PortKind::FastEthernet,
        }
    }
}

/// 办公室局域网的节点句柄。
#[derive(Debug)]
pub struct OfficeLan {
    pub switch: NodeId,
    pub server: NodeId,
    pub server_ip: IPAddress,
    pub computers: Vec<(NodeId, IPAddress)>,
}

/// 构建单交换机局域网
///
/// 拓扑结构：server <-> switch <-> c0..cN
/// 地址：192.168.1.0/24，服务器 .2，计算机从 .10 起。
pub fn build_office_lan(
    world: &mut NetWorld,
    sched: &mut Scheduler,
    opts: &OfficeLanOpts,
) -> Result<OfficeLan, SimError> {
    let mask = IPAddress::parse_mask("255.255.255.0")?;
    let base = IPAddress::parse("192.168.1.0")?;

    let switch = world.net.add_switch("switch0");
    let server = world.net.add_server("server0");
    let server_ip = base.add(2);

    let mut wire = |world: &mut NetWorld, sched: &mut Scheduler, host: NodeId| {
        let sw_port = world.net.add_iface(switch, opts.port_kind);
        let host_port = world.net.add_iface(host, opts.port_kind);
        world
            .net
            .connect(sched, sw_port, host_port, opts.link_length_m)
            .map(|_| host_port)
    };

    let server_port = wire(world, sched, server)?;
    world.net.set_net_address(server_port, server_ip, mask)?;

    let mut computers = Vec::with_capacity(opts.computers);
    for i in 0..opts.computers {
        let c = world.net.add_computer(format!("c{i}"));
        let port = wire(world, sched, c)?;
        let ip = base.add(10 + i as u32);
        world.net.set_net_address(port, ip, mask)?;
        computers.push((c, ip));
    }

    world.net.start_sweeps(sched);
    Ok(OfficeLan {
        switch,
        server,
        server_ip,
        computers,
    })
}

/// 双子网园区网的节点句柄。
#[derive(Debug)]
pub struct CampusNet {
    pub router: NodeId,
    pub left_switch: NodeId,
    pub right_switch: NodeId,
    pub left_host: NodeId,
    pub right_host: NodeId,
    pub left_host_ip: IPAddress,
    pub right_host_ip: IPAddress,
    /// 右侧一个未配地址的计算机端口，留给 DHCP 演示
    pub dhcp_client: (NodeId, IfaceId),
}

/// 构建双子网园区网
///
/// 拓扑结构：hL <-> swL <-> router <-> swR <-> hR (+ 一台 DHCP 客户机)
/// 地址：左 10.0.1.0/24（网关 .1），右 10.0.2.0/24（网关 .1），
/// 路由器挂右子网的 DHCP 地址池。
pub fn build_routed_campus(
    world: &mut NetWorld,
    sched: &mut Scheduler,
) -> Result<CampusNet, SimError> {
    let mask = IPAddress::parse_mask("255.255.255.0")?;
    let left_gw = IPAddress::parse("10.0.1.1")?;
    let right_gw = IPAddress::parse("10.0.2.1")?;
    let left_host_ip = IPAddress::parse("10.0.1.10")?;
    let right_host_ip = IPAddress::parse("10.0.2.10")?;

    let router = world.net.add_router("router0");
    let left_switch = world.net.add_switch("swL");
    let right_switch = world.net.add_switch("swR");
    let left_host = world.net.add_computer("hL");
    let right_host = world.net.add_computer("hR");
    let dhcp_host = world.net.add_computer("hDhcp");

    let mut wire = |world: &mut NetWorld, sched: &mut Scheduler, a: NodeId, b: NodeId| {
        let pa = world.net.add_iface(a, PortKind::GigabitEthernet);
        let pb = world.net.add_iface(b, PortKind::GigabitEthernet);
        world
            .net
            .connect(sched, pa, pb, 50.0)
            .map(|_| (pa, pb))
    };

    let (router_left, _) = wire(world, sched, router, left_switch)?;
    let (router_right, _) = wire(world, sched, router, right_switch)?;
    let (left_port, _) = wire(world, sched, left_host, left_switch)?;
    let (right_port, _) = wire(world, sched, right_host, right_switch)?;
    let (dhcp_port, _) = wire(world, sched, dhcp_host, right_switch)?;

    world.net.set_net_address(router_left, left_gw, mask)?;
    world.net.set_net_address(router_right, right_gw, mask)?;
    world.net.set_net_address(left_port, left_host_ip, mask)?;
    world.net.set_net_address(right_port, right_host_ip, mask)?;
    world.net.set_gateway(left_host, left_gw);
    world.net.set_gateway(right_host, right_gw);

    let pool = DhcpPool::new(
        right_gw,
        mask,
        IPAddress::parse("10.0.2.100")?,
        IPAddress::parse("10.0.2.120")?,
    )?;
    if let Some(r) = world
        .net
        .node_mut(router)
        .and_then(|n| n.as_any_mut().downcast_mut::<RouterHost>())
    {
        r.dhcp_mut().add_pool(pool);
    }

    world.net.start_sweeps(sched);
    Ok(CampusNet {
        router,
        left_switch,
        right_switch,
        left_host,
        right_host,
        left_host_ip,
        right_host_ip,
        dhcp_client: (dhcp_host, dhcp_port),
    })
}
