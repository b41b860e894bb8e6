//! 投递事件
//!
//! 链路上飞行的比特、回环报文、ping/DHCP 超时都以调度器事件表达。
//! 事件执行时把 `World` 下转成 `NetWorld` 再进入网络逻辑。

use super::id::{IfaceId, NodeId};
use super::net_world::NetWorld;
use crate::msg::{Frame, Ipv4Packet};
use crate::sim::{Event, Scheduler, World};

fn net_of(world: &mut dyn World) -> &mut NetWorld {
    world
        .as_any_mut()
        .downcast_mut::<NetWorld>()
        .expect("world must be NetWorld")
}

/// 事件:一个帧的最后一比特到达链路对端。
pub struct DeliverBits {
    pub iface: IfaceId,
    pub frame: Frame,
}

impl Event for DeliverBits {
    fn execute(self: Box<Self>, sched: &mut Scheduler, world: &mut dyn World) {
        let DeliverBits { iface, frame } = *self;
        let w = net_of(world);
        w.net.deliver_bits(sched, iface, frame);
    }
}

/// 事件:回环报文送达本机网络层。
pub struct DeliverPacket {
    pub node: NodeId,
    pub iface: IfaceId,
    pub pkt: Ipv4Packet,
}

impl Event for DeliverPacket {
    fn execute(self: Box<Self>, sched: &mut Scheduler, world: &mut dyn World) {
        let DeliverPacket { node, iface, pkt } = *self;
        let w = net_of(world);
        w.net.deliver_packet(sched, node, iface, pkt);
    }
}

/// 事件:ping 超时。
pub struct PingTimeout {
    pub ident: u16,
}

impl Event for PingTimeout {
    fn execute(self: Box<Self>, sched: &mut Scheduler, world: &mut dyn World) {
        let w = net_of(world);
        w.net.ping_timeout(sched, self.ident);
    }
}

/// 事件:DHCP 协商超时。
pub struct DhcpTimeout {
    pub xid: u32,
}

impl Event for DhcpTimeout {
    fn execute(self: Box<Self>, _sched: &mut Scheduler, world: &mut dyn World) {
        let w = net_of(world);
        w.net.dhcp_timeout(self.xid);
    }
}
