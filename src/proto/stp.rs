//! 生成树（PVST 风格，简化）
//!
//! 每台交换机一份服务。所有端口初始为"指定 + 阻塞"、假定自己是根；
//! 周期 hello 广播 {桥 id, 根 id, 路径开销, 端口 id, 报文年龄}。
//! 收到对端通告时：对端根 (priority, MAC) 字典序更小则改认其为根；
//! 逐端口记录最小通告开销；开销最小的端口为 Root，其余按本端/对端
//! 桥 MAC 比较定 Designated 或 Blocked。端口状态机
//! Blocking→Listening→Learning→Forwarding 逐级由驻留定时器推进，
//! 角色降级为 Blocked 时退回 Blocking。同一端口同一时刻只有一个
//! 活动驻留定时器（代数保护）。对端信息在 hello 周期按最大年龄
//! 老化：超龄端口清空记录，全部视图失效后重新自认为根。

use std::collections::HashMap;

use crate::addr::MacAddress;
use crate::msg::{Bpdu, Frame, FramePayload};
use crate::net::{IfaceId, Network, NodeId, TraceEvent};
use crate::sim::{Event, Scheduler, TimerKey, World};
use tracing::{debug, info, trace};

/// hello 周期（模型秒）。
pub const HELLO_SECS: f64 = 2.0;
/// 端口状态驻留时长（模型秒）。
pub const FORWARD_DELAY_SECS: f64 = 15.0;
/// 根信息最大年龄（模型秒）。
pub const MAX_AGE_SECS: f64 = 20.0;

/// 端口角色。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortRole {
    Root,
    Designated,
    Blocked,
}

/// 端口状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortState {
    Blocking,
    Listening,
    Learning,
    Forwarding,
}

#[derive(Debug)]
struct StpPort {
    role: PortRole,
    state: PortState,
    /// 本端口收到的最小根路径开销（含入端口一跳）
    cost: Option<u32>,
    /// 本端口上对端声称的桥 id
    peer_bridge: Option<(u16, MacAddress)>,
    /// 最近一次收到 BPDU 的时间戳（delta_ms），最大年龄老化用
    last_bpdu_ms: Option<f64>,
    /// 驻留定时器代数；角色变化时递增使旧定时器作废
    generation: u64,
}

impl StpPort {
    fn new() -> Self {
        StpPort {
            role: PortRole::Designated,
            state: PortState::Blocking,
            cost: None,
            peer_bridge: None,
            last_bpdu_ms: None,
            generation: 0,
        }
    }
}

/// 每交换机生成树状态。
#[derive(Debug)]
pub struct StpService {
    node: NodeId,
    bridge_priority: u16,
    bridge_mac: MacAddress,
    root_priority: u16,
    root_mac: MacAddress,
    root_cost: u32,
    ports: HashMap<IfaceId, StpPort>,
}

impl StpService {
    /// 创建服务：桥 MAC 取全部端口 MAC 的最小值，初始自认为根。
    pub fn new(node: NodeId, bridge_mac: MacAddress) -> Self {
        StpService {
            node,
            bridge_priority: 32768,
            bridge_mac,
            root_priority: 32768,
            root_mac: bridge_mac,
            root_cost: 0,
            ports: HashMap::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        (self.root_priority, self.root_mac) == self.bridge_id()
    }

    fn bridge_id(&self) -> (u16, MacAddress) {
        (self.bridge_priority, self.bridge_mac)
    }

    /// 端口状态；未纳入生成树的端口视作转发。
    pub fn port_state(&self, iface: IfaceId) -> PortState {
        self.ports
            .get(&iface)
            .map(|p| p.state)
            .unwrap_or(PortState::Forwarding)
    }

    pub fn port_role(&self, iface: IfaceId) -> Option<PortRole> {
        self.ports.get(&iface).map(|p| p.role)
    }

    /// 纳入一个端口并启动其状态机（初始 Designated/Blocking）。
    pub fn enroll_port(&mut self, iface: IfaceId, sched: &mut Scheduler) {
        self.ports.insert(iface, StpPort::new());
        self.arm_dwell(iface, sched);
    }

    fn arm_dwell(&mut self, iface: IfaceId, sched: &mut Scheduler) {
        let port = self.ports.get_mut(&iface).expect("port enrolled");
        port.generation = port.generation.wrapping_add(1);
        let generation = port.generation;
        let node = self.node;
        sched.once(
            FORWARD_DELAY_SECS,
            StpDwell {
                node,
                iface,
                generation,
            },
        );
    }

    /// 驻留定时器到期：推进一级，未到 Forwarding 则续排。
    pub fn on_dwell(&mut self, iface: IfaceId, generation: u64, sched: &mut Scheduler) {
        let Some(port) = self.ports.get_mut(&iface) else {
            return;
        };
        if port.generation != generation || port.role == PortRole::Blocked {
            trace!(?iface, generation, "过期驻留定时器，丢弃");
            return;
        }
        let next = match port.state {
            PortState::Blocking => PortState::Listening,
            PortState::Listening => PortState::Learning,
            PortState::Learning | PortState::Forwarding => PortState::Forwarding,
        };
        debug!(?iface, from = ?port.state, to = ?next, "生成树端口状态推进");
        port.state = next;
        if next != PortState::Forwarding {
            // 继续驻留到下一级；不走 arm_dwell 以免作废自己
            let generation = port.generation;
            let node = self.node;
            sched.once(
                FORWARD_DELAY_SECS,
                StpDwell {
                    node,
                    iface,
                    generation,
                },
            );
        }
    }

    /// hello 定时器：先按最大年龄清掉久未刷新的对端信息，
    /// 再把当前根视图广播到所有纳管端口。
    pub fn on_hello(&mut self, net: &mut Network, sched: &mut Scheduler) {
        let now_ms = sched.delta_ms();
        let mut expired = false;
        for port in self.ports.values_mut() {
            if let Some(last) = port.last_bpdu_ms {
                if now_ms - last >= MAX_AGE_SECS * 1000.0 {
                    port.cost = None;
                    port.peer_bridge = None;
                    port.last_bpdu_ms = None;
                    expired = true;
                }
            }
        }
        if expired {
            debug!(node = ?self.node, "对端信息超龄，重新自认为根");
            self.root_priority = self.bridge_priority;
            self.root_mac = self.bridge_mac;
            self.root_cost = 0;
            self.recompute_roles(net, sched);
        }

        let ports: Vec<IfaceId> = self.ports.keys().copied().collect();
        for iface in ports {
            let ifc = net.iface(iface);
            if !ifc.up || ifc.link.is_none() {
                continue;
            }
            let src = ifc.mac;
            let bpdu = Bpdu {
                root_priority: self.root_priority,
                root_mac: self.root_mac,
                bridge_priority: self.bridge_priority,
                bridge_mac: self.bridge_mac,
                root_cost: self.root_cost,
                port_id: iface.0 as u16,
                // 每跳重新生成一次，离根的跳数即年龄
                message_age: self.root_cost as u16,
            };
            let frame = Frame::builder()
                .src(src)
                .dst(MacAddress::BROADCAST)
                .payload(FramePayload::Bpdu(bpdu))
                .build()
                .expect("all fields set");
            let _ = net.send_bits(sched, iface, frame);
        }
    }

    /// 收到对端 BPDU：吸收根信息并重算端口角色。
    pub fn on_bpdu(
        &mut self,
        iface: IfaceId,
        bpdu: &Bpdu,
        net: &mut Network,
        sched: &mut Scheduler,
    ) {
        {
            let port = self.ports.entry(iface).or_insert_with(StpPort::new);
            let advertised = bpdu.root_cost.saturating_add(1);
            port.cost = Some(port.cost.map_or(advertised, |c| c.min(advertised)));
            port.peer_bridge = Some(bpdu.bridge_id());
            port.last_bpdu_ms = Some(sched.delta_ms());
        }
        if bpdu.root_id() < (self.root_priority, self.root_mac) {
            info!(node = ?self.node, new_root = %bpdu.root_mac, "改认新根");
            self.root_priority = bpdu.root_priority;
            self.root_mac = bpdu.root_mac;
        }
        self.recompute_roles(net, sched);
    }

    fn recompute_roles(&mut self, net: &mut Network, sched: &mut Scheduler) {
        let we_are_root = self.is_root();

        // 根端口：到根开销最小的端口（根桥没有根端口，开销为 0）
        let best = if we_are_root {
            None
        } else {
            self.ports
                .iter()
                .filter_map(|(id, p)| p.cost.map(|c| (c, *id)))
                .min()
        };
        let root_port = best.map(|(_, id)| id);
        self.root_cost = best.map(|(c, _)| c).unwrap_or(0);

        let bridge_id = self.bridge_id();
        let mut changed: Vec<(IfaceId, PortRole)> = Vec::new();
        for (&id, port) in self.ports.iter_mut() {
            let new_role = if Some(id) == root_port {
                PortRole::Root
            } else {
                match port.peer_bridge {
                    // 对端桥 id 更小则本端让出，端口转入 Blocked
                    Some(peer) if !we_are_root && peer < bridge_id => PortRole::Blocked,
                    _ => PortRole::Designated,
                }
            };
            if new_role != port.role {
                changed.push((id, new_role));
            }
        }

        for (id, new_role) in changed {
            let role_name = match new_role {
                PortRole::Root => "root",
                PortRole::Designated => "designated",
                PortRole::Blocked => "blocked",
            };
            debug!(node = ?self.node, iface = ?id, role = role_name, "端口角色变化");
            net.trace.record(
                sched.now(),
                TraceEvent::StpRoleChange {
                    node: self.node,
                    iface: id,
                    role: role_name,
                },
            );
            let port = self.ports.get_mut(&id).expect("port listed");
            port.role = new_role;
            // 任何角色变化都从 Blocking 重新驻留；Blocked 停在 Blocking
            port.state = PortState::Blocking;
            port.generation = port.generation.wrapping_add(1);
            if new_role != PortRole::Blocked {
                let generation = port.generation;
                let node = self.node;
                sched.once(
                    FORWARD_DELAY_SECS,
                    StpDwell {
                        node,
                        iface: id,
                        generation,
                    },
                );
            }
        }
    }
}

/// 事件：生成树端口驻留定时器到期。
pub struct StpDwell {
    pub node: NodeId,
    pub iface: IfaceId,
    pub generation: u64,
}

impl Event for StpDwell {
    fn execute(self: Box<Self>, sched: &mut Scheduler, world: &mut dyn World) {
        let StpDwell {
            node,
            iface,
            generation,
        } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<crate::net::NetWorld>()
            .expect("world must be NetWorld");
        w.net.stp_dwell(node, iface, generation, sched);
    }
}

/// hello 定时器的注册助手。
pub fn start_hello(node: NodeId, sched: &mut Scheduler) {
    sched.repeat(TimerKey::StpHello(node), HELLO_SECS);
}
