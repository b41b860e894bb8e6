//! 周期定时器
//!
//! 以键标识的周期任务。每个键同一时刻最多只有一个活动定时器：
//! 代数（generation）不匹配的旧触发会被直接丢弃。

use super::event::Event;
use super::scheduler::Scheduler;
use super::world::World;
use crate::net::{IfaceId, NodeId};
use tracing::trace;

/// 周期任务的逻辑槽位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// ARP 表老化清扫（每网络接口）
    ArpSweep(IfaceId),
    /// IPv4 重组缓冲老化清扫（每网络接口）
    FragSweep(IfaceId),
    /// MAC 学习表老化清扫（每交换机）
    MacSweep(NodeId),
    /// 生成树 hello 广播（每交换机）
    StpHello(NodeId),
    /// DHCP 租约/预留过期清扫（每服务器）
    DhcpSweep(NodeId),
}

/// 事件：周期定时器触发一次。
pub struct RepeatTick {
    pub(crate) key: TimerKey,
    pub(crate) generation: u64,
}

impl Event for RepeatTick {
    fn execute(self: Box<Self>, sched: &mut Scheduler, world: &mut dyn World) {
        let RepeatTick { key, generation } = *self;
        if !sched.repeat_advance(key, generation) {
            trace!(?key, generation, "过期的周期触发，丢弃");
            return;
        }
        world.on_timer(key, sched);
    }
}
