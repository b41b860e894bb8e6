//! 世界 trait
//!
//! 定义仿真世界接口。

use super::scheduler::Scheduler;
use super::timer::TimerKey;
use std::any::Any;

/// 仿真世界：由业务层实现（例如网络拓扑/统计等）。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// 周期定时器触发（ARP/MAC 老化、生成树 hello 等）。
    fn on_timer(&mut self, _key: TimerKey, _sched: &mut Scheduler) {}
}
