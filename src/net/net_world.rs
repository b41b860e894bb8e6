//! 仿真世界实现
//!
//! 把 `Network` 接进调度器：事件经 `as_any_mut` 下转拿到网络，
//! 周期定时器统一转给 `Network::handle_timer`。

use std::any::Any;

use super::network::Network;
use crate::sim::{Scheduler, TimerKey, World};

/// 网络仿真世界。
#[derive(Default)]
pub struct NetWorld {
    pub net: Network,
}

impl NetWorld {
    pub fn new(net: Network) -> Self {
        NetWorld { net }
    }
}

impl World for NetWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_timer(&mut self, key: TimerKey, sched: &mut Scheduler) {
        self.net.handle_timer(key, sched);
    }
}
