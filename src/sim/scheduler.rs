//! 调度器
//!
//! 事件驱动调度器：维护当前时间、事件队列与虚拟时钟。
//! 所有链路时延与协议超时都经由这里换算；变速时周期定时器的周期
//! 会立刻按新倍率重算，暂停时把队列整体挂起。

use std::collections::{BinaryHeap, HashMap};

use super::clock::{Clock, Speed};
use super::event::Event;
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use super::timer::{RepeatTick, TimerKey};
use super::world::World;
use tracing::{debug, info, trace};

struct RepeatEntry {
    period_secs: f64,
    generation: u64,
}

/// 暂停期间被挂起的事件。
enum Held {
    /// 已经算好时延、在队列中被冻结的事件（保留剩余时延）
    InFlight {
        remaining: SimTime,
        ev: Box<dyn Event>,
    },
    /// 暂停中新注册、尚未换算时延的一次性事件
    Fresh {
        light_secs: f64,
        tx_secs: f64,
        ev: Box<dyn Event>,
    },
    /// 暂停中新注册的周期定时器，恢复时重新武装
    Repeat(TimerKey, u64),
}

/// 事件驱动调度器。显式作为依赖传递（不做全局单例），便于注入测试时钟。
#[derive(Default)]
pub struct Scheduler {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
    clock: Clock,
    repeats: HashMap<TimerKey, RepeatEntry>,
    held: Vec<Held>,
}

impl Scheduler {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn speed(&self) -> Speed {
        self.clock.speed()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// 当前模拟经过时间（毫秒）。表项老化用它做时间戳。
    pub fn delta_ms(&self) -> f64 {
        self.clock.delta_ms(self.now)
    }

    /// 调度事件在指定时间执行
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) {
        self.push_boxed(at, Box::new(ev));
    }

    fn push_boxed(&mut self, at: SimTime, ev: Box<dyn Event>) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        trace!(now = ?self.now, seq, ?at, "调度事件");
        self.q.push(ScheduledEvent { at, seq, ev });
    }

    /// 一次性定时器：`secs` 模型秒后触发（按光速倍率换算）。
    /// 暂停时挂起，等速度离开 Paused 再武装。
    pub fn once<E: Event>(&mut self, secs: f64, ev: E) {
        self.once_scaled(secs, 0.0, ev);
    }

    /// 一次性定时器，光速分量 + 传输分量分别换算（链路投递用）。
    pub fn once_scaled<E: Event>(&mut self, light_secs: f64, tx_secs: f64, ev: E) {
        match self.scaled_delay(light_secs, tx_secs) {
            Some(delay) => {
                let at = self.now.saturating_add(delay);
                self.push_boxed(at, Box::new(ev));
            }
            None => {
                trace!(light_secs, tx_secs, "暂停中注册一次性事件，挂起");
                self.held.push(Held::Fresh {
                    light_secs,
                    tx_secs,
                    ev: Box::new(ev),
                });
            }
        }
    }

    fn scaled_delay(&self, light_secs: f64, tx_secs: f64) -> Option<SimTime> {
        let l = self.clock.light_delay(light_secs)?;
        let t = self.clock.transmission_delay(tx_secs)?;
        Some(l.saturating_add(t))
    }

    /// 注册（或重启）键控周期定时器。同键旧定时器作废（代数递增）。
    pub fn repeat(&mut self, key: TimerKey, period_secs: f64) {
        let generation = self
            .repeats
            .get(&key)
            .map(|e| e.generation.wrapping_add(1))
            .unwrap_or(0);
        self.repeats.insert(
            key,
            RepeatEntry {
                period_secs,
                generation,
            },
        );
        self.arm_repeat(key, generation, period_secs);
    }

    /// 注销周期定时器。已入队的触发会因查不到键而被丢弃。
    pub fn cancel_repeat(&mut self, key: TimerKey) {
        self.repeats.remove(&key);
    }

    fn arm_repeat(&mut self, key: TimerKey, generation: u64, period_secs: f64) {
        match self.clock.light_delay(period_secs) {
            Some(delay) => {
                let at = self.now.saturating_add(delay);
                self.push_boxed(at, Box::new(RepeatTick { key, generation }));
            }
            None => self.held.push(Held::Repeat(key, generation)),
        }
    }

    /// 周期触发校验：代数匹配则重新武装下一次并返回 true。
    pub(crate) fn repeat_advance(&mut self, key: TimerKey, generation: u64) -> bool {
        let Some(entry) = self.repeats.get(&key) else {
            return false;
        };
        if entry.generation != generation {
            return false;
        }
        let period = entry.period_secs;
        self.arm_repeat(key, generation, period);
        true
    }

    /// 变速。
    ///
    /// - 进入 Paused：冻结时钟并把整个队列挂起（保留剩余时延）。
    /// - 离开 Paused：挂起事件按剩余时延恢复入队。
    /// - 运行中变速：所有周期定时器按新倍率立刻重算下一次触发；
    ///   在途的一次性时延不重算（只有周期定时器承诺随变速刷新）。
    pub fn set_speed(&mut self, speed: Speed) {
        if speed == self.clock.speed() {
            return;
        }
        let was_paused = self.clock.speed() == Speed::Paused;
        info!(from = ?self.clock.speed(), to = ?speed, now = ?self.now, "变速");
        self.clock.set_speed(self.now, speed);

        if speed == Speed::Paused {
            let drained = std::mem::take(&mut self.q);
            for item in drained.into_sorted_vec() {
                self.held.push(Held::InFlight {
                    remaining: item.at.saturating_sub(self.now),
                    ev: item.ev,
                });
            }
            debug!(held = self.held.len(), "队列已挂起");
            return;
        }

        if was_paused {
            let held = std::mem::take(&mut self.held);
            for h in held {
                match h {
                    Held::InFlight { remaining, ev } => {
                        let at = self.now.saturating_add(remaining);
                        self.push_boxed(at, ev);
                    }
                    Held::Fresh {
                        light_secs,
                        tx_secs,
                        ev,
                    } => {
                        let delay = self
                            .scaled_delay(light_secs, tx_secs)
                            .expect("speed is not paused");
                        let at = self.now.saturating_add(delay);
                        self.push_boxed(at, ev);
                    }
                    Held::Repeat(key, generation) => {
                        if let Some(e) = self.repeats.get(&key) {
                            if e.generation == generation {
                                let period = e.period_secs;
                                self.arm_repeat(key, generation, period);
                            }
                        }
                    }
                }
            }
            return;
        }

        // 运行中变速：重算全部周期定时器
        let keys: Vec<(TimerKey, f64)> = self
            .repeats
            .iter()
            .map(|(k, e)| (*k, e.period_secs))
            .collect();
        for (key, period) in keys {
            let entry = self.repeats.get_mut(&key).expect("key just listed");
            entry.generation = entry.generation.wrapping_add(1);
            let generation = entry.generation;
            self.arm_repeat(key, generation, period);
        }
    }

    /// 运行直到事件队列为空或到达 `until`。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        while let Some(top) = self.q.peek() {
            if top.at > until {
                break;
            }
            let item = self.q.pop().expect("peek then pop");
            self.now = item.at;
            item.ev.execute(self, world);
        }
        self.now = self.now.max(until);
    }

    /// 运行所有事件直到队列为空。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) {
        info!("▶️  开始运行仿真");
        let mut event_count = 0u64;
        while let Some(item) = self.q.pop() {
            event_count += 1;
            self.now = item.at;
            trace!(event_num = event_count, now = ?self.now, seq = item.seq, "执行事件");
            item.ev.execute(self, world);
        }
        info!(total_events = event_count, final_time = ?self.now, "✅ 仿真完成");
    }
}
