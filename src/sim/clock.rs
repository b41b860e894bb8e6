//! 虚拟时钟
//!
//! 把仿真时间线映射到"模拟经过时间"。速度档位带两个独立倍率：
//! 光速倍率（作用于传播时延与一切固定的真实世界时延常量）和
//! 传输倍率（作用于与报文长度/链路速率相关的传输时延）。

use super::time::SimTime;

/// 速度档位。倍率是固定命名值，不可由用户调节。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Speed {
    /// 暂停：两个倍率都为 0，时间冻结
    Paused,
    /// 慢放：光速 /10，传输 /100000
    Slower,
    /// 实时
    #[default]
    RealTime,
    /// 快进：光速 x10，传输 x100000
    Faster,
}

impl Speed {
    /// 光速倍率
    pub fn light(self) -> f64 {
        match self {
            Speed::Paused => 0.0,
            Speed::Slower => 0.1,
            Speed::RealTime => 1.0,
            Speed::Faster => 10.0,
        }
    }

    /// 传输倍率
    pub fn transmission(self) -> f64 {
        match self {
            Speed::Paused => 0.0,
            Speed::Slower => 1e-5,
            Speed::RealTime => 1.0,
            Speed::Faster => 1e5,
        }
    }
}

/// 虚拟时钟：纪元 + 累计值，保证变速瞬间模拟经过时间连续。
#[derive(Debug, Default)]
pub struct Clock {
    speed: Speed,
    epoch: SimTime,
    acc_ms: f64,
}

impl Clock {
    pub fn speed(&self) -> Speed {
        self.speed
    }

    /// 变速：把旧速率下的经过时间折入累计值，重置纪元。
    /// Paused 冻结经过时间（light = 0 自然实现）。
    pub(crate) fn set_speed(&mut self, now: SimTime, speed: Speed) {
        self.acc_ms += self.segment_ms(now);
        self.epoch = now;
        self.speed = speed;
    }

    /// 当前模拟经过时间（毫秒）。除变速瞬间的纪元平移外单调。
    pub fn delta_ms(&self, now: SimTime) -> f64 {
        self.acc_ms + self.segment_ms(now)
    }

    fn segment_ms(&self, now: SimTime) -> f64 {
        now.saturating_sub(self.epoch).0 as f64 / 1e6 * self.speed.light()
    }

    /// 把模型秒数换算为光速倍率下的时间线时延。Paused 返回 None（永不触发）。
    pub fn light_delay(&self, secs: f64) -> Option<SimTime> {
        let m = self.speed.light();
        if m == 0.0 {
            return None;
        }
        Some(SimTime::from_secs_f64(secs / m))
    }

    /// 把模型秒数换算为传输倍率下的时间线时延。Paused 返回 None。
    pub fn transmission_delay(&self, secs: f64) -> Option<SimTime> {
        let m = self.speed.transmission();
        if m == 0.0 {
            return None;
        }
        Some(SimTime::from_secs_f64(secs / m))
    }
}
