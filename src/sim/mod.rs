//! 仿真内核
//!
//! 事件驱动内核：虚拟时钟（带速度倍率）、事件队列与定时器。

mod clock;
mod event;
mod scheduled_event;
mod scheduler;
mod time;
mod timer;
mod world;

pub use clock::{Clock, Speed};
pub use event::Event;
pub use scheduler::Scheduler;
pub use time::SimTime;
pub use timer::{RepeatTick, TimerKey};
pub use world::World;
