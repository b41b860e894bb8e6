//! 监听器链（hook chain）
//!
//! 统一的有序监听器调用机制：协议模块（ARP、自协商、生成树、DHCP、
//! 分片重组）借此在默认转发逻辑之前拦截/否决一个报文。
//! 另有一条通用的节点/接口生命周期事件通道，订阅者回调同样受
//! 三态短路返回值约束。

use crate::net::{IfaceId, NodeId};

/// 链上每个监听器的三态裁决。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    /// 交给下一个监听器；全部放行则执行默认动作
    #[default]
    Continue,
    /// 已处理：抑制默认动作。是否继续通知后续监听器由调用方旗标决定
    /// （观察到的实现是不再通知，见 `dispatch` 的 `handled_notifies_rest`）
    Handled,
    /// 立即停止：不再通知任何监听器，抑制默认动作
    Stop,
}

/// 有序调用一串监听器。
///
/// 返回 true 表示默认动作被抑制。`handled_notifies_rest` 为 true 时，
/// `Handled` 仍继续通知后续监听器（文档化的另一种契约读法），
/// 但默认动作一样被抑制。
pub fn dispatch<L>(
    listeners: &mut [L],
    handled_notifies_rest: bool,
    mut call: impl FnMut(&mut L) -> Verdict,
) -> bool {
    let mut suppressed = false;
    for l in listeners.iter_mut() {
        match call(l) {
            Verdict::Continue => {}
            Verdict::Handled => {
                suppressed = true;
                if !handled_notifies_rest {
                    break;
                }
            }
            Verdict::Stop => {
                suppressed = true;
                break;
            }
        }
    }
    suppressed
}

/// 接口生命周期事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfaceEvent {
    Added,
    Up,
    Down,
    Changed,
}

/// 生命周期事件订阅者回调。
pub type IfaceEventFn = Box<dyn FnMut(NodeId, IfaceId, IfaceEvent) -> Verdict + Send>;

/// 生命周期事件通道：按注册顺序通知，三态短路。
#[derive(Default)]
pub struct IfaceEventBus {
    subscribers: Vec<IfaceEventFn>,
}

impl IfaceEventBus {
    pub fn subscribe(&mut self, f: IfaceEventFn) {
        self.subscribers.push(f);
    }

    /// 通知全体订阅者；返回 true 表示某个订阅者抑制了默认动作。
    pub fn emit(&mut self, node: NodeId, iface: IfaceId, event: IfaceEvent) -> bool {
        dispatch(&mut self.subscribers, false, |f| f(node, iface, event))
    }
}

impl std::fmt::Debug for IfaceEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IfaceEventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
