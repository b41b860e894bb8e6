//! 数据链路层控制报文
//!
//! ARP 载荷、自协商链路码字页、生成树 BPDU。这些都直接装在帧里。

use crate::addr::{IPAddress, MacAddress};

pub const ARP_BYTES: u32 = 28;
pub const CODE_WORD_BYTES: u32 = 2;
pub const BPDU_BYTES: u32 = 35;

/// ARP 操作类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOp {
    Request,
    Reply,
}

/// ARP 载荷。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpPayload {
    pub op: ArpOp,
    pub sender_mac: MacAddress,
    pub sender_ip: IPAddress,
    /// Request 时未知
    pub target_mac: Option<MacAddress>,
    pub target_ip: IPAddress,
}

impl ArpPayload {
    pub fn len_bytes(&self) -> u32 {
        ARP_BYTES
    }
}

// 第 0 页（legacy 10/100）技术位
pub const TECH_10_HALF: u16 = 1 << 0;
pub const TECH_10_FULL: u16 = 1 << 1;
pub const TECH_100_HALF: u16 = 1 << 2;
pub const TECH_100_FULL: u16 = 1 << 3;
// 第 1 页（千兆）技术位
pub const GIG_HALF: u16 = 1 << 0;
pub const GIG_FULL: u16 = 1 << 1;

/// 自协商链路码字页。
///
/// 第 0 页携带 10/100 技术位图，第 1 页携带千兆位图，
/// 用 `next_page` 串联成页序列。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeWord {
    /// 页号：0 = legacy，1 = gigabit
    pub page: u8,
    /// 技术能力位图
    pub techs: u16,
    /// 本端偏好全双工
    pub full_duplex: bool,
    /// 确认标志：携带的是已解析的应答
    pub ack: bool,
    /// 还有下一页
    pub next_page: bool,
}

impl CodeWord {
    pub fn len_bytes(&self) -> u32 {
        CODE_WORD_BYTES
    }
}

/// 生成树桥协议数据单元（简化）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bpdu {
    pub root_priority: u16,
    pub root_mac: MacAddress,
    pub bridge_priority: u16,
    pub bridge_mac: MacAddress,
    /// 发送方到根的路径开销
    pub root_cost: u32,
    pub port_id: u16,
    pub message_age: u16,
}

impl Bpdu {
    pub fn len_bytes(&self) -> u32 {
        BPDU_BYTES
    }

    /// 桥标识 (priority, MAC)，字典序小者优先。
    pub fn root_id(&self) -> (u16, MacAddress) {
        (self.root_priority, self.root_mac)
    }

    pub fn bridge_id(&self) -> (u16, MacAddress) {
        (self.bridge_priority, self.bridge_mac)
    }
}
