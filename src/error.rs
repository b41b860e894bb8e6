//! 错误类型
//!
//! 定义仿真核心的统一错误枚举。协议层的"无应答"（ARP/ICMP/DHCP 超时）
//! 不属于错误，用 `None` 结果表达。

use crate::addr::IPAddress;

/// 仿真核心错误。
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SimError {
    /// 地址文本格式非法
    #[error("invalid address format: {0}")]
    InvalidAddressFormat(String),

    /// 接口处于 down 状态时尝试收发
    #[error("interface {0} is down")]
    InterfaceDown(String),

    /// 接口已经接在别的链路上
    #[error("interface {0} is already connected")]
    AlreadyConnected(String),

    /// 链路端点非法（自连、端点不属于该链路等）
    #[error("link endpoint mismatch")]
    LinkEndpointMismatch,

    /// 速率超出接口能力范围或未按量化规则取值
    #[error("speed {speed} out of range [{min}, {max}]")]
    SpeedOutOfRange { speed: u64, min: u64, max: u64 },

    /// 接口不支持全双工
    #[error("interface {0} does not support full duplex")]
    UnsupportedDuplex(String),

    /// 接口上已存在该网络地址
    #[error("duplicate address {0}")]
    DuplicateAddress(IPAddress),

    /// 找不到去往目的地址的下一跳
    #[error("no route to {0}")]
    NoRouteFound(IPAddress),

    /// 自协商未找到双方共同支持的速率
    #[error("autonegotiation failed: no common rate")]
    NegotiationFailed,

    /// 构建器缺少必填字段
    #[error("missing builder field: {0}")]
    MissingBuilderField(&'static str),

    /// 发送的 VLAN tag 不在本接口的 VLAN 集合内
    #[error("vlan {0} is not assigned to this interface")]
    InvalidVlanAssignment(u16),

    /// 路由表中不存在该条目
    #[error("route not found")]
    RouteNotFound,

    /// 路由表中已存在该条目
    #[error("route already exists")]
    RouteAlreadyExists,

    /// 拓扑描述中出现未知的端口类型
    #[error("unknown port kind: {0}")]
    UnknownPortKind(String),

    /// 拓扑描述引用了不存在的节点或接口
    #[error("unknown topology reference: {0}")]
    UnknownTopologyRef(String),

    /// DHCP 地址池配置非法（start/end 不在网关所在网络内）
    #[error("dhcp pool range is outside the gateway network")]
    InvalidPool,
}

pub type Result<T> = std::result::Result<T, SimError>;
