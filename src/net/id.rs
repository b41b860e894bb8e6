//! 标识符类型
//!
//! 节点、接口、链路都放在索引式 arena 里，用稳定整数句柄引用，
//! 避免 Interface↔Link、Node↔Interface 的所有权环。

/// 节点标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// 接口标识符（全局 arena 下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IfaceId(pub usize);

/// 链路标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub usize);
