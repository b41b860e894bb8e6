//! 拓扑构建
//!
//! 两条路：`spec` 从 JSON 描述（serde）导入整个网络，
//! `lan` 提供常用拓扑的程序化构建函数。

pub mod lan;
pub mod spec;

pub use lan::{build_office_lan, build_routed_campus, CampusNet, OfficeLan, OfficeLanOpts};
pub use spec::{build, IfaceSpec, LinkSpec, NodeKindSpec, NodeSpec, TopologyIndex, TopologySpec};
