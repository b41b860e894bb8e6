//! 接口类型
//!
//! arena 里的硬件接口条目：up/down、速率/双工、MAC、可选 VLAN 配置、
//! 可选网络层（L3）状态。一个接口同一时刻至多接一条链路。

use std::collections::{BTreeSet, HashMap};

use super::id::{IfaceId, LinkId, NodeId};
use crate::addr::{IPAddress, MacAddress};
use crate::error::SimError;
use crate::msg::{CodeWord, Frame, Ipv4Packet};

/// 端口类型，决定命名前缀与速率能力。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    GigabitEthernet,
    FastEthernet,
    Ethernet,
    Serial,
    Modem,
}

impl PortKind {
    /// 接口命名前缀（拓扑导入约定）。
    pub fn prefix(self) -> &'static str {
        match self {
            PortKind::GigabitEthernet => "GigabitEthernet",
            PortKind::FastEthernet => "FastEthernet",
            PortKind::Ethernet => "Ethernet",
            PortKind::Serial => "Serial",
            PortKind::Modem => "Modem",
        }
    }

    /// 从拓扑描述的端口类型字符串解析；未知类型硬失败。
    pub fn parse(s: &str) -> Result<PortKind, SimError> {
        match s {
            "GigabitEthernet" => Ok(PortKind::GigabitEthernet),
            "FastEthernet" => Ok(PortKind::FastEthernet),
            "Ethernet" => Ok(PortKind::Ethernet),
            "Serial" => Ok(PortKind::Serial),
            "Modem" => Ok(PortKind::Modem),
            other => Err(SimError::UnknownPortKind(other.to_string())),
        }
    }

    /// (最小速率, 最大速率, 支持全双工, 默认开自协商)，速率单位 Mbps。
    pub fn capabilities(self) -> (u64, u64, bool, bool) {
        match self {
            PortKind::GigabitEthernet => (10, 1000, true, true),
            PortKind::FastEthernet => (10, 100, true, true),
            PortKind::Ethernet => (10, 10, false, false),
            PortKind::Serial => (1, 1, false, false),
            PortKind::Modem => (1, 1, false, false),
        }
    }
}

/// VLAN 端口模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VlanMode {
    Access,
    Trunk,
}

/// 802.1Q 配置。
#[derive(Debug, Clone)]
pub struct VlanConfig {
    pub mode: VlanMode,
    /// 成员 VLAN 集合（access 模式下视作单元素集）
    pub vlans: BTreeSet<u16>,
    /// trunk 的 native VLAN（未打 tag 的入帧归入它）
    pub native: u16,
}

impl Default for VlanConfig {
    fn default() -> Self {
        VlanConfig {
            mode: VlanMode::Access,
            vlans: BTreeSet::from([0]),
            native: 0,
        }
    }
}

impl VlanConfig {
    fn first_vlan(&self) -> u16 {
        self.vlans.iter().next().copied().unwrap_or(0)
    }
}

/// ARP 解析器状态（每网络接口一份）。
#[derive(Debug, Default)]
pub struct ArpState {
    /// 网络地址 → (硬件地址, 最近可见时间戳 delta_ms)
    pub table: HashMap<IPAddress, (MacAddress, f64)>,
    /// 解析在途时排队的待发报文
    pub pending: HashMap<IPAddress, Vec<Ipv4Packet>>,
}

/// 分片重组缓冲。
#[derive(Debug)]
pub struct ReassemblyBuf {
    /// 按偏移升序保存的 (offset, payload_len)
    pub spans: Vec<(u32, u32)>,
    /// 首片带来的完整载荷
    pub head: Option<Ipv4Packet>,
    /// 最近收到的片的 more_fragments
    pub last_more: bool,
    pub created_ms: f64,
}

/// 网络层状态（NetworkInterface：与硬件接口一比一组合）。
#[derive(Debug, Default)]
pub struct L3 {
    /// (地址, 掩码) 对，可持有多个
    pub addrs: Vec<(IPAddress, IPAddress)>,
    pub arp: ArpState,
    /// (来源地址, identification) → 重组缓冲
    pub reassembly: HashMap<(IPAddress, u16), ReassemblyBuf>,
}

impl L3 {
    pub fn holds(&self, addr: &IPAddress) -> bool {
        self.addrs.iter().any(|(a, _)| a == addr)
    }
}

/// 自协商进行中的接收页序列。
#[derive(Debug, Default)]
pub struct AutonegRx {
    pub pages: Vec<CodeWord>,
}

/// 硬件接口。
#[derive(Debug)]
pub struct Iface {
    pub id: IfaceId,
    pub owner: NodeId,
    pub name: String,
    pub kind: PortKind,
    pub up: bool,
    pub mac: MacAddress,
    /// 当前生效速率（Mbps）
    pub speed: u64,
    pub min_speed: u64,
    pub max_speed: u64,
    /// 当前双工（true = 全双工）
    pub duplex: bool,
    pub duplex_capable: bool,
    /// 自协商开关；speed = 0 的设置语义依赖它
    pub autoneg: bool,
    pub(crate) autoneg_rx: AutonegRx,
    pub vlan: Option<VlanConfig>,
    pub link: Option<LinkId>,
    pub l3: Option<L3>,
}

impl Iface {
    pub fn new(id: IfaceId, owner: NodeId, name: String, kind: PortKind, mac: MacAddress) -> Self {
        let (min, max, duplex_capable, autoneg) = kind.capabilities();
        Iface {
            id,
            owner,
            name,
            kind,
            up: true,
            mac,
            speed: min,
            min_speed: min,
            max_speed: max,
            duplex: false,
            duplex_capable,
            autoneg,
            autoneg_rx: AutonegRx::default(),
            vlan: None,
            link: None,
            l3: None,
        }
    }

    /// 设定速率。
    ///
    /// 0 是"重新自协商"的哨兵值，仅在自协商开启时合法，生效速率回落到
    /// 最小值等待协商结果。其余取值要求 min ≤ s ≤ max 且为 1 或 10 的倍数。
    pub fn set_speed(&mut self, speed: u64) -> Result<(), SimError> {
        if speed == 0 {
            if !self.autoneg {
                return Err(SimError::SpeedOutOfRange {
                    speed,
                    min: self.min_speed,
                    max: self.max_speed,
                });
            }
            self.speed = self.min_speed;
            return Ok(());
        }
        let quantized = speed == 1 || speed % 10 == 0;
        if speed < self.min_speed || speed > self.max_speed || !quantized {
            return Err(SimError::SpeedOutOfRange {
                speed,
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        self.speed = speed;
        Ok(())
    }

    /// 设定双工。半双工能力的接口拒绝全双工。
    pub fn set_duplex(&mut self, full: bool) -> Result<(), SimError> {
        if full && !self.duplex_capable {
            return Err(SimError::UnsupportedDuplex(self.name.clone()));
        }
        self.duplex = full;
        Ok(())
    }

    /// 网络层配置（第一次调用时创建）。
    pub fn l3_mut(&mut self) -> &mut L3 {
        self.l3.get_or_insert_with(L3::default)
    }

    /// 添加 (地址, 掩码)；重复地址报错。
    pub fn add_net_address(&mut self, addr: IPAddress, mask: IPAddress) -> Result<(), SimError> {
        let l3 = self.l3_mut();
        if l3.holds(&addr) {
            return Err(SimError::DuplicateAddress(addr));
        }
        l3.addrs.push((addr, mask));
        Ok(())
    }

    /// 入方向 VLAN 判定：返回帧的生效 VLAN，None 表示拒收。
    pub fn ingress_vlan(&self, frame: &Frame) -> Option<u16> {
        match (&self.vlan, frame.tag) {
            // 普通以太网口：未打 tag 归入 VLAN 0，打了非 0 tag 的拒收
            (None, None) => Some(0),
            (None, Some(tag)) => (tag == 0).then_some(0),
            (Some(cfg), None) => match cfg.mode {
                VlanMode::Access => Some(cfg.first_vlan()),
                VlanMode::Trunk => Some(cfg.native),
            },
            (Some(cfg), Some(tag)) => cfg.vlans.contains(&tag).then_some(tag),
        }
    }

    /// 出方向 VLAN 变换：按端口模式打/去 tag，不允许的 VLAN 返回 None。
    pub fn egress_frame(&self, frame: &Frame, vlan: u16) -> Option<Frame> {
        match &self.vlan {
            None => (vlan == 0).then(|| frame.retagged(None)),
            Some(cfg) => {
                if !cfg.vlans.contains(&vlan) {
                    return None;
                }
                match cfg.mode {
                    // access 口去 tag 发送
                    VlanMode::Access => Some(frame.retagged(None)),
                    // trunk 口保留已有 tag，否则打上本口第一个 VLAN
                    VlanMode::Trunk => {
                        let tag = frame.tag.unwrap_or_else(|| cfg.first_vlan());
                        Some(frame.retagged(Some(tag)))
                    }
                }
            }
        }
    }
}
