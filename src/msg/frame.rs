//! 以太网帧
//!
//! 数据链路层报文：可选 802.1Q tag。MAC 地址对纯物理层控制帧
//! （自协商码字）允许为空，其余帧经构建器强制校验。

use crate::addr::MacAddress;
use crate::error::SimError;
use crate::msg::control::{ArpPayload, Bpdu, CodeWord};
use crate::msg::ipv4::Ipv4Packet;

/// 以太网帧头字节数（目的 + 源 + 类型 + FCS）
pub const ETHERNET_HEADER_BYTES: u32 = 18;
/// 802.1Q 帧头字节数（另加 4 字节 tag）
pub const DOT1Q_HEADER_BYTES: u32 = 22;

/// 帧内载荷（封闭枚举，取代 instanceof 分派）。
#[derive(Debug, Clone, PartialEq)]
pub enum FramePayload {
    Text(String),
    Ipv4(Ipv4Packet),
    Arp(ArpPayload),
    Autoneg(CodeWord),
    Bpdu(Bpdu),
}

impl FramePayload {
    pub fn len_bytes(&self) -> u32 {
        match self {
            FramePayload::Text(s) => s.len() as u32,
            FramePayload::Ipv4(p) => p.len_bytes(),
            FramePayload::Arp(a) => a.len_bytes(),
            FramePayload::Autoneg(c) => c.len_bytes(),
            FramePayload::Bpdu(b) => b.len_bytes(),
        }
    }
}

/// 以太网/802.1Q 帧。构建后不可变（穿越 VLAN 边界时整体重建）。
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub src: Option<MacAddress>,
    pub dst: Option<MacAddress>,
    /// 802.1Q VLAN tag；None 表示未打 tag 的普通以太网帧
    pub tag: Option<u16>,
    pub checksum: u32,
    pub payload: FramePayload,
}

impl Frame {
    pub fn builder() -> FrameBuilder {
        FrameBuilder::default()
    }

    /// 无 MAC 头的物理层控制帧（自协商码字在链路两端点对点传送）。
    pub fn raw(payload: FramePayload) -> Frame {
        let checksum = header_checksum(None, None, None);
        Frame {
            src: None,
            dst: None,
            tag: None,
            checksum,
            payload,
        }
    }

    /// 帧总长：帧头 + 载荷（含内层各层头部）。
    pub fn len_bytes(&self) -> u32 {
        let header = if self.tag.is_some() {
            DOT1Q_HEADER_BYTES
        } else {
            ETHERNET_HEADER_BYTES
        };
        header + self.payload.len_bytes()
    }

    pub fn is_broadcast(&self) -> bool {
        self.dst.map(|m| m.is_broadcast()).unwrap_or(false)
    }

    /// 以新 tag 重建帧（VLAN 打/去 tag 时使用），校验和随之重算。
    pub fn retagged(&self, tag: Option<u16>) -> Frame {
        let checksum = header_checksum(self.src, self.dst, tag);
        Frame {
            src: self.src,
            dst: self.dst,
            tag,
            checksum,
            payload: self.payload.clone(),
        }
    }
}

/// 帧构建器：要求 src/dst/payload 齐备。
#[derive(Debug, Default)]
pub struct FrameBuilder {
    src: Option<MacAddress>,
    dst: Option<MacAddress>,
    tag: Option<u16>,
    payload: Option<FramePayload>,
}

impl FrameBuilder {
    pub fn src(mut self, mac: MacAddress) -> Self {
        self.src = Some(mac);
        self
    }

    pub fn dst(mut self, mac: MacAddress) -> Self {
        self.dst = Some(mac);
        self
    }

    pub fn tag(mut self, vlan: u16) -> Self {
        self.tag = Some(vlan);
        self
    }

    pub fn payload(mut self, payload: FramePayload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn build(self) -> Result<Frame, SimError> {
        let src = self.src.ok_or(SimError::MissingBuilderField("mac_src"))?;
        let dst = self.dst.ok_or(SimError::MissingBuilderField("mac_dst"))?;
        let payload = self
            .payload
            .ok_or(SimError::MissingBuilderField("payload"))?;
        let checksum = header_checksum(Some(src), Some(dst), self.tag);
        Ok(Frame {
            src: Some(src),
            dst: Some(dst),
            tag: self.tag,
            checksum,
            payload,
        })
    }
}

// 与次序无关的加性散列，只演示"校验和"概念，不是真 CRC。
fn header_checksum(src: Option<MacAddress>, dst: Option<MacAddress>, tag: Option<u16>) -> u32 {
    let mut sum: u32 = 0;
    if let Some(m) = src {
        sum = sum.wrapping_add(m.octets().iter().map(|&b| b as u32).sum::<u32>());
    }
    if let Some(m) = dst {
        sum = sum.wrapping_add(m.octets().iter().map(|&b| b as u32).sum::<u32>());
    }
    if let Some(v) = tag {
        sum = sum.wrapping_add(v as u32);
    }
    sum
}
