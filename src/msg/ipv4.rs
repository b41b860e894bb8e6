//! IPv4 报文
//!
//! 网络层报文与分片。载荷是不透明字符串，分片因此是"逻辑长度记账"：
//! 首片携带全部载荷但登记截断后的长度，后续片载荷为空、只登记
//! 消耗的字节数。每片的偏移/总长/more_fragments 标志都是准确的。

use crate::addr::IPAddress;
use crate::error::SimError;
use crate::msg::dhcp::DhcpMessage;
use crate::msg::icmp::IcmpMessage;
use crate::msg::payload::Payload;

pub const IPV4_HEADER_BYTES: u32 = 20;

/// IP 上层协议号（封闭枚举）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProto {
    Icmp,
    Udp,
    /// 不透明文本载荷（实验用协议号）
    Test,
}

/// IPv4 载荷。
#[derive(Debug, Clone, PartialEq)]
pub enum Ipv4Payload {
    Empty,
    Text(Payload),
    Icmp(IcmpMessage),
    Dhcp(DhcpMessage),
}

impl Ipv4Payload {
    pub fn len_bytes(&self) -> u32 {
        match self {
            Ipv4Payload::Empty => 0,
            Ipv4Payload::Text(p) => p.len_bytes(),
            Ipv4Payload::Icmp(m) => m.len_bytes(),
            Ipv4Payload::Dhcp(m) => m.len_bytes(),
        }
    }
}

/// IPv4 报文（或分片）。
#[derive(Debug, Clone, PartialEq)]
pub struct Ipv4Packet {
    pub src: IPAddress,
    pub dst: IPAddress,
    pub ttl: u8,
    pub ident: u16,
    pub more_fragments: bool,
    /// 本片在原始载荷中的字节偏移
    pub fragment_offset: u32,
    /// 本片登记的载荷字节数（逻辑记账，见模块文档）
    pub payload_len: u32,
    /// 整个原始报文的载荷字节数
    pub total_length: u32,
    pub protocol: IpProto,
    pub checksum: u32,
    pub payload: Ipv4Payload,
}

impl Ipv4Packet {
    pub fn builder() -> Ipv4Builder {
        Ipv4Builder::default()
    }

    /// 报文长度：IPv4 头 + 本片登记的载荷字节数。
    pub fn len_bytes(&self) -> u32 {
        IPV4_HEADER_BYTES + self.payload_len
    }

    pub fn is_fragment(&self) -> bool {
        self.more_fragments || self.fragment_offset > 0
    }

    /// TTL 减一后的副本；TTL 已为 0 时返回 None。
    pub fn decrement_ttl(&self) -> Option<Ipv4Packet> {
        if self.ttl == 0 {
            return None;
        }
        let mut p = self.clone();
        p.ttl -= 1;
        Some(p)
    }
}

/// IPv4 构建器：要求 src/dst，其余字段有缺省值。
#[derive(Debug, Default)]
pub struct Ipv4Builder {
    src: Option<IPAddress>,
    dst: Option<IPAddress>,
    ttl: Option<u8>,
    ident: Option<u16>,
    protocol: Option<IpProto>,
    payload: Option<Ipv4Payload>,
}

impl Ipv4Builder {
    pub fn src(mut self, a: IPAddress) -> Self {
        self.src = Some(a);
        self
    }

    pub fn dst(mut self, a: IPAddress) -> Self {
        self.dst = Some(a);
        self
    }

    pub fn ttl(mut self, ttl: u8) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn ident(mut self, ident: u16) -> Self {
        self.ident = Some(ident);
        self
    }

    pub fn protocol(mut self, p: IpProto) -> Self {
        self.protocol = Some(p);
        self
    }

    pub fn payload(mut self, p: Ipv4Payload) -> Self {
        self.payload = Some(p);
        self
    }

    fn finish(self) -> Result<Ipv4Packet, SimError> {
        let src = self.src.ok_or(SimError::MissingBuilderField("net_src"))?;
        let dst = self.dst.ok_or(SimError::MissingBuilderField("net_dst"))?;
        let payload = self.payload.unwrap_or(Ipv4Payload::Empty);
        let total = payload.len_bytes();
        let ident = self.ident.unwrap_or(0);
        let ttl = self.ttl.unwrap_or(64);
        let protocol = self.protocol.unwrap_or(IpProto::Test);
        Ok(Ipv4Packet {
            src,
            dst,
            ttl,
            ident,
            more_fragments: false,
            fragment_offset: 0,
            payload_len: total,
            total_length: total,
            protocol,
            checksum: header_checksum(&src, &dst, ident, ttl),
            payload,
        })
    }

    /// 构建单个（未分片）报文。
    pub fn build(self) -> Result<Ipv4Packet, SimError> {
        self.finish()
    }

    /// 构建并按 `max_size`（每片载荷字节数）分片。
    ///
    /// 首片携带整个载荷、登记长度截为 `max_size`；后续片载荷为空，
    /// 按消耗字节数登记长度。载荷不超过 `max_size` 时退化为单报文。
    pub fn fragment(self, max_size: u32) -> Result<Vec<Ipv4Packet>, SimError> {
        let whole = self.finish()?;
        let total = whole.total_length;
        if max_size == 0 || total <= max_size {
            return Ok(vec![whole]);
        }
        let count = total.div_ceil(max_size);
        let mut frags = Vec::with_capacity(count as usize);
        for i in 0..count {
            let offset = i * max_size;
            let span = max_size.min(total - offset);
            let mut frag = whole.clone();
            frag.fragment_offset = offset;
            frag.payload_len = span;
            frag.more_fragments = i + 1 < count;
            if i > 0 {
                frag.payload = Ipv4Payload::Empty;
            }
            frags.push(frag);
        }
        Ok(frags)
    }
}

// 与次序无关的加性散列（演示用，非真实 IPv4 头校验和）。
fn header_checksum(src: &IPAddress, dst: &IPAddress, ident: u16, ttl: u8) -> u32 {
    let s: u32 = src.octets().iter().map(|&b| b as u32).sum();
    let d: u32 = dst.octets().iter().map(|&b| b as u32).sum();
    s.wrapping_add(d)
        .wrapping_add(ident as u32)
        .wrapping_add(ttl as u32)
}
