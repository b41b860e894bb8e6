//! IPv4 地址
//!
//! 4 字节网络地址，点分十进制文本形式。可带"掩码"标记：掩码要求位模式
//! 为连续的 1 后跟连续的 0。构造后不可变。

use std::fmt;

use rand::Rng;

use crate::error::SimError;

/// IPv4 地址（4 个八位组），可选掩码语义。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IPAddress {
    octets: [u8; 4],
    mask: bool,
}

impl IPAddress {
    /// 受限广播地址 255.255.255.255
    pub const BROADCAST: IPAddress = IPAddress {
        octets: [255; 4],
        mask: false,
    };

    /// 未指定地址 0.0.0.0（DHCP 客户端在取得租约前使用）
    pub const UNSPECIFIED: IPAddress = IPAddress {
        octets: [0; 4],
        mask: false,
    };

    pub fn new(octets: [u8; 4]) -> Self {
        IPAddress {
            octets,
            mask: false,
        }
    }

    /// 从点分十进制解析普通地址。
    pub fn parse(s: &str) -> Result<Self, SimError> {
        Ok(IPAddress {
            octets: parse_octets(s)?,
            mask: false,
        })
    }

    /// 从点分十进制解析掩码。
    ///
    /// 除格式要求外，还要求位模式为前缀连续的 1 跟连续的 0。
    pub fn parse_mask(s: &str) -> Result<Self, SimError> {
        let octets = parse_octets(s)?;
        let bits = u32::from_be_bytes(octets);
        // !bits + 1 为 2 的幂 <=> 1 连续在高位
        if bits != 0 && !(!bits).wrapping_add(1).is_power_of_two() && bits != u32::MAX {
            return Err(SimError::InvalidAddressFormat(s.to_string()));
        }
        Ok(IPAddress { octets, mask: true })
    }

    pub fn octets(&self) -> [u8; 4] {
        self.octets
    }

    pub fn is_mask(&self) -> bool {
        self.mask
    }

    pub fn is_broadcast(&self) -> bool {
        self.octets == [255; 4]
    }

    pub fn is_unspecified(&self) -> bool {
        self.octets == [0; 4]
    }

    /// 随机生成一个地址。
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let mut octets = [0u8; 4];
        rng.fill(&mut octets);
        IPAddress {
            octets,
            mask: false,
        }
    }

    /// 按首个八位组生成有类默认掩码（A/B/C 类）。
    ///
    /// 这是刻意保留的老式行为：其余逻辑都是无类的，但默认掩码仍按类生成。
    pub fn generate_mask(&self) -> IPAddress {
        let octets = match self.octets[0] {
            0..=127 => [255, 0, 0, 0],
            128..=191 => [255, 255, 0, 0],
            _ => [255, 255, 255, 0],
        };
        IPAddress { octets, mask: true }
    }

    /// 网络地址：与掩码按位与。幂等。
    pub fn network_ip(&self, mask: &IPAddress) -> IPAddress {
        let mut octets = [0u8; 4];
        for i in 0..4 {
            octets[i] = self.octets[i] & mask.octets[i];
        }
        IPAddress {
            octets,
            mask: false,
        }
    }

    /// 定向广播地址：与掩码取反按位或。幂等。
    pub fn broadcast_ip(&self, mask: &IPAddress) -> IPAddress {
        let mut octets = [0u8; 4];
        for i in 0..4 {
            octets[i] = self.octets[i] | !mask.octets[i];
        }
        IPAddress {
            octets,
            mask: false,
        }
    }

    /// 把地址视为大端 32 位整数加 `n`（跨八位组进位）。
    pub fn add(&self, n: u32) -> IPAddress {
        let v = u32::from_be_bytes(self.octets).wrapping_add(n);
        IPAddress {
            octets: v.to_be_bytes(),
            mask: self.mask,
        }
    }

    /// 把地址视为大端 32 位整数减 `n`（跨八位组借位）。
    pub fn subtract(&self, n: u32) -> IPAddress {
        let v = u32::from_be_bytes(self.octets).wrapping_sub(n);
        IPAddress {
            octets: v.to_be_bytes(),
            mask: self.mask,
        }
    }

    /// 两地址在掩码下是否属于同一网络。
    pub fn in_same_network(&self, mask: &IPAddress, other: &IPAddress) -> bool {
        self.network_ip(mask).octets == other.network_ip(mask).octets
    }

    /// 掩码的 CIDR 前缀长度（置 1 位数），用于最长前缀匹配。
    pub fn cidr(&self) -> u32 {
        u32::from_be_bytes(self.octets).count_ones()
    }
}

fn parse_octets(s: &str) -> Result<[u8; 4], SimError> {
    let bad = || SimError::InvalidAddressFormat(s.to_string());
    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() != 4 {
        return Err(bad());
    }
    let mut octets = [0u8; 4];
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() || part.len() > 3 {
            return Err(bad());
        }
        // 拒绝前导零（"01" 非法，"0" 合法）
        if part.len() > 1 && part.starts_with('0') {
            return Err(bad());
        }
        if !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        octets[i] = part.parse::<u8>().map_err(|_| bad())?;
    }
    Ok(octets)
}

impl fmt::Display for IPAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.octets;
        write!(f, "{}.{}.{}.{}", o[0], o[1], o[2], o[3])
    }
}
