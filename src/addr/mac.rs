//! MAC 地址
//!
//! 6 字节硬件地址，冒号十六进制文本形式。构造后不可变，可自由复制。

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::error::SimError;

/// MAC 地址（6 个八位组）。
///
/// `Ord` 按八位组字典序比较，生成树与 DHCP 用它做平局裁决。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// 广播地址 FF:FF:FF:FF:FF:FF
    pub const BROADCAST: MacAddress = MacAddress([0xFF; 6]);

    pub fn new(octets: [u8; 6]) -> Self {
        MacAddress(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// 是否为广播地址。
    ///
    /// 注意 `==` 是逐字节比较，广播地址只与另一个广播地址相等。
    pub fn is_broadcast(&self) -> bool {
        self.0 == [0xFF; 6]
    }

    /// 随机生成一个单播 MAC 地址。
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let mut octets = [0u8; 6];
        rng.fill(&mut octets);
        // 清掉组播位，置本地管理位
        octets[0] = (octets[0] & 0xFE) | 0x02;
        MacAddress(octets)
    }
}

impl FromStr for MacAddress {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, SimError> {
        let bad = || SimError::InvalidAddressFormat(s.to_string());
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(bad());
        }
        let mut octets = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 {
                return Err(bad());
            }
            // from_str_radix 额外放过 "+a" 这类带符号形式
            if !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(bad());
            }
            octets[i] = u8::from_str_radix(part, 16).map_err(|_| bad())?;
        }
        Ok(MacAddress(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}
