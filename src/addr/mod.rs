//! 地址类型
//!
//! 定义硬件（MAC）与网络（IPv4）地址的不可变值类型。

mod ipv4;
mod mac;

pub use ipv4::IPAddress;
pub use mac::MacAddress;
