//! DHCP 报文
//!
//! 地址租约协商的四类报文（Discover/Offer/Request/Ack），
//! 走 UDP 协议号、广播目的地址。按固定报文长度建模。

use crate::addr::{IPAddress, MacAddress};
use crate::error::SimError;

/// DHCP 报文固定长度（字节）。
pub const DHCP_BYTES: u32 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpOp {
    Discover,
    Offer,
    Request,
    Ack,
}

/// DHCP 报文。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpMessage {
    pub op: DhcpOp,
    /// 事务标识，贯穿一次协商
    pub xid: u32,
    pub client_mac: MacAddress,
    /// 服务器分配的地址（Offer/Ack）
    pub yiaddr: Option<IPAddress>,
    pub mask: Option<IPAddress>,
    pub gateway: Option<IPAddress>,
    pub lease_secs: Option<u32>,
}

impl DhcpMessage {
    pub fn builder() -> DhcpMessageBuilder {
        DhcpMessageBuilder::default()
    }

    pub fn len_bytes(&self) -> u32 {
        DHCP_BYTES
    }
}

#[derive(Debug, Default)]
pub struct DhcpMessageBuilder {
    op: Option<DhcpOp>,
    xid: Option<u32>,
    client_mac: Option<MacAddress>,
    yiaddr: Option<IPAddress>,
    mask: Option<IPAddress>,
    gateway: Option<IPAddress>,
    lease_secs: Option<u32>,
}

impl DhcpMessageBuilder {
    pub fn op(mut self, op: DhcpOp) -> Self {
        self.op = Some(op);
        self
    }

    pub fn xid(mut self, xid: u32) -> Self {
        self.xid = Some(xid);
        self
    }

    pub fn client_mac(mut self, mac: MacAddress) -> Self {
        self.client_mac = Some(mac);
        self
    }

    pub fn yiaddr(mut self, a: IPAddress) -> Self {
        self.yiaddr = Some(a);
        self
    }

    pub fn mask(mut self, m: IPAddress) -> Self {
        self.mask = Some(m);
        self
    }

    pub fn gateway(mut self, g: IPAddress) -> Self {
        self.gateway = Some(g);
        self
    }

    pub fn lease_secs(mut self, s: u32) -> Self {
        self.lease_secs = Some(s);
        self
    }

    pub fn build(self) -> Result<DhcpMessage, SimError> {
        let op = self.op.ok_or(SimError::MissingBuilderField("dhcp_op"))?;
        let xid = self.xid.ok_or(SimError::MissingBuilderField("dhcp_xid"))?;
        let client_mac = self
            .client_mac
            .ok_or(SimError::MissingBuilderField("dhcp_client_mac"))?;
        Ok(DhcpMessage {
            op,
            xid,
            client_mac,
            yiaddr: self.yiaddr,
            mask: self.mask,
            gateway: self.gateway,
            lease_secs: self.lease_secs,
        })
    }
}
