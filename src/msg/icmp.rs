//! ICMP 报文
//!
//! 回显请求/应答。

use crate::error::SimError;

pub const ICMP_HEADER_BYTES: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpKind {
    EchoRequest,
    EchoReply,
}

/// ICMP 报文。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpMessage {
    pub kind: IcmpKind,
    pub code: u8,
    /// 配对回显请求与应答的标识
    pub ident: u16,
    pub seq: u16,
    pub data: String,
}

impl IcmpMessage {
    pub fn builder() -> IcmpMessageBuilder {
        IcmpMessageBuilder::default()
    }

    pub fn len_bytes(&self) -> u32 {
        ICMP_HEADER_BYTES + self.data.len() as u32
    }

    /// 由请求生成对应的应答（ident/seq/数据原样带回）。
    pub fn reply_to(req: &IcmpMessage) -> IcmpMessage {
        IcmpMessage {
            kind: IcmpKind::EchoReply,
            code: 0,
            ident: req.ident,
            seq: req.seq,
            data: req.data.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct IcmpMessageBuilder {
    kind: Option<IcmpKind>,
    code: u8,
    ident: Option<u16>,
    seq: u16,
    data: String,
}

impl IcmpMessageBuilder {
    pub fn kind(mut self, kind: IcmpKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn code(mut self, code: u8) -> Self {
        self.code = code;
        self
    }

    pub fn ident(mut self, ident: u16) -> Self {
        self.ident = Some(ident);
        self
    }

    pub fn seq(mut self, seq: u16) -> Self {
        self.seq = seq;
        self
    }

    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    pub fn build(self) -> Result<IcmpMessage, SimError> {
        let kind = self.kind.ok_or(SimError::MissingBuilderField("icmp_kind"))?;
        let ident = self
            .ident
            .ok_or(SimError::MissingBuilderField("icmp_ident"))?;
        Ok(IcmpMessage {
            kind,
            code: self.code,
            ident,
            seq: self.seq,
            data: self.data,
        })
    }
}
