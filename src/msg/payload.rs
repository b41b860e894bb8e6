//! 叶子载荷
//!
//! 报文最内层的不透明内容。长度按字节计，用于传输时延计算。

/// 叶子载荷：空或一段不透明文本。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Payload {
    #[default]
    Empty,
    Text(String),
}

impl Payload {
    pub fn len_bytes(&self) -> u32 {
        match self {
            Payload::Empty => 0,
            Payload::Text(s) => s.len() as u32,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Payload::Empty => None,
            Payload::Text(s) => Some(s),
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}
