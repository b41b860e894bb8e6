//! 链路类型
//!
//! 连接恰好两个硬件接口的物理链路。端点在构造时一次性确定，
//! 不可重新接线。传播时延由长度决定，传输时延由比特率决定，
//! 两者分别走调度器的光速/传输倍率。

use super::id::IfaceId;
use crate::error::SimError;

/// 真空光速（米/秒）；介质中按 2/3 折算。
const LIGHT_SPEED_M_S: f64 = 299_792_458.0;

/// 物理链路。
#[derive(Debug)]
pub struct Link {
    pub endpoints: [IfaceId; 2],
    /// 链路长度（米），决定传播时延
    pub length_m: f64,
    /// 固定比特率（bit/s），决定传输时延
    pub bitrate_bps: u64,
}

impl Link {
    pub fn new(a: IfaceId, b: IfaceId, length_m: f64, bitrate_bps: u64) -> Self {
        Link {
            endpoints: [a, b],
            length_m,
            bitrate_bps,
        }
    }

    /// 另一端接口。`from` 不是端点时报 `LinkEndpointMismatch`。
    pub fn peer(&self, from: IfaceId) -> Result<IfaceId, SimError> {
        if self.endpoints[0] == from {
            Ok(self.endpoints[1])
        } else if self.endpoints[1] == from {
            Ok(self.endpoints[0])
        } else {
            Err(SimError::LinkEndpointMismatch)
        }
    }

    /// 传播时延（模型秒）：长度 / (光速 × 2/3)。
    pub fn propagation_secs(&self) -> f64 {
        self.length_m / (LIGHT_SPEED_M_S * 2.0 / 3.0)
    }

    /// 传输时延（模型秒）：字节长 × 8 / 比特率。
    pub fn transmission_secs(&self, bytes: u32) -> f64 {
        if self.bitrate_bps == 0 {
            return f64::INFINITY;
        }
        (bytes as f64) * 8.0 / self.bitrate_bps as f64
    }
}
