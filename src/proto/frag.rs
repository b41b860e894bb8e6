//! IPv4 分片重组
//!
//! 按 (来源地址, identification) 键缓冲分片，按偏移升序合并；
//! 收到的总长达到声明总长、且最近一片不再有后续时吐出重组报文。
//! 不完整的缓冲由周期清扫按老化窗口清除。

use crate::msg::{Ipv4Packet, Ipv4Payload};
use crate::net::{IfaceId, Network, ReassemblyBuf};
use tracing::{debug, trace};

/// 不完整重组缓冲的老化窗口（模拟秒）。
const REASSEMBLY_AGE_SECS: f64 = 30.0;

/// 收进一个到达本机的报文。非分片原样返回；分片被缓冲，
/// 重组完成时返回重组后的完整报文，否则返回 None。
pub fn ingest(
    net: &mut Network,
    iface: IfaceId,
    pkt: Ipv4Packet,
    now_ms: f64,
) -> Option<Ipv4Packet> {
    if !pkt.is_fragment() {
        return Some(pkt);
    }
    let key = (pkt.src, pkt.ident);
    let l3 = net.iface_mut(iface).l3_mut();
    let buf = l3.reassembly.entry(key).or_insert_with(|| ReassemblyBuf {
        spans: Vec::new(),
        head: None,
        last_more: true,
        created_ms: now_ms,
    });

    // 按偏移升序合并（重复偏移忽略）
    match buf.spans.binary_search_by_key(&pkt.fragment_offset, |s| s.0) {
        Ok(_) => {
            trace!(offset = pkt.fragment_offset, "重复分片，忽略");
            return None;
        }
        Err(pos) => buf.spans.insert(pos, (pkt.fragment_offset, pkt.payload_len)),
    }
    buf.last_more = pkt.more_fragments;
    if pkt.fragment_offset == 0 {
        buf.head = Some(pkt.clone());
    }

    let received: u32 = buf.spans.iter().map(|s| s.1).sum();
    let done = received >= pkt.total_length && !buf.last_more && buf.head.is_some();
    trace!(received, total = pkt.total_length, done, "分片进入缓冲");
    if !done {
        return None;
    }

    let buf = l3.reassembly.remove(&key).expect("entry just touched");
    let head = buf.head.expect("done implies head");
    let mut whole = head;
    whole.fragment_offset = 0;
    whole.more_fragments = false;
    whole.payload_len = whole.total_length;
    debug!(ident = whole.ident, total = whole.total_length, "重组完成");
    Some(whole)
}

/// 周期清扫：清掉超过老化窗口仍不完整的缓冲。
pub fn sweep(net: &mut Network, iface: IfaceId, now_ms: f64) {
    let Some(l3) = net.iface_mut(iface).l3.as_mut() else {
        return;
    };
    let before = l3.reassembly.len();
    l3.reassembly
        .retain(|_, buf| now_ms - buf.created_ms < REASSEMBLY_AGE_SECS * 1000.0);
    let removed = before - l3.reassembly.len();
    if removed > 0 {
        debug!(removed, "清除过期重组缓冲");
    }
}

/// 辅助：取出文本载荷（重组后的载荷总在首片）。
pub fn text_of(pkt: &Ipv4Packet) -> Option<&str> {
    match &pkt.payload {
        Ipv4Payload::Text(p) => p.text(),
        _ => None,
    }
}
