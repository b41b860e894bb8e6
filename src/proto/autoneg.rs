//! 自协商
//!
//! 链路起来时两端各自发送一到两页链路码字（第 0 页 10/100 位图，
//! 第 1 页千兆位图，next_page 串联），通告 {min,max} 速率区间与
//! 双工偏好的交集。收齐页序列后取双方都通告的最高速率（千兆页优先），
//! 双工要求本端偏好与对端全双工位同时成立；对端页未带确认标志时，
//! 把本端解析结果带确认回送一次。无共同速率即协商失败。

use crate::hook::{IfaceEvent, Verdict};
use crate::msg::{
    CodeWord, Frame, FramePayload, GIG_FULL, GIG_HALF, TECH_100_FULL, TECH_100_HALF, TECH_10_FULL,
    TECH_10_HALF,
};
use crate::net::{IfaceId, Network, TraceEvent};
use crate::sim::Scheduler;
use tracing::{debug, warn};

/// 以太网支持的离散速率（Mbps）。
const RATES: [u64; 3] = [10, 100, 1000];

/// 本端通告的页序列（按能力区间与支持速率求交）。
fn advertised_pages(min: u64, max: u64, duplex_capable: bool, ack: bool) -> Vec<CodeWord> {
    let mut legacy: u16 = 0;
    if min <= 10 && 10 <= max {
        legacy |= TECH_10_HALF;
        if duplex_capable {
            legacy |= TECH_10_FULL;
        }
    }
    if min <= 100 && 100 <= max {
        legacy |= TECH_100_HALF;
        if duplex_capable {
            legacy |= TECH_100_FULL;
        }
    }
    let gig = if min <= 1000 && 1000 <= max {
        let mut g = GIG_HALF;
        if duplex_capable {
            g |= GIG_FULL;
        }
        Some(g)
    } else {
        None
    };

    let mut pages = vec![CodeWord {
        page: 0,
        techs: legacy,
        full_duplex: duplex_capable,
        ack,
        next_page: gig.is_some(),
    }];
    if let Some(g) = gig {
        pages.push(CodeWord {
            page: 1,
            techs: g,
            full_duplex: duplex_capable,
            ack,
            next_page: false,
        });
    }
    pages
}

/// 页序列通告的 (速率, 该速率全双工位) 集合。
fn speeds_of(pages: &[CodeWord]) -> Vec<(u64, bool)> {
    let mut out = Vec::new();
    for page in pages {
        match page.page {
            0 => {
                if page.techs & (TECH_10_HALF | TECH_10_FULL) != 0 {
                    out.push((10, page.techs & TECH_10_FULL != 0));
                }
                if page.techs & (TECH_100_HALF | TECH_100_FULL) != 0 {
                    out.push((100, page.techs & TECH_100_FULL != 0));
                }
            }
            _ => {
                if page.techs & (GIG_HALF | GIG_FULL) != 0 {
                    out.push((1000, page.techs & GIG_FULL != 0));
                }
            }
        }
    }
    out
}

/// 启动（或重启）一次协商：把本端页序列发往对端。
pub fn start(net: &mut Network, sched: &mut Scheduler, iface: IfaceId) {
    let ifc = net.iface(iface);
    if !ifc.autoneg || !ifc.up || ifc.link.is_none() {
        return;
    }
    let (min, max, duplex_capable) = (ifc.min_speed, ifc.max_speed, ifc.duplex_capable);
    debug!(iface = ?iface, min, max, "发送自协商页序列");
    for page in advertised_pages(min, max, duplex_capable, false) {
        let _ = net.send_bits(sched, iface, Frame::raw(FramePayload::Autoneg(page)));
    }
}

/// 接口收到一页码字。收齐（next_page = false 终止）后解析。
pub fn on_page(
    net: &mut Network,
    sched: &mut Scheduler,
    iface: IfaceId,
    page: CodeWord,
) -> Verdict {
    let ifc = net.iface_mut(iface);
    if !ifc.autoneg {
        return Verdict::Handled;
    }
    ifc.autoneg_rx.pages.push(page);
    if page.next_page {
        return Verdict::Handled;
    }

    let peer_pages = std::mem::take(&mut ifc.autoneg_rx.pages);
    let (min, max, duplex_capable) = (ifc.min_speed, ifc.max_speed, ifc.duplex_capable);
    let peer_acked = peer_pages.iter().all(|p| p.ack);

    // 双方通告求交，取最高速率（千兆页排在最后，自然优先）
    let local: Vec<(u64, bool)> = RATES
        .iter()
        .filter(|&&r| min <= r && r <= max)
        .map(|&r| (r, duplex_capable))
        .collect();
    let peer = speeds_of(&peer_pages);
    let mut resolved: Option<(u64, bool)> = None;
    for &(rate, local_full) in &local {
        if let Some(&(_, peer_full)) = peer.iter().find(|(r, _)| *r == rate) {
            resolved = Some((rate, local_full && peer_full));
        }
    }

    let Some((speed, duplex)) = resolved else {
        warn!(iface = ?iface, "自协商失败：无共同速率");
        net.trace
            .record(sched.now(), TraceEvent::AutonegFailed { iface });
        return Verdict::Handled;
    };

    let ifc = net.iface_mut(iface);
    ifc.speed = speed;
    ifc.duplex = duplex;
    let owner = ifc.owner;
    debug!(iface = ?iface, speed, duplex, "自协商完成");
    net.trace.record(
        sched.now(),
        TraceEvent::AutonegResolved {
            iface,
            speed,
            duplex,
        },
    );
    net.emit_iface_event(owner, iface, IfaceEvent::Changed);

    // 对端尚未确认：回送带确认标志的解析结果
    if !peer_acked {
        for p in advertised_pages(speed, speed, duplex, true) {
            let _ = net.send_bits(sched, iface, Frame::raw(FramePayload::Autoneg(p)));
        }
    }
    Verdict::Handled
}
