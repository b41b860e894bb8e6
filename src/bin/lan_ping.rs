//! 园区网 ping 示例
//!
//! 构建双子网园区网（hL <-> swL <-> router <-> swR <-> hR），
//! 从左侧主机 ping 右侧主机并打印往返时延。

use clap::Parser;
use lansim_rs::net::NetWorld;
use lansim_rs::sim::{Scheduler, SimTime, Speed};
use lansim_rs::topo::build_routed_campus;

#[derive(Debug, Parser)]
#[command(name = "lan-ping", about = "园区网仿真：跨子网 ping")]
struct Args {
    /// ping 超时（模型秒）
    #[arg(long, default_value_t = 5.0)]
    timeout_secs: f64,

    /// 时钟速度：slower / realtime / faster
    #[arg(long, default_value = "realtime")]
    speed: String,

    /// 顺带发一段文本到对端
    #[arg(long)]
    text: Option<String>,

    /// 仿真运行到多少秒（墙钟时间轴）
    #[arg(long, default_value_t = 60)]
    until_secs: u64,
}

fn parse_speed(s: &str) -> Speed {
    match s {
        "slower" => Speed::Slower,
        "faster" => Speed::Faster,
        _ => Speed::RealTime,
    }
}

fn main() {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let mut sched = Scheduler::default();
    sched.set_speed(parse_speed(&args.speed));
    let mut world = NetWorld::default();

    let campus = build_routed_campus(&mut world, &mut sched).expect("build campus topology");

    let ident = world
        .net
        .ping(
            &mut sched,
            campus.left_host,
            campus.right_host_ip,
            args.timeout_secs,
        )
        .expect("start ping");

    if let Some(text) = &args.text {
        world
            .net
            .send_text(&mut sched, campus.left_host, campus.right_host_ip, text)
            .expect("send text");
    }

    sched.run_until(SimTime::from_secs(args.until_secs), &mut world);

    match world.net.ping_result(ident) {
        Some(Some(rtt_ms)) => println!("ping ok, rtt={rtt_ms:.3}ms"),
        Some(None) => println!("ping timed out"),
        None => println!("ping unresolved"),
    }
    println!(
        "done @ {:?}, delivered_frames={}, delivered_packets={}",
        sched.now(),
        world.net.stats.delivered_frames,
        world.net.stats.delivered_packets
    );
}
