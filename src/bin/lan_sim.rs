//! 拓扑描述仿真
//!
//! 从 JSON 描述导入网络，可选地从某个节点 ping 一个地址，
//! 跑完后打印观测计数。

use clap::Parser;
use std::fs;
use std::path::PathBuf;

use lansim_rs::addr::IPAddress;
use lansim_rs::net::{NetWorld, TraceEvent};
use lansim_rs::sim::{Scheduler, SimTime};
use lansim_rs::topo::{build, TopologySpec};

#[derive(Debug, Parser)]
#[command(name = "lan-sim", about = "按 JSON 拓扑描述运行局域网仿真")]
struct Args {
    /// 拓扑描述文件
    #[arg(long)]
    topology: PathBuf,

    /// 发起 ping 的节点名
    #[arg(long)]
    ping_from: Option<String>,

    /// ping 的目的地址
    #[arg(long)]
    ping_to: Option<String>,

    /// ping 超时（模型秒）
    #[arg(long, default_value_t = 5.0)]
    timeout_secs: f64,

    /// 仿真运行到多少秒（墙钟时间轴）
    #[arg(long, default_value_t = 60)]
    until_secs: u64,
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

    let raw = fs::read_to_string(&args.topology).expect("read topology file");
    let spec: TopologySpec = serde_json::from_str(&raw).expect("parse topology json");

    let mut sched = Scheduler::default();
    let mut world = NetWorld::default();
    let index = build(&mut world, &mut sched, &spec).expect("build topology");

    let ident = match (&args.ping_from, &args.ping_to) {
        (Some(from), Some(to)) => {
            let node = index.node(from).expect("ping_from node exists");
            let dst = IPAddress::parse(to).expect("ping_to address");
            Some(
                world
                    .net
                    .ping(&mut sched, node, dst, args.timeout_secs)
                    .expect("start ping"),
            )
        }
        _ => None,
    };

    sched.run_until(SimTime::from_secs(args.until_secs), &mut world);

    if let Some(ident) = ident {
        match world.net.ping_result(ident) {
            Some(Some(rtt_ms)) => println!("ping ok, rtt={rtt_ms:.3}ms"),
            Some(None) => println!("ping timed out"),
            None => println!("ping unresolved"),
        }
    }
    let text_delivered = world
        .net
        .trace
        .count(|e| matches!(e, TraceEvent::TextDelivered { .. }));
    println!(
        "done @ {:?}, delivered_frames={}, delivered_packets={}, texts={}",
        sched.now(),
        world.net.stats.delivered_frames,
        world.net.stats.delivered_packets,
        text_delivered
    );
}
