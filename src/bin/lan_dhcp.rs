//! DHCP 租约示例
//!
//! 园区网右子网挂 DHCP 地址池，未配地址的客户机广播 Discover，
//! 打印拿到的租约地址，然后用新地址 ping 网关验证。

use clap::Parser;
use lansim_rs::net::NetWorld;
use lansim_rs::sim::{Scheduler, SimTime};
use lansim_rs::topo::build_routed_campus;

#[derive(Debug, Parser)]
#[command(name = "lan-dhcp", about = "园区网仿真：DHCP 租约协商")]
struct Args {
    /// DHCP 协商超时（模型秒）
    #[arg(long, default_value_t = 10.0)]
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

    let mut sched = Scheduler::default();
    let mut world = NetWorld::default();

    let campus = build_routed_campus(&mut world, &mut sched).expect("build campus topology");
    let (client, client_port) = campus.dhcp_client;

    let xid = world
        .net
        .dhcp_discover(&mut sched, client, client_port, args.timeout_secs)
        .expect("start dhcp discover");

    sched.run_until(SimTime::from_secs(args.until_secs / 2), &mut world);

    let Some(Some(leased)) = world.net.dhcp_result(xid) else {
        println!("dhcp failed");
        return;
    };
    println!("dhcp ok, leased={leased}");

    // 新地址立刻可用：ping 本子网网关
    let gateway = lansim_rs::addr::IPAddress::parse("10.0.2.1").expect("gateway addr");
    let ident = world
        .net
        .ping(&mut sched, client, gateway, args.timeout_secs)
        .expect("start ping");
    sched.run_until(SimTime::from_secs(args.until_secs), &mut world);

    match world.net.ping_result(ident) {
        Some(Some(rtt_ms)) => println!("ping gateway ok, rtt={rtt_ms:.3}ms"),
        Some(None) => println!("ping gateway timed out"),
        None => println!("ping gateway unresolved"),
    }
}
