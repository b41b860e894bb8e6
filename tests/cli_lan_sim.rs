use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "lansim-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

#[test]
fn lan_sim_pings_across_a_described_topology() {
    let dir = unique_temp_dir("lan-sim-ping");
    let topology = write_file(
        &dir,
        "topology.json",
        r#"
{
    "schema_version": 1,
    "nodes": [
        { "name": "sw", "kind": "switch",
          "ifaces": [ { "port": "FastEthernet" }, { "port": "FastEthernet" } ] },
        { "name": "a", "kind": "computer",
          "ifaces": [ { "port": "FastEthernet", "address": "192.168.5.1" } ] },
        { "name": "b", "kind": "computer",
          "ifaces": [ { "port": "FastEthernet", "address": "192.168.5.2" } ] }
    ],
    "links": [
        { "a": "sw:FastEthernet0/0", "b": "a:FastEthernet0/0" },
        { "a": "sw:FastEthernet0/1", "b": "b:FastEthernet0/0" }
    ]
}
        "#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_lan_sim"))
        .args([
            "--topology",
            topology.to_str().unwrap(),
            "--ping-from",
            "a",
            "--ping-to",
            "192.168.5.2",
            "--until-secs",
            "30",
        ])
        .output()
        .expect("run lan_sim");
    assert!(
        output.status.success(),
        "lan_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("ping ok"),
        "expected a successful ping, got: {stdout}"
    );
    assert!(stdout.contains("delivered_frames="));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn lan_sim_runs_a_topology_without_any_ping() {
    let dir = unique_temp_dir("lan-sim-idle");
    let topology = write_file(
        &dir,
        "topology.json",
        r#"
{
    "schema_version": 1,
    "nodes": [
        { "name": "a", "kind": "computer",
          "ifaces": [ { "port": "FastEthernet", "address": "10.0.0.1" } ] }
    ]
}
        "#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_lan_sim"))
        .args([
            "--topology",
            topology.to_str().unwrap(),
            "--until-secs",
            "5",
        ])
        .output()
        .expect("run lan_sim");
    assert!(
        output.status.success(),
        "lan_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("done @"));

    let _ = fs::remove_dir_all(&dir);
}
