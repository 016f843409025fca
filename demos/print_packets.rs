//! Log every decoded record as a JSON line, optionally filtered to one
//! stock code. The moral equivalent of the upstream Python interface
//! example.
//!
//! ```text
//! cargo run --example print_packets -- -port 10000 \
//!     -multicast 224.0.100.100 -iface 192.168.1.5 -stock 2330
//! ```

use std::env;
use std::net::Ipv4Addr;
use std::process;
use std::thread;
use std::time::Duration;

use twse_udp_resolver::{Parser, Record};

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let mut port = 10000u16;
    let mut multicast: Option<Ipv4Addr> = None;
    let mut iface: Option<Ipv4Addr> = None;
    let mut stock: Option<String> = None;

    let mut args = env::args().skip(1);
    while let Some(flag) = args.next() {
        let value = args.next().unwrap_or_default();
        match flag.as_str() {
            "-port" => port = value.parse().expect("invalid port"),
            "-multicast" => {
                multicast = Some(value.parse().expect("invalid group address"))
            }
            "-iface" => {
                iface = Some(value.parse().expect("invalid interface address"))
            }
            "-stock" => stock = Some(value),
            other => {
                eprintln!("unknown flag: {}", other);
                process::exit(2);
            }
        }
    }

    let mut parser = Parser::new();
    match (multicast, iface) {
        (Some(group), Some(interface)) => {
            parser.set_multicast(group, interface);
            log::info!("multicast group={} interface={}", group, interface);
        }
        (Some(_), None) | (None, Some(_)) => {
            eprintln!("-multicast and -iface must be given together");
            process::exit(2);
        }
        (None, None) => {}
    }

    log::info!("starting parser on port {}", port);
    let result = parser.start(port, move |record: Record| {
        if let Some(wanted) = &stock {
            if let Record::Snapshot(snapshot) = &record {
                if snapshot.stock_code_str() != wanted {
                    return;
                }
            }
        }
        match serde_json::to_string(&record) {
            Ok(line) => log::info!("{}", line),
            Err(e) => log::error!("failed to serialize record: {}", e),
        }
    });
    if let Err(e) = result {
        log::error!("{}", e);
        process::exit(1);
    }

    loop {
        thread::sleep(Duration::from_secs(30));
        let stats = parser.stats();
        log::info!(
            "received={} delivered={} dropped={}",
            stats.received,
            stats.delivered,
            stats.dropped()
        );
    }
}
