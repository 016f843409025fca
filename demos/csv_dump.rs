//! Flatten trade snapshots into a wide CSV: one row per datagram with the
//! deal and five bid / five ask columns, empty cells where the book is
//! shallower. Mirrors the upstream pcap-analysis script.
//!
//! ```text
//! cargo run --example csv_dump -- -port 3000 -o ticks.csv -stock 2330
//! ```

use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::net::Ipv4Addr;
use std::process;
use std::thread;
use std::time::Duration;

use twse_udp_resolver::{Parser, Record, TradeSnapshot};

const HEADER_ROW: &str = "MatchTime,TransmissionNumber,StockCode,DisplayItem,LimitUpDown,StatusNote,CumulativeVolume,DealPrice,DealQuantity,BidPrice1,BidQuantity1,BidPrice2,BidQuantity2,BidPrice3,BidQuantity3,BidPrice4,BidQuantity4,BidPrice5,BidQuantity5,AskPrice1,AskQuantity1,AskPrice2,AskQuantity2,AskPrice3,AskQuantity3,AskPrice4,AskQuantity4,AskPrice5,AskQuantity5";

fn row(snapshot: &TradeSnapshot) -> String {
    let mut cells: Vec<String> = vec![
        snapshot.match_time.to_string(),
        snapshot.header.transmission_number.to_string(),
        snapshot.stock_code_str().to_string(),
        snapshot.display_item.0.to_string(),
        snapshot.limit_up_limit_down.to_string(),
        snapshot.status_note.to_string(),
        snapshot.cumulative_volume.to_string(),
    ];

    match snapshot.deal() {
        Some(deal) => {
            cells.push(deal.price.to_string());
            cells.push(deal.quantity.to_string());
        }
        None => cells.extend([String::new(), String::new()]),
    }
    for side in [snapshot.bids().collect::<Vec<_>>(), snapshot.asks().collect()] {
        for i in 0..5 {
            match side.get(i) {
                Some(level) => {
                    cells.push(level.price.to_string());
                    cells.push(level.quantity.to_string());
                }
                None => cells.extend([String::new(), String::new()]),
            }
        }
    }
    cells.join(",")
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let mut port = 3000u16;
    let mut output = "output.csv".to_string();
    let mut multicast: Option<Ipv4Addr> = None;
    let mut iface: Option<Ipv4Addr> = None;
    let mut stock: Option<String> = None;

    let mut args = env::args().skip(1);
    while let Some(flag) = args.next() {
        let value = args.next().unwrap_or_default();
        match flag.as_str() {
            "-port" => port = value.parse().expect("invalid port"),
            "-o" => output = value,
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

    let file = File::create(&output).unwrap_or_else(|e| {
        eprintln!("cannot create {}: {}", output, e);
        process::exit(1);
    });
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", HEADER_ROW).expect("write csv header");

    let mut parser = Parser::new();
    if let (Some(group), Some(interface)) = (multicast, iface) {
        parser.set_multicast(group, interface);
    }
    // only trade snapshots belong in this table
    parser.set_allowed_format_codes([0x06, 0x17, 0x23]);

    log::info!("writing {} from port {}", output, port);
    let result = parser.start(port, move |record: Record| {
        let Record::Snapshot(snapshot) = record else {
            return;
        };
        if let Some(wanted) = &stock {
            if snapshot.stock_code_str() != wanted {
                return;
            }
        }
        if let Err(e) = writeln!(writer, "{}", row(&snapshot)) {
            log::error!("csv write failed: {}", e);
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
