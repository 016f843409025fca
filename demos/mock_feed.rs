//! Feed mocker: sends the canonical format 06 datagram (2330, deal + five
//! bids + three asks) once a second, alternating with a byte-reversed
//! garbage copy, exactly like the upstream `TWSE_mocker.py`. Point
//! `print_packets` or `csv_dump` at the same port to watch the pipeline.
//!
//! ```text
//! cargo run --example mock_feed -- -target 127.0.0.1 -port 10000
//! ```

use std::env;
use std::net::UdpSocket;
use std::process;
use std::thread;
use std::time::Duration;

use twse_udp_resolver::xor_checksum;

fn to_bcd(mut value: u64, width: usize) -> Vec<u8> {
    let mut out = vec![0u8; width];
    for slot in out.iter_mut().rev() {
        *slot = ((value % 10) + ((value / 10 % 10) << 4)) as u8;
        value /= 100;
    }
    out
}

/// ESC + header + body + checksum + terminal, checksum over header and body.
fn frame(format_code: u8, transmission_number: u64, body: &[u8]) -> Vec<u8> {
    let total = body.len() + 13;
    let mut header = Vec::with_capacity(9);
    header.extend_from_slice(&to_bcd(total as u64, 2));
    header.push(0x01); // business type: regular equities session
    header.push(format_code);
    header.push(0x04);
    header.extend_from_slice(&to_bcd(transmission_number, 4));

    let checksum = xor_checksum(&header) ^ xor_checksum(body);
    let mut datagram = vec![0x1B];
    datagram.extend_from_slice(&header);
    datagram.extend_from_slice(body);
    datagram.push(checksum);
    datagram.extend_from_slice(&[0x0D, 0x0A]);
    datagram
}

fn snapshot_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(b"2330  ");
    // 09:04:15.061278
    body.extend_from_slice(&[0x09, 0x04, 0x15, 0x06, 0x12, 0x78]);
    body.push(0xD6); // deal + 5 bids + 3 asks
    body.push(0x00);
    body.push(0x00);
    body.extend_from_slice(&to_bcd(16423, 4));

    let pairs: [(u64, u64); 9] = [
        (995_000, 1234), // deal 99.50 x 1234
        (995_000, 250),
        (990_000, 175),
        (985_000, 477),
        (975_000, 669),
        (970_000, 125),
        (1_000_000, 80),
        (1_005_000, 675),
        (1_015_000, 460),
    ];
    for (price, qty) in pairs {
        body.extend_from_slice(&to_bcd(price, 5));
        body.extend_from_slice(&to_bcd(qty, 4));
    }
    body
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let mut target = "127.0.0.1".to_string();
    let mut port = 10000u16;
    let mut args = env::args().skip(1);
    while let Some(flag) = args.next() {
        let value = args.next().unwrap_or_default();
        match flag.as_str() {
            "-target" => target = value,
            "-port" => port = value.parse().expect("invalid port"),
            other => {
                eprintln!("unknown flag: {}", other);
                process::exit(2);
            }
        }
    }

    let socket = UdpSocket::bind("0.0.0.0:0").expect("bind sender socket");
    let destination = format!("{}:{}", target, port);
    let mut transmission_number = 4567u64;

    loop {
        let datagram = frame(0x06, transmission_number, &snapshot_body());
        transmission_number += 1;

        log::info!("sending the canonical datagram ({} bytes)", datagram.len());
        if let Err(e) = socket.send_to(&datagram, &destination) {
            log::error!("send failed: {}", e);
        }
        thread::sleep(Duration::from_secs(1));

        log::info!("sending the reversed garbage copy");
        let reversed: Vec<u8> = datagram.iter().rev().copied().collect();
        if let Err(e) = socket.send_to(&reversed, &destination) {
            log::error!("send failed: {}", e);
        }
        thread::sleep(Duration::from_secs(1));
    }
}
