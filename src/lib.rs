#![allow(clippy::cognitive_complexity, clippy::large_enum_variant)]
#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

//! # TWSE UDP Resolver
//!
//! Decoder for the Taiwan Stock Exchange real-time market-data multicast
//! feed. Each datagram is framed (`ESC … checksum CR LF`), validated and
//! decoded into a typed [`Record`] — a [`TradeSnapshot`] with the last deal
//! and up to five bid and five ask levels, or a [`WarrantDescriptor`] — and
//! handed to a consumer sink on a dedicated receive thread.
//!
//! The feed is unreliable multicast: lost datagrams stay lost, malformed
//! ones are counted and dropped, and the loop never stops for either.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use twse_udp_resolver::{Parser, Record, StartError};
//!
//! fn main() -> Result<(), StartError> {
//!   let mut parser = Parser::new();
//!   parser.start(10000, |record: Record| {
//!     if let Record::Snapshot(snapshot) = record {
//!       println!(
//!         "{} {} vol={} levels={}",
//!         snapshot.stock_code_str(),
//!         snapshot.match_time,
//!         snapshot.cumulative_volume,
//!         snapshot.levels.len(),
//!       );
//!     }
//!   })?;
//!   std::thread::sleep(std::time::Duration::from_secs(60));
//!   parser.stop();
//!   Ok(())
//! }
//! ```
//!
//! ## Multicast and filtering
//!
//! ```rust,no_run
//! use twse_udp_resolver::{Parser, Record};
//!
//! # fn main() -> Result<(), twse_udp_resolver::StartError> {
//! let mut parser = Parser::new();
//! parser.set_multicast(
//!   "224.0.100.100".parse().unwrap(),
//!   "192.168.1.5".parse().unwrap(),
//! );
//! parser.set_allowed_format_codes([0x06, 0x17]);
//! parser.start(10000, |record: Record| {
//!   let header = record.header();
//!   log::info!("seq {} format 0x{:02x}", header.transmission_number, header.format_code);
//! })?;
//! # Ok(()) }
//! ```
//!
//! ## Decoding without a socket
//!
//! [`decode_datagram`] runs the same validation and dispatch over any byte
//! buffer, which is what the bundled mock-feed and the tests use.
//!
//! Prices are fixed-point integers scaled by 10⁴ ([`Price`]); warrant
//! fields are opaque byte slices whose character set (Big5 for the names)
//! is the consumer's business. Per-datagram failures and drops are visible
//! through [`Parser::stats`].

mod errors;
mod models;
pub mod parser;
pub mod resolver;
mod stats;

pub use errors::{DecodeError, StartError};
pub use models::{
  as_header_raw, DisplayItem, Header, HeaderRaw, LevelKind, MatchTime,
  Price, PriceLevel, Record, TradeSnapshot, WarrantDescriptor,
  BRIEF_NAME_WIDTH, EXPIRATION_DATE_WIDTH, HEADER_SIZE, MAX_DEPTH,
  PRICE_SCALE, RESERVED_WIDTH, SEPARATOR_WIDTH, STOCK_CODE_WIDTH,
  UNDERLYING_ASSET_WIDTH, WARRANT_BODY_WIDTH, WARRANT_TYPE_WIDTH,
};
pub use parser::{
  decode_datagram, validate_frame, xor_checksum, DecodeOptions,
  DecodeOutcome, Frame, MAX_DATAGRAM_SIZE, MIN_DATAGRAM_SIZE,
};
pub use resolver::{MulticastConfig, Parser, RecordSink};
pub use stats::{ParserStats, StatsSnapshot};
