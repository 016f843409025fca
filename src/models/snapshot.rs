use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::errors::DecodeError;
use crate::models::display::{DisplayItem, MAX_DEPTH};
use crate::models::header::Header;
use crate::models::level::{LevelKind, PriceLevel, PRICE_WIDTH};
use crate::parser::{bcd, bcd_price};

/// Wire width of the stock-code field.
pub const STOCK_CODE_WIDTH: usize = 6;

const MATCH_TIME_WIDTH: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
///
/// Exchange-side timestamp of the match event
///
/// Packed on the wire as six BCD bytes, HHMMSS followed by six digits of
/// microseconds.
///
pub struct MatchTime {
  pub hour: u8,
  pub minute: u8,
  pub second: u8,
  pub microsecond: u32,
}

impl MatchTime {
  pub(crate) fn from_bcd(input: &[u8]) -> Result<Self, DecodeError> {
    Ok(MatchTime {
      hour: bcd(&input[0..1])? as u8,
      minute: bcd(&input[1..2])? as u8,
      second: bcd(&input[2..3])? as u8,
      microsecond: bcd(&input[3..6])? as u32,
    })
  }

  /// Convert to a [`chrono::NaiveTime`].
  ///
  /// Returns `None` for out-of-range components the exchange occasionally
  /// emits on special records.
  pub fn to_naive_time(&self) -> Option<NaiveTime> {
    NaiveTime::from_hms_micro_opt(
      self.hour as u32,
      self.minute as u32,
      self.second as u32,
      self.microsecond,
    )
  }
}

impl fmt::Display for MatchTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{:02}:{:02}:{:02}.{:06}",
      self.hour, self.minute, self.second, self.microsecond
    )
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
///
/// Trade snapshot carried by format 06, 17 and 23 bodies
///
pub struct TradeSnapshot {
  pub header: Header,
  /// Fixed six ASCII bytes, right-padded with spaces, delivered verbatim
  pub stock_code: [u8; STOCK_CODE_WIDTH],
  pub match_time: MatchTime,
  pub display_item: DisplayItem,
  pub limit_up_limit_down: u8,
  pub status_note: u8,
  pub cumulative_volume: u64,
  /// Wire-ordered levels: optional deal, then bids best→worst, then asks
  pub levels: SmallVec<[PriceLevel; 11]>,
}

impl TradeSnapshot {
  /// Decode a format 06/17/23 body.
  ///
  /// `qty_width` is the packed-BCD width of quantity fields and of the
  /// cumulative volume: 4 bytes for formats 06/17, 6 bytes for format 23.
  pub(crate) fn from_body(
    header: Header,
    body: &[u8],
    qty_width: usize,
  ) -> Result<Self, DecodeError> {
    // stock(6) + time(6) + display(1) + limit(1) + status(1) + volume
    let fixed_len = STOCK_CODE_WIDTH + MATCH_TIME_WIDTH + 3 + qty_width;
    if body.len() < fixed_len {
      return Err(DecodeError::BadBody("body shorter than fixed region"));
    }

    let mut stock_code = [0u8; STOCK_CODE_WIDTH];
    stock_code.copy_from_slice(&body[0..6]);
    let match_time = MatchTime::from_bcd(&body[6..12])?;
    let display_item = DisplayItem(body[12]);
    if display_item.bid_depth() > MAX_DEPTH
      || display_item.ask_depth() > MAX_DEPTH
    {
      return Err(DecodeError::BadBody("depth exceeds five levels"));
    }
    let limit_up_limit_down = body[13];
    let status_note = body[14];
    let cumulative_volume = bcd(&body[15..15 + qty_width])?;

    let region = &body[fixed_len..];
    if region.len() != display_item.region_len(qty_width) {
      return Err(DecodeError::BadBody("variable region length mismatch"));
    }

    let entry_width = PRICE_WIDTH + qty_width;
    let read_level = |offset: usize,
                      kind: LevelKind,
                      index: u8|
     -> Result<PriceLevel, DecodeError> {
      Ok(PriceLevel {
        kind,
        index,
        price: bcd_price(&region[offset..offset + PRICE_WIDTH])?,
        quantity: bcd(&region[offset + PRICE_WIDTH..offset + entry_width])?,
      })
    };

    let mut levels = SmallVec::new();
    let mut offset = 0;
    if display_item.has_deal() {
      levels.push(read_level(offset, LevelKind::Deal, 0)?);
      offset += entry_width;
    }
    for i in 0..display_item.bid_depth() {
      levels.push(read_level(offset, LevelKind::Bid, i)?);
      offset += entry_width;
    }
    for i in 0..display_item.ask_depth() {
      levels.push(read_level(offset, LevelKind::Ask, i)?);
      offset += entry_width;
    }

    Ok(TradeSnapshot {
      header,
      stock_code,
      match_time,
      display_item,
      limit_up_limit_down,
      status_note,
      cumulative_volume,
      levels,
    })
  }

  /// The stock code with the space padding trimmed
  pub fn stock_code_str(&self) -> &str {
    std::str::from_utf8(&self.stock_code)
      .unwrap_or("")
      .trim_end()
  }

  /// The deal entry, when the display item flags one
  pub fn deal(&self) -> Option<&PriceLevel> {
    self.levels.first().filter(|l| l.kind == LevelKind::Deal)
  }

  /// Bid levels, best first
  pub fn bids(&self) -> impl Iterator<Item = &PriceLevel> {
    self.levels.iter().filter(|l| l.kind == LevelKind::Bid)
  }

  /// Ask levels, best first
  pub fn asks(&self) -> impl Iterator<Item = &PriceLevel> {
    self.levels.iter().filter(|l| l.kind == LevelKind::Ask)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::level::Price;

  fn format06_body(display: u8, pairs: &[(u64, u64)]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(b"2330  ");
    body.extend_from_slice(&[0x09, 0x04, 0x15, 0x06, 0x12, 0x78]);
    body.push(display);
    body.push(0x00);
    body.push(0x00);
    body.extend_from_slice(&[0x00, 0x01, 0x64, 0x23]); // volume 16423
    for &(price, qty) in pairs {
      body.extend_from_slice(&to_bcd(price, 5));
      body.extend_from_slice(&to_bcd(qty, 4));
    }
    body
  }

  fn to_bcd(mut value: u64, width: usize) -> Vec<u8> {
    let mut out = vec![0u8; width];
    for slot in out.iter_mut().rev() {
      *slot = ((value % 10) + ((value / 10 % 10) << 4)) as u8;
      value /= 100;
    }
    out
  }

  #[test]
  fn decodes_full_book_snapshot() {
    let pairs = [
      (995_000, 1234), // deal
      (995_000, 250),
      (990_000, 175),
      (985_000, 477),
      (975_000, 669),
      (970_000, 125),
      (1_000_000, 80),
      (1_005_000, 675),
      (1_015_000, 460),
    ];
    let body = format06_body(0xD6, &pairs);
    let snapshot =
      TradeSnapshot::from_body(Header::default(), &body, 4).unwrap();

    assert_eq!(snapshot.stock_code_str(), "2330");
    assert_eq!(snapshot.stock_code, *b"2330  ");
    assert_eq!(snapshot.match_time.to_string(), "09:04:15.061278");
    assert_eq!(snapshot.cumulative_volume, 16423);
    assert_eq!(snapshot.levels.len(), 9);

    let deal = snapshot.deal().unwrap();
    assert_eq!(deal.price, Price::from_raw(995_000));
    assert_eq!(deal.quantity, 1234);

    let bids: Vec<_> = snapshot.bids().collect();
    assert_eq!(bids.len(), 5);
    assert_eq!(bids[0].price, Price::from_raw(995_000));
    assert_eq!(bids[0].quantity, 250);
    assert_eq!(bids[0].index, 0);
    assert_eq!(bids[4].price, Price::from_raw(970_000));

    let asks: Vec<_> = snapshot.asks().collect();
    assert_eq!(asks.len(), 3);
    assert_eq!(asks[0].price, Price::from_raw(1_000_000));
    assert_eq!(asks[0].quantity, 80);
    assert_eq!(asks[2].price, Price::from_raw(1_015_000));
    assert_eq!(asks[2].quantity, 460);
    assert_eq!(asks[2].index, 2);
  }

  #[test]
  fn decodes_bid_only_snapshot() {
    let pairs = [
      (995_000, 10),
      (995_000, 250),
      (990_000, 175),
      (985_000, 477),
      (975_000, 669),
      (970_000, 125),
    ];
    let body = format06_body(0xD0, &pairs);
    let snapshot =
      TradeSnapshot::from_body(Header::default(), &body, 4).unwrap();
    assert_eq!(snapshot.levels.len(), 6);
    assert!(snapshot.deal().is_some());
    assert_eq!(snapshot.bids().count(), 5);
    assert_eq!(snapshot.asks().count(), 0);
  }

  #[test]
  fn rejects_region_shorter_than_bitmap_promises() {
    // 0x8A promises deal + 5 asks = 6 pairs; only 5 supplied
    let pairs = [
      (995_000, 10),
      (1_000_000, 80),
      (1_005_000, 675),
      (1_015_000, 460),
      (1_020_000, 12),
    ];
    let body = format06_body(0x8A, &pairs);
    assert_eq!(
      TradeSnapshot::from_body(Header::default(), &body, 4),
      Err(DecodeError::BadBody("variable region length mismatch"))
    );
  }

  #[test]
  fn rejects_truncated_fixed_region() {
    let body = format06_body(0x00, &[]);
    assert!(matches!(
      TradeSnapshot::from_body(Header::default(), &body[..10], 4),
      Err(DecodeError::BadBody(_))
    ));
  }

  #[test]
  fn rejects_non_decimal_quantity() {
    let mut body = format06_body(0x80, &[(995_000, 10)]);
    let last = body.len() - 1;
    body[last] = 0xAB;
    assert_eq!(
      TradeSnapshot::from_body(Header::default(), &body, 4),
      Err(DecodeError::BadBcd(0xAB))
    );
  }

  #[test]
  fn wide_quantity_fields() {
    // format 23 layout: 6-byte volume and quantities
    let mut body = Vec::new();
    body.extend_from_slice(b"2330  ");
    body.extend_from_slice(&[0x13, 0x30, 0x00, 0x00, 0x00, 0x00]);
    body.push(0xB2); // deal + 3 bids + 1 ask
    body.push(0x00);
    body.push(0x00);
    body.extend_from_slice(&to_bcd(987_654, 6));
    let pairs = [
      (5_855_000u64, 10u64),
      (5_850_000, 100),
      (5_845_000, 50),
      (5_840_000, 30),
      (5_860_000, 700),
    ];
    for &(price, qty) in &pairs {
      body.extend_from_slice(&to_bcd(price, 5));
      body.extend_from_slice(&to_bcd(qty, 6));
    }

    let snapshot =
      TradeSnapshot::from_body(Header::default(), &body, 6).unwrap();
    assert_eq!(snapshot.cumulative_volume, 987_654);
    assert_eq!(snapshot.levels.len(), 5);
    assert_eq!(snapshot.deal().unwrap().price, Price::from_raw(5_855_000));
    assert_eq!(snapshot.deal().unwrap().quantity, 10);
    assert_eq!(snapshot.bids().next().unwrap().quantity, 100);
    assert_eq!(snapshot.asks().next().unwrap().price, Price::from_raw(5_860_000));
    assert_eq!(snapshot.asks().next().unwrap().quantity, 700);
  }

  #[test]
  fn match_time_converts_to_chrono() {
    let t = MatchTime {
      hour: 9,
      minute: 4,
      second: 15,
      microsecond: 61_278,
    };
    let naive = t.to_naive_time().unwrap();
    assert_eq!(naive.to_string(), "09:04:15.061278");
    let bogus = MatchTime {
      hour: 99,
      ..t
    };
    assert!(bogus.to_naive_time().is_none());
  }
}
