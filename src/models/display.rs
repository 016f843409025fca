use serde::{Deserialize, Serialize};

use crate::models::level::PRICE_WIDTH;

/// A side never carries more than five levels.
pub const MAX_DEPTH: u8 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
///
/// The display-item bitmap byte of a trade snapshot
///
/// Bit 7 flags a deal entry, bits 6..4 the bid depth, bits 3..1 the ask
/// depth; bit 0 is reserved by the exchange.
///
pub struct DisplayItem(pub u8);

impl DisplayItem {
  /// Whether the variable region starts with a deal price/quantity pair
  pub fn has_deal(&self) -> bool {
    (self.0 >> 7) & 1 == 1
  }

  /// Number of bid levels, best first (0..=5 on a valid packet)
  pub fn bid_depth(&self) -> u8 {
    (self.0 >> 4) & 0b111
  }

  /// Number of ask levels, best first (0..=5 on a valid packet)
  pub fn ask_depth(&self) -> u8 {
    (self.0 >> 1) & 0b111
  }

  /// Total price/quantity pairs the bitmap promises
  pub fn pair_count(&self) -> usize {
    self.has_deal() as usize
      + self.bid_depth() as usize
      + self.ask_depth() as usize
  }

  /// Exact byte length of the variable region for a quantity field width
  pub(crate) fn region_len(&self, qty_width: usize) -> usize {
    self.pair_count() * (PRICE_WIDTH + qty_width)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_deal_and_depths() {
    // deal + 5 bids + 3 asks
    let item = DisplayItem(0xD6);
    assert!(item.has_deal());
    assert_eq!(item.bid_depth(), 5);
    assert_eq!(item.ask_depth(), 3);
    assert_eq!(item.pair_count(), 9);
  }

  #[test]
  fn one_sided_book() {
    // deal + 5 bids, no asks
    let item = DisplayItem(0xD0);
    assert!(item.has_deal());
    assert_eq!(item.bid_depth(), 5);
    assert_eq!(item.ask_depth(), 0);
    assert_eq!(item.pair_count(), 6);
  }

  #[test]
  fn ask_only_bitmap() {
    let item = DisplayItem(0x8A);
    assert!(item.has_deal());
    assert_eq!(item.bid_depth(), 0);
    assert_eq!(item.ask_depth(), 5);
    assert_eq!(item.pair_count(), 6);
  }

  #[test]
  fn region_length_tracks_quantity_width() {
    let item = DisplayItem(0xD6);
    assert_eq!(item.region_len(4), 9 * 9);
    assert_eq!(item.region_len(6), 9 * 11);
    assert_eq!(DisplayItem(0).region_len(4), 0);
  }
}
