use std::fmt;

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Wire width of a packed-BCD price field.
pub(crate) const PRICE_WIDTH: usize = 5;

/// Prices carry four implied decimal places.
pub const PRICE_SCALE: i64 = 10_000;

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
///
/// Fixed-point price, an integer scaled by 10^4
///
/// The five BCD price bytes hold ten decimal digits; keeping the scaled
/// integer avoids float drift until a consumer asks for `to_f64`.
///
pub struct Price {
  raw: i64,
}

impl Price {
  pub const fn from_raw(raw: i64) -> Self {
    Self { raw }
  }

  /// The scaled integer value (price × 10^4)
  pub const fn raw(&self) -> i64 {
    self.raw
  }

  /// Convert for presentation. Not used internally.
  pub fn to_f64(&self) -> f64 {
    self.raw as f64 / PRICE_SCALE as f64
  }
}

impl fmt::Display for Price {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}.{:04}",
      self.raw / PRICE_SCALE,
      (self.raw % PRICE_SCALE).unsigned_abs()
    )
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
///
/// Which part of the book a price level belongs to
///
pub enum LevelKind {
  Deal = 0,
  Bid = 1,
  Ask = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
///
/// One tagged price/quantity pair from the variable region
///
/// Levels are delivered in wire order (deal, bids best→worst, asks
/// best→worst); `index` is the 0-based depth within the side so consumers
/// need not re-derive positions from the display bitmap.
///
pub struct PriceLevel {
  pub kind: LevelKind,
  pub index: u8,
  pub price: Price,
  pub quantity: u64,
}
