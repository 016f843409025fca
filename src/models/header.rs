//! Zero-copy raw view and decoded form of the nine-byte message header.
//!
//! Every TWSE datagram carries the same fixed header right after the ESC
//! byte; the body schema is selected by `format_code`. `HeaderRaw` is an
//! unaligned view over the wire bytes, `Header` is the decoded form with the
//! BCD fields expanded to native integers.

use serde::{Deserialize, Serialize};
use zerocopy::{FromBytes, Immutable, KnownLayout, Ref, Unaligned};

use crate::errors::DecodeError;
use crate::parser::bcd;

/// Byte length of the fixed message header.
pub const HEADER_SIZE: usize = 9;

/// Unaligned view over the nine header bytes as they sit on the wire.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Unaligned, KnownLayout, Immutable, FromBytes)]
pub struct HeaderRaw {
  pub message_length: [u8; 2], // packed BCD
  pub business_type: u8,
  pub format_code: u8,
  pub format_version: u8,
  pub transmission_number: [u8; 4], // packed BCD
}

/// Try view a slice as `HeaderRaw` (zero-copy, unaligned-safe).
///
/// Returns `None` unless the slice is exactly [`HEADER_SIZE`] bytes.
#[inline]
pub fn as_header_raw(slice: &[u8]) -> Option<Ref<&[u8], HeaderRaw>> {
  Ref::<_, HeaderRaw>::from_bytes(slice).ok()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
///
/// Decoded message header
///
pub struct Header {
  /// Declared length of the whole datagram, ESC through terminal
  pub message_length: u16,
  pub business_type: u8,
  /// Selects the body schema; the dispatch key
  pub format_code: u8,
  pub format_version: u8,
  /// Sender sequence; monitors may use it for gap detection downstream
  pub transmission_number: u32,
}

impl Header {
  /// Decode the nine header bytes. No branching; BCD fields may fail.
  pub fn from_bytes(input: &[u8]) -> Result<Self, DecodeError> {
    let view =
      as_header_raw(input).ok_or(DecodeError::TooShort(input.len()))?;
    let raw = &*view;
    Ok(Header {
      message_length: bcd(&raw.message_length)? as u16,
      business_type: raw.business_type,
      format_code: raw.format_code,
      format_version: raw.format_version,
      transmission_number: bcd(&raw.transmission_number)? as u32,
    })
  }
}
