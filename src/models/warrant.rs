//! Format 14 carries warrant master data. The body is a run of fixed-width
//! fields whose authoritative widths live in the exchange's own document;
//! they are named constants here so a deployment can be rebuilt against the
//! official table. Fields are opaque byte slices (several are Big5 text)
//! and trailing 0x00 padding is delivered as-is; character-set handling and
//! trimming belong to the consumer.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::DecodeError;
use crate::models::header::Header;

pub const BRIEF_NAME_WIDTH: usize = 16;
pub const SEPARATOR_WIDTH: usize = 1;
pub const UNDERLYING_ASSET_WIDTH: usize = 6;
pub const EXPIRATION_DATE_WIDTH: usize = 8;
pub const WARRANT_TYPE_WIDTH: usize = 1;
pub const RESERVED_WIDTH: usize = 6;

/// Exact body length of a format 14 message.
pub const WARRANT_BODY_WIDTH: usize = BRIEF_NAME_WIDTH
  + SEPARATOR_WIDTH
  + UNDERLYING_ASSET_WIDTH
  + EXPIRATION_DATE_WIDTH
  + 3 * WARRANT_TYPE_WIDTH
  + RESERVED_WIDTH;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
///
/// Warrant descriptor carried by format 14 bodies
///
pub struct WarrantDescriptor {
  pub header: Header,
  pub brief_name: Bytes,
  pub separator: Bytes,
  pub underlying_asset: Bytes,
  pub expiration_date: Bytes,
  pub warrant_type_d: Bytes,
  pub warrant_type_e: Bytes,
  pub warrant_type_f: Bytes,
  pub reserved: Bytes,
}

impl WarrantDescriptor {
  pub(crate) fn from_body(
    header: Header,
    body: &[u8],
  ) -> Result<Self, DecodeError> {
    if body.len() != WARRANT_BODY_WIDTH {
      return Err(DecodeError::BadBody("warrant body width mismatch"));
    }

    let mut offset = 0;
    let mut take = |width: usize| {
      let field = Bytes::copy_from_slice(&body[offset..offset + width]);
      offset += width;
      field
    };

    let brief_name = take(BRIEF_NAME_WIDTH);
    let separator = take(SEPARATOR_WIDTH);
    let underlying_asset = take(UNDERLYING_ASSET_WIDTH);
    let expiration_date = take(EXPIRATION_DATE_WIDTH);
    let warrant_type_d = take(WARRANT_TYPE_WIDTH);
    let warrant_type_e = take(WARRANT_TYPE_WIDTH);
    let warrant_type_f = take(WARRANT_TYPE_WIDTH);
    let reserved = take(RESERVED_WIDTH);

    Ok(WarrantDescriptor {
      header,
      brief_name,
      separator,
      underlying_asset,
      expiration_date,
      warrant_type_d,
      warrant_type_e,
      warrant_type_f,
      reserved,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn splits_fixed_width_fields() {
    let mut body = Vec::new();
    body.extend_from_slice(b"TSMC PUT WRNT\x00\x00\x00"); // 16
    body.extend_from_slice(b"|"); // 1
    body.extend_from_slice(b"2330\x00\x00"); // 6
    body.extend_from_slice(b"20260918"); // 8
    body.extend_from_slice(b"P"); // D
    body.extend_from_slice(b"E"); // E
    body.extend_from_slice(b"C"); // F
    body.extend_from_slice(&[0u8; RESERVED_WIDTH]);
    assert_eq!(body.len(), WARRANT_BODY_WIDTH);

    let warrant =
      WarrantDescriptor::from_body(Header::default(), &body).unwrap();
    assert_eq!(&warrant.brief_name[..], b"TSMC PUT WRNT\x00\x00\x00");
    assert_eq!(&warrant.separator[..], b"|");
    assert_eq!(&warrant.underlying_asset[..], b"2330\x00\x00");
    assert_eq!(&warrant.expiration_date[..], b"20260918");
    assert_eq!(&warrant.warrant_type_d[..], b"P");
    assert_eq!(&warrant.warrant_type_e[..], b"E");
    assert_eq!(&warrant.warrant_type_f[..], b"C");
    assert_eq!(&warrant.reserved[..], &[0u8; RESERVED_WIDTH]);
  }

  #[test]
  fn null_padding_is_preserved() {
    let body = vec![0u8; WARRANT_BODY_WIDTH];
    let warrant =
      WarrantDescriptor::from_body(Header::default(), &body).unwrap();
    assert!(warrant.brief_name.iter().all(|&b| b == 0));
  }

  #[test]
  fn rejects_wrong_width() {
    let body = vec![0u8; WARRANT_BODY_WIDTH - 1];
    assert_eq!(
      WarrantDescriptor::from_body(Header::default(), &body),
      Err(DecodeError::BadBody("warrant body width mismatch"))
    );
  }
}
