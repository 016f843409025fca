//! Wire-format plumbing: packed-BCD decoding, frame validation and the
//! per-format body dispatch.
//!
//! A datagram is `ESC | header(9) | body | checksum | CR LF`. The declared
//! message length covers the whole datagram and the checksum is the XOR of
//! header and body (the exchange's own test tooling also XORs the ESC byte
//! in; lenient mode tolerates that variant).

use std::collections::HashSet;

use bytes::Bytes;

use crate::errors::DecodeError;
use crate::models::{Header, Price, Record, TradeSnapshot, WarrantDescriptor, HEADER_SIZE};

pub(crate) const ESC: u8 = 0x1B;
pub(crate) const TERMINAL: [u8; 2] = [0x0D, 0x0A];

/// ESC + header + empty body + checksum + terminal.
pub const MIN_DATAGRAM_SIZE: usize = 1 + HEADER_SIZE + 1 + 2;
/// Feed datagrams never exceed one receive buffer.
pub const MAX_DATAGRAM_SIZE: usize = 2048;

// Quantity and cumulative-volume field widths per format family.
const QTY_WIDTH_NARROW: usize = 4; // formats 06 and 17
const QTY_WIDTH_WIDE: usize = 6; // format 23

/// Decode big-endian packed BCD, two digits per byte, high nibble first.
///
/// Any nibble above 9 is a hard error, never a silent wrap.
pub(crate) fn bcd(input: &[u8]) -> Result<u64, DecodeError> {
  let mut out = 0u64;
  for &byte in input {
    let hi = byte >> 4;
    let lo = byte & 0x0F;
    if hi > 9 || lo > 9 {
      return Err(DecodeError::BadBcd(byte));
    }
    out = out * 100 + (hi as u64) * 10 + lo as u64;
  }
  Ok(out)
}

/// Decode a five-byte BCD price into its ×10⁴ fixed-point form.
pub(crate) fn bcd_price(input: &[u8]) -> Result<Price, DecodeError> {
  Ok(Price::from_raw(bcd(input)? as i64))
}

/// XOR of all bytes in the protected region.
pub fn xor_checksum(bytes: &[u8]) -> u8 {
  bytes.iter().fold(0, |acc, b| acc ^ b)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
///
/// A validated datagram: decoded header plus a borrowed view of the body
///
pub struct Frame<'a> {
  pub header: Header,
  pub body: &'a [u8],
  pub checksum: u8,
}

/// Validate framing, checksum and declared length, and decode the header.
pub fn validate_frame(
  datagram: &[u8],
  lenient_checksum: bool,
) -> Result<Frame<'_>, DecodeError> {
  let len = datagram.len();
  if len < MIN_DATAGRAM_SIZE {
    return Err(DecodeError::TooShort(len));
  }
  if len > MAX_DATAGRAM_SIZE {
    return Err(DecodeError::BadFraming);
  }
  if datagram[0] != ESC || datagram[len - 2..] != TERMINAL {
    return Err(DecodeError::BadFraming);
  }

  let expected = datagram[len - 3];
  let computed = xor_checksum(&datagram[1..len - 3]);
  if expected != computed && !(lenient_checksum && expected == computed ^ ESC)
  {
    return Err(DecodeError::BadChecksum { expected, computed });
  }

  let header = Header::from_bytes(&datagram[1..1 + HEADER_SIZE])?;
  let declared = header.message_length as usize;
  if declared != len {
    return Err(DecodeError::LengthMismatch {
      declared,
      actual: len,
    });
  }

  Ok(Frame {
    header,
    body: &datagram[1 + HEADER_SIZE..len - 3],
    checksum: expected,
  })
}

/// Decode a validated body into its typed record.
pub fn decode_body(header: &Header, body: &[u8]) -> Result<Record, DecodeError> {
  match header.format_code {
    0x06 | 0x17 => {
      TradeSnapshot::from_body(*header, body, QTY_WIDTH_NARROW)
        .map(Record::Snapshot)
    }
    0x23 => TradeSnapshot::from_body(*header, body, QTY_WIDTH_WIDE)
      .map(Record::Snapshot),
    0x14 => {
      WarrantDescriptor::from_body(*header, body).map(Record::Warrant)
    }
    code => Err(DecodeError::UnknownFormat(code)),
  }
}

#[derive(Debug, Clone, Default)]
///
/// Decode-pipeline policy, fixed at parser start
///
pub struct DecodeOptions {
  /// Formats admitted to body decoding; `None` admits everything
  pub allowed_formats: Option<HashSet<u8>>,
  /// Deliver valid frames without a typed decoder as [`Record::Unknown`]
  pub deliver_unknown: bool,
  /// Also accept checksums that XOR the ESC byte in
  pub lenient_checksum: bool,
}

#[derive(Debug, Clone, PartialEq)]
///
/// What became of one datagram that passed frame validation
///
pub enum DecodeOutcome {
  /// A record to hand to the sink
  Record(Record),
  /// Format code outside the configured allow-set
  Filtered(u8),
  /// No typed decoder and unknown delivery not enabled
  UnknownDropped(u8),
}

/// Run one datagram through validation, admission and body decoding.
pub fn decode_datagram(
  datagram: &[u8],
  options: &DecodeOptions,
) -> Result<DecodeOutcome, DecodeError> {
  let frame = validate_frame(datagram, options.lenient_checksum)?;
  let code = frame.header.format_code;
  if let Some(allowed) = &options.allowed_formats {
    if !allowed.contains(&code) {
      return Ok(DecodeOutcome::Filtered(code));
    }
  }
  match decode_body(&frame.header, frame.body) {
    Ok(record) => Ok(DecodeOutcome::Record(record)),
    Err(DecodeError::UnknownFormat(code)) => {
      if options.deliver_unknown {
        Ok(DecodeOutcome::Record(Record::Unknown {
          header: frame.header,
          payload: Bytes::copy_from_slice(frame.body),
        }))
      } else {
        Ok(DecodeOutcome::UnknownDropped(code))
      }
    }
    Err(e) => Err(e),
  }
}
