use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Reasons a datagram is dropped by the validator or a body decoder
pub enum DecodeError {
  /// Datagram is shorter than the minimum framed message
  TooShort(usize),
  /// Missing ESC lead-in or CR/LF terminal, or the datagram is oversized
  BadFraming,
  /// XOR over header and body does not match the checksum byte
  BadChecksum { expected: u8, computed: u8 },
  /// Declared message length disagrees with the datagram length
  LengthMismatch { declared: usize, actual: usize },
  /// A packed-BCD field contains a nibble above 9
  BadBcd(u8),
  /// Body layout does not match what the header and display item promise
  BadBody(&'static str),
  /// No body decoder for this format code
  UnknownFormat(u8),
}

impl fmt::Display for DecodeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DecodeError::TooShort(len) => {
        write!(f, "datagram too short: {} bytes", len)
      }
      DecodeError::BadFraming => write!(f, "bad framing"),
      DecodeError::BadChecksum { expected, computed } => {
        write!(
          f,
          "checksum mismatch: expected 0x{:02x}, computed 0x{:02x}",
          expected, computed
        )
      }
      DecodeError::LengthMismatch { declared, actual } => {
        write!(
          f,
          "length mismatch: declared {}, datagram is {}",
          declared, actual
        )
      }
      DecodeError::BadBcd(byte) => {
        write!(f, "malformed BCD byte 0x{:02x}", byte)
      }
      DecodeError::BadBody(what) => write!(f, "bad body: {}", what),
      DecodeError::UnknownFormat(code) => {
        write!(f, "unknown format code 0x{:02x}", code)
      }
    }
  }
}

impl std::error::Error for DecodeError {}

#[derive(Debug)]
/// Errors surfaced to the caller by [`Parser::start`](crate::Parser::start)
pub enum StartError {
  /// Socket creation or bind failed
  BindFailed(io::Error),
  /// IPv4 multicast group membership could not be established
  MulticastJoinFailed(io::Error),
  /// The parser already has a live receive worker
  AlreadyRunning,
}

impl fmt::Display for StartError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StartError::BindFailed(e) => write!(f, "failed to bind socket: {}", e),
      StartError::MulticastJoinFailed(e) => {
        write!(f, "failed to join multicast group: {}", e)
      }
      StartError::AlreadyRunning => write!(f, "parser is already running"),
    }
  }
}

impl std::error::Error for StartError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      StartError::BindFailed(e) | StartError::MulticastJoinFailed(e) => {
        Some(e)
      }
      StartError::AlreadyRunning => None,
    }
  }
}
