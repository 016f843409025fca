use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::models::header::Header;
use crate::models::snapshot::TradeSnapshot;
use crate::models::warrant::WarrantDescriptor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
///
/// One decoded datagram, dispatched to the sink by variant tag
///
pub enum Record {
  /// Trade snapshot (formats 06, 17, 23)
  Snapshot(TradeSnapshot),
  /// Warrant descriptor (format 14)
  Warrant(WarrantDescriptor),
  /// Valid frame with an undecoded body; delivered only when opted in
  Unknown { header: Header, payload: Bytes },
}

impl Record {
  /// The message header, whichever body the datagram carried
  pub fn header(&self) -> &Header {
    match self {
      Record::Snapshot(s) => &s.header,
      Record::Warrant(w) => &w.header,
      Record::Unknown { header, .. } => header,
    }
  }

  pub fn format_code(&self) -> u8 {
    self.header().format_code
  }
}
