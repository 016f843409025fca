
mod display;
mod header;
mod level;
mod record;
mod snapshot;
mod warrant;
pub use self::display::{DisplayItem, MAX_DEPTH};
pub use self::header::{as_header_raw, Header, HeaderRaw, HEADER_SIZE};
pub use self::level::{LevelKind, Price, PriceLevel, PRICE_SCALE};
pub use self::record::Record;
pub use self::snapshot::{MatchTime, TradeSnapshot, STOCK_CODE_WIDTH};
pub use self::warrant::{
  WarrantDescriptor, BRIEF_NAME_WIDTH, EXPIRATION_DATE_WIDTH,
  RESERVED_WIDTH, SEPARATOR_WIDTH, UNDERLYING_ASSET_WIDTH,
  WARRANT_BODY_WIDTH, WARRANT_TYPE_WIDTH,
};
