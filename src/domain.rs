// ドメイン層モジュール
pub mod hotel;
pub mod query_builder;

// 再エクスポート
pub use hotel::{DateParseError, Hotel, HotelInput, parse_timestamp};
pub use query_builder::{DayWindow, Predicate, QueryBuilder};
