// アプリケーション層モジュール
pub mod lookup_service;

// 再エクスポート
pub use lookup_service::{HotelLookupService, LookupError};
