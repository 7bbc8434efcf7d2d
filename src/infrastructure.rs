// インフラ層モジュール
pub mod config;
pub mod hotel_store;
pub mod logging;
pub mod sqlite_hotel_store;

// 再エクスポート
pub use config::{AppConfig, ConfigError};
pub use hotel_store::{HotelStore, StoreError};
pub use logging::{DiagnosticLogger, LogFields, TracingLogger, init_logging};
pub use sqlite_hotel_store::SqliteHotelStore;
