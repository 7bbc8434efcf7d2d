// アプリケーション設定
//
// 環境変数からデータベースパスとリッスンアドレスを読み込む

use std::net::SocketAddr;

use thiserror::Error;

/// データベースパス環境変数名
pub const DB_PATH_ENV: &str = "DB_PATH";

/// リッスンアドレス環境変数名
pub const LISTEN_ADDR_ENV: &str = "LISTEN_ADDR";

/// デフォルトのデータベースパス
pub const DEFAULT_DB_PATH: &str = "hotels.db";

/// デフォルトのリッスンアドレス
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// 設定エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// リッスンアドレスがソケットアドレスとして解釈できない
    #[error("LISTEN_ADDRの値が不正です: {0}")]
    InvalidListenAddr(String),
}

/// アプリケーション設定
///
/// # フィールド
/// - `db_path`: SQLiteデータベースファイルのパス
/// - `listen_addr`: HTTPサーバーのリッスンアドレス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    db_path: String,
    listen_addr: SocketAddr,
}

impl AppConfig {
    pub fn new(db_path: impl Into<String>, listen_addr: SocketAddr) -> Self {
        Self {
            db_path: db_path.into(),
            listen_addr,
        }
    }

    /// 環境変数から設定を読み込み
    ///
    /// # 環境変数
    /// - `DB_PATH`: データベースファイルのパス（デフォルト: hotels.db）
    /// - `LISTEN_ADDR`: リッスンアドレス（デフォルト: 127.0.0.1:8080）
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path = std::env::var(DB_PATH_ENV).unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

        let listen_addr_raw =
            std::env::var(LISTEN_ADDR_ENV).unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidListenAddr(listen_addr_raw.clone()))?;

        Ok(Self {
            db_path,
            listen_addr,
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }
}
