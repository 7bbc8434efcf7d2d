/// ホテルレコードストアの抽象化
///
/// 検索（find）と一括登録（insert_many）の2操作のみを提供する。
/// 実装: SQLite（本番）、インメモリのモック（テスト用）
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Hotel, HotelInput, Predicate};

/// ストアエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// データベースエラー（制約違反を含む）
    #[error("Database error: {0}")]
    Database(String),

    /// プール取得エラー
    #[error("Pool error: {0}")]
    Pool(String),

    /// 接続構築エラー
    #[error("Build error: {0}")]
    Build(String),

    /// 付随フィールドのシリアライズ/デシリアライズに失敗
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// ホテルレコードストア
#[async_trait]
pub trait HotelStore: Send + Sync {
    /// 述語に一致するレコードをID昇順で取得
    async fn find(&self, predicate: &Predicate) -> Result<Vec<Hotel>, StoreError>;

    /// レコードを一括登録する
    ///
    /// 全件が保存されるか、1件も保存されないかのどちらか。
    /// 戻り値は入力と同じ順序で、採番済みIDを持つ。
    async fn insert_many(&self, records: Vec<HotelInput>) -> Result<Vec<Hotel>, StoreError>;
}
