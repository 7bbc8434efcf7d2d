//! ホテル在庫レコードの検索・一括登録
//!
//! - `domain`: レコード型と検索述語の構築
//! - `application`: 検索結果の分類（NotFound / Internal / InvalidInput）
//! - `infrastructure`: SQLiteストア、ログ、設定

// ドメイン層モジュール
pub mod domain;

// アプリケーション層モジュール
pub mod application;

// インフラ層モジュール
pub mod infrastructure;
