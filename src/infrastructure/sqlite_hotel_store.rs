//! SQLiteホテルストア
//!
//! ホテルレコードの検索・一括登録機能を提供する。
//! - 書き込み: 専用の単一接続（Arc<Mutex<Connection>>）
//! - 読み取り: deadpool-sqliteによるasync接続プール

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use deadpool_sqlite::{Config, Pool, Runtime};
use rusqlite::Connection;
use serde_json::{Map, Value};

use super::hotel_store::{HotelStore, StoreError};
use crate::domain::{Hotel, HotelInput, Predicate};

/// 日時カラムの保存形式（固定長のため文字列比較が時系列比較と一致する）
const DATE_COLUMN_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<deadpool_sqlite::BuildError> for StoreError {
    fn from(err: deadpool_sqlite::BuildError) -> Self {
        StoreError::Build(err.to_string())
    }
}

impl From<deadpool_sqlite::PoolError> for StoreError {
    fn from(err: deadpool_sqlite::PoolError) -> Self {
        StoreError::Pool(err.to_string())
    }
}

impl From<deadpool_sqlite::InteractError> for StoreError {
    fn from(err: deadpool_sqlite::InteractError) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// SQLiteデータベースのスキーマを定義するSQL
const SCHEMA_SQL: &str = r#"
-- WALモード設定
PRAGMA journal_mode=WAL;
PRAGMA synchronous=NORMAL;

-- ホテルテーブル
CREATE TABLE IF NOT EXISTS hotels (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    location TEXT NOT NULL CHECK (length(location) > 0),
    date TEXT,                      -- YYYY-MM-DDTHH:MM:SS.fff (UTC)
    details_json TEXT NOT NULL      -- location/date以外のフィールド
);

-- インデックス定義
CREATE INDEX IF NOT EXISTS idx_hotels_location ON hotels(location);
CREATE INDEX IF NOT EXISTS idx_hotels_date ON hotels(date);
CREATE INDEX IF NOT EXISTS idx_hotels_location_date ON hotels(location, date);
"#;

/// SQLiteホテルストア
pub struct SqliteHotelStore {
    /// 書き込み専用接続（一括登録はトランザクション単位で直列化する）
    write_conn: Arc<Mutex<Connection>>,
    /// 読み取り用async接続プール
    read_pool: Pool,
}

impl SqliteHotelStore {
    /// 新しいSqliteHotelStoreを作成
    ///
    /// データベースファイルを開き、スキーマを初期化する。
    ///
    /// # Arguments
    /// * `db_path` - データベースファイルのパス
    pub async fn new(db_path: &str) -> Result<Self, StoreError> {
        let write_conn = Connection::open(db_path)?;
        write_conn.execute_batch(SCHEMA_SQL)?;

        let read_pool = Config::new(db_path)
            .builder(Runtime::Tokio1)
            .map_err(|e| StoreError::Build(e.to_string()))?
            .max_size(4)
            .build()?;

        Ok(Self {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
        })
    }

    /// 検索クエリを実行（内部用）
    fn execute_find(conn: &Connection, predicate: &Predicate) -> Result<Vec<Hotel>, StoreError> {
        let (where_clause, params) = Self::build_where_clause(predicate);
        let sql = format!(
            "SELECT id, location, date, details_json FROM hotels {} ORDER BY id ASC",
            where_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();

        let rows = stmt.query_map(params_refs.as_slice(), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut hotels = Vec::new();
        for row in rows {
            let (id, location, date, details_json) = row?;
            hotels.push(Hotel {
                id,
                location,
                date: date.as_deref().map(Self::decode_date).transpose()?,
                details: Self::decode_details(&details_json)?,
            });
        }
        Ok(hotels)
    }

    /// WHERE句とパラメータを構築（内部用）
    fn build_where_clause(predicate: &Predicate) -> (String, Vec<String>) {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(location) = predicate.location() {
            params.push(location.to_string());
            conditions.push(format!("location = ?{}", params.len()));
        }

        if let Some(window) = predicate.window() {
            params.push(Self::encode_date(window.start()));
            conditions.push(format!("date >= ?{}", params.len()));
            params.push(Self::encode_date(window.end()));
            conditions.push(format!("date <= ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn encode_date(date: NaiveDateTime) -> String {
        date.format(DATE_COLUMN_FORMAT).to_string()
    }

    fn decode_date(text: &str) -> Result<NaiveDateTime, StoreError> {
        NaiveDateTime::parse_from_str(text, DATE_COLUMN_FORMAT)
            .map_err(|e| StoreError::Serialization(format!("date column '{}': {}", text, e)))
    }

    fn decode_details(json: &str) -> Result<Map<String, Value>, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl HotelStore for SqliteHotelStore {
    /// 読み取りプールから接続を取得し、並行実行可能。
    async fn find(&self, predicate: &Predicate) -> Result<Vec<Hotel>, StoreError> {
        let predicate = predicate.clone();
        let conn = self.read_pool.get().await?;

        conn.interact(move |conn| Self::execute_find(conn, &predicate))
            .await?
    }

    /// 書き込み専用接続を使用し、トランザクションで原子的に実行する。
    /// 途中の1件でも失敗した場合はロールバックされ、何も保存されない。
    async fn insert_many(&self, records: Vec<HotelInput>) -> Result<Vec<Hotel>, StoreError> {
        let conn = self.write_conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| StoreError::Database("write connection lock poisoned".to_string()))?;

            // コミット前にドロップされた場合はロールバックされる
            let tx = conn.transaction()?;
            let mut created = Vec::with_capacity(records.len());
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO hotels (location, date, details_json) VALUES (?1, ?2, ?3)",
                )?;

                for record in records {
                    // 保存形式はミリ秒精度のため、返却値も保存値に揃える
                    let date = record.date.map(Self::encode_date);
                    let mut details = record.details;
                    details.remove("id");
                    let details_json = serde_json::to_string(&details)
                        .map_err(|e| StoreError::Serialization(e.to_string()))?;

                    stmt.execute(rusqlite::params![&record.location, &date, &details_json])?;
                    let id = tx.last_insert_rowid();

                    created.push(Hotel {
                        id,
                        location: record.location,
                        date: date.as_deref().map(Self::decode_date).transpose()?,
                        details,
                    });
                }
            }
            tx.commit()?;

            Ok(created)
        })
        .await
        .map_err(|e| StoreError::Database(format!("task join error: {}", e)))?
    }
}
