/// ホテルレコード
///
/// 検索ロジックが参照するのは`location`と`date`のみで、
/// それ以外のフィールド（名称、料金など）は`details`としてそのまま受け渡す。
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// 日時文字列のパースエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date: {input}")]
pub struct DateParseError {
    /// パースできなかった入力
    pub input: String,
}

/// ホテルレコード（永続化済み）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hotel {
    /// ストアが採番するID
    pub id: i64,
    /// 所在地（正規化しない自由文字列）
    pub location: String,
    /// チェックイン等の基準日時（UTC）
    #[serde(default, with = "timestamp")]
    pub date: Option<NaiveDateTime>,
    /// その他のフィールド（そのまま受け渡す）
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// 新規登録用のホテルレコード
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotelInput {
    pub location: String,
    #[serde(default, with = "timestamp")]
    pub date: Option<NaiveDateTime>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl HotelInput {
    /// 採番されたIDを付与して永続化済みレコードに変換
    ///
    /// 入力側に`id`が含まれていても採番値を優先する。
    pub fn into_hotel(self, id: i64) -> Hotel {
        let mut details = self.details;
        details.remove("id");
        Hotel {
            id,
            location: self.location,
            date: self.date,
            details,
        }
    }
}

/// 日時文字列をUTCの`NaiveDateTime`にパースする
///
/// 受け付ける形式:
/// - RFC 3339（`Z`またはオフセット付き、UTCに変換）
/// - `YYYY-MM-DDTHH:MM[:SS[.fff]]` / `YYYY-MM-DD HH:MM[:SS[.fff]]`（UTCとみなす）
/// - `YYYY-MM-DD`（UTCの0時とみなす）
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime, DateParseError> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(DateParseError {
        input: input.to_string(),
    })
}

/// JSON上の日時表現（`YYYY-MM-DDTHH:MM:SS.fffZ`）
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => super::parse_timestamp(&s).map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}
