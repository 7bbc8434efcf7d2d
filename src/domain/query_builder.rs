/// 検索条件の構築
///
/// 任意の所在地文字列と任意の日付文字列から、ストアに渡す検索述語を生成する。
/// 日付は常に「その暦日全体」（00:00:00.000〜23:59:59.999）の範囲として扱い、
/// 時刻の完全一致では比較しない。
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use super::hotel::{DateParseError, Hotel, parse_timestamp};

/// 1日の長さからミリ秒1つ分を引いた値（23:59:59.999までの経過ミリ秒）
const DAY_WINDOW_MILLIS: i64 = 24 * 60 * 60 * 1000 - 1;

/// 暦日1日分の閉区間 `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DayWindow {
    /// 指定日の0:00:00.000〜23:59:59.999
    pub fn for_date(date: NaiveDate) -> Self {
        let start = date.and_time(NaiveTime::MIN);
        Self {
            start,
            end: start + TimeDelta::milliseconds(DAY_WINDOW_MILLIS),
        }
    }

    /// 日時を含む暦日のウィンドウ（時刻部分は無視される）
    pub fn containing(timestamp: NaiveDateTime) -> Self {
        Self::for_date(timestamp.date())
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    /// 両端を含む
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// ストアに渡す検索述語
///
/// 所在地の完全一致と日単位の範囲一致の2条件をAND結合する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// 条件なし（全件）
    NoFilter,
    /// 所在地の完全一致のみ
    LocationOnly(String),
    /// 日単位の範囲一致のみ
    DateRangeOnly(DayWindow),
    /// 所在地と日付の両方
    Both { location: String, window: DayWindow },
}

impl Predicate {
    /// 条件が1つもないか
    pub fn is_empty(&self) -> bool {
        matches!(self, Predicate::NoFilter)
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Predicate::LocationOnly(location) | Predicate::Both { location, .. } => {
                Some(location.as_str())
            }
            Predicate::NoFilter | Predicate::DateRangeOnly(_) => None,
        }
    }

    pub fn window(&self) -> Option<&DayWindow> {
        match self {
            Predicate::DateRangeOnly(window) | Predicate::Both { window, .. } => Some(window),
            Predicate::NoFilter | Predicate::LocationOnly(_) => None,
        }
    }

    /// レコードが述語を満たすか
    ///
    /// 日付を持たないレコードは日付条件に一致しない。
    pub fn matches(&self, hotel: &Hotel) -> bool {
        let location_ok = self.location().is_none_or(|l| hotel.location == l);
        let date_ok = match self.window() {
            None => true,
            Some(window) => hotel.date.is_some_and(|d| window.contains(d)),
        };
        location_ok && date_ok
    }

    /// 有効な条件を診断用の文字列にする（例: `location=Paris, date=2024-05-10`）
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(location) = self.location() {
            parts.push(format!("location={}", location));
        }
        if let Some(window) = self.window() {
            parts.push(format!("date={}", window.date()));
        }

        if parts.is_empty() {
            "ALL".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// 検索述語ビルダー
pub struct QueryBuilder;

impl QueryBuilder {
    /// 任意の所在地・日付から検索述語を構築する
    ///
    /// - 空文字列の所在地・日付は指定なしとみなす（トリムや大文字小文字の正規化はしない）
    /// - 日付はパースに失敗した場合`DateParseError`を返す
    pub fn build(location: Option<&str>, date: Option<&str>) -> Result<Predicate, DateParseError> {
        let location = location.filter(|l| !l.is_empty()).map(str::to_string);
        let window = date
            .filter(|d| !d.is_empty())
            .map(|d| parse_timestamp(d).map(DayWindow::containing))
            .transpose()?;

        Ok(match (location, window) {
            (None, None) => Predicate::NoFilter,
            (Some(location), None) => Predicate::LocationOnly(location),
            (None, Some(window)) => Predicate::DateRangeOnly(window),
            (Some(location), Some(window)) => Predicate::Both { location, window },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").unwrap()
    }

    fn hotel(location: &str, date: Option<&str>) -> Hotel {
        Hotel {
            id: 1,
            location: location.to_string(),
            date: date.map(ts),
            details: Map::new(),
        }
    }

    // ========================================
    // DayWindow のテスト
    // ========================================

    #[test]
    fn test_day_window_bounds() {
        let window = DayWindow::for_date(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        assert_eq!(window.start(), ts("2024-05-10 00:00:00"));
        assert_eq!(window.end(), ts("2024-05-10 23:59:59.999"));
    }

    #[test]
    fn test_day_window_contains_is_inclusive() {
        let window = DayWindow::containing(ts("2024-05-10 12:00:00"));
        assert!(window.contains(ts("2024-05-10 00:00:00")));
        assert!(window.contains(ts("2024-05-10 23:59:59.999")));
        assert!(!window.contains(ts("2024-05-09 23:59:59.999")));
        assert!(!window.contains(ts("2024-05-11 00:00:00")));
    }

    /// 時刻部分が異なっても同じ暦日なら同一のウィンドウになる
    #[test]
    fn test_window_ignores_time_of_day() {
        let late = QueryBuilder::build(None, Some("2024-05-10T23:00:00")).unwrap();
        let early = QueryBuilder::build(None, Some("2024-05-10T00:00:01")).unwrap();
        let date_only = QueryBuilder::build(None, Some("2024-05-10")).unwrap();

        assert_eq!(late.window(), early.window());
        assert_eq!(late.window(), date_only.window());
    }

    /// 月末・年末の境界でも同じ日に収まる
    #[test]
    fn test_window_at_year_end() {
        let predicate = QueryBuilder::build(None, Some("2024-12-31T18:00:00")).unwrap();
        let window = predicate.window().unwrap();
        assert_eq!(window.start(), ts("2024-12-31 00:00:00"));
        assert_eq!(window.end(), ts("2024-12-31 23:59:59.999"));
    }

    // ========================================
    // QueryBuilder::build のテスト
    // ========================================

    #[test]
    fn test_build_without_inputs_is_no_filter() {
        let predicate = QueryBuilder::build(None, None).unwrap();
        assert_eq!(predicate, Predicate::NoFilter);
        assert!(predicate.is_empty());
        assert!(predicate.matches(&hotel("Paris", None)));
        assert!(predicate.matches(&hotel("Tokyo", Some("2020-01-01 10:00:00"))));
    }

    #[test]
    fn test_build_location_only() {
        let predicate = QueryBuilder::build(Some("Paris"), None).unwrap();
        assert_eq!(predicate, Predicate::LocationOnly("Paris".to_string()));
        assert!(!predicate.is_empty());
    }

    #[test]
    fn test_build_empty_location_is_ignored() {
        let predicate = QueryBuilder::build(Some(""), None).unwrap();
        assert_eq!(predicate, Predicate::NoFilter);
    }

    /// フォームの空欄（`date=`）は日付指定なしと同じ
    #[test]
    fn test_build_empty_date_is_ignored() {
        assert_eq!(QueryBuilder::build(None, Some("")).unwrap(), Predicate::NoFilter);
        assert_eq!(
            QueryBuilder::build(Some("Paris"), Some("")).unwrap(),
            Predicate::LocationOnly("Paris".to_string())
        );
    }

    #[test]
    fn test_build_date_only() {
        let predicate = QueryBuilder::build(None, Some("2024-05-10")).unwrap();
        assert!(matches!(predicate, Predicate::DateRangeOnly(_)));
        assert_eq!(predicate.location(), None);
    }

    #[test]
    fn test_build_both() {
        let predicate = QueryBuilder::build(Some("Paris"), Some("2024-05-10")).unwrap();
        match predicate {
            Predicate::Both { location, window } => {
                assert_eq!(location, "Paris");
                assert_eq!(window.start(), ts("2024-05-10 00:00:00"));
            }
            other => panic!("Bothを期待したが{:?}", other),
        }
    }

    #[test]
    fn test_build_invalid_date_is_error() {
        let err = QueryBuilder::build(Some("Paris"), Some("not-a-date")).unwrap_err();
        assert_eq!(err.input, "not-a-date");
    }

    // ========================================
    // Predicate::matches のテスト
    // ========================================

    /// 所在地は大文字小文字・空白を区別した完全一致
    #[test]
    fn test_location_match_is_exact() {
        let predicate = QueryBuilder::build(Some("Paris"), None).unwrap();
        assert!(predicate.matches(&hotel("Paris", None)));
        assert!(!predicate.matches(&hotel("paris", None)));
        assert!(!predicate.matches(&hotel("Paris ", None)));
        assert!(!predicate.matches(&hotel("Paris, France", None)));
    }

    #[test]
    fn test_date_match_covers_whole_day() {
        let predicate = QueryBuilder::build(None, Some("2024-05-10T15:30:00")).unwrap();
        assert!(predicate.matches(&hotel("A", Some("2024-05-10 00:00:00"))));
        assert!(predicate.matches(&hotel("B", Some("2024-05-10 08:00:00"))));
        assert!(predicate.matches(&hotel("C", Some("2024-05-10 23:59:59.999"))));
        assert!(!predicate.matches(&hotel("D", Some("2024-05-11 00:00:00"))));
        assert!(!predicate.matches(&hotel("E", None)));
    }

    #[test]
    fn test_both_clauses_are_anded() {
        let predicate = QueryBuilder::build(Some("Paris"), Some("2024-05-10")).unwrap();
        assert!(predicate.matches(&hotel("Paris", Some("2024-05-10 20:00:00"))));
        assert!(!predicate.matches(&hotel("Paris", Some("2024-05-11 20:00:00"))));
        assert!(!predicate.matches(&hotel("Lyon", Some("2024-05-10 20:00:00"))));
    }

    // ========================================
    // Predicate::describe のテスト
    // ========================================

    #[test]
    fn test_describe() {
        assert_eq!(QueryBuilder::build(None, None).unwrap().describe(), "ALL");
        assert_eq!(
            QueryBuilder::build(Some("Paris"), None).unwrap().describe(),
            "location=Paris"
        );
        assert_eq!(
            QueryBuilder::build(None, Some("2024-05-10T09:00:00")).unwrap().describe(),
            "date=2024-05-10"
        );
        assert_eq!(
            QueryBuilder::build(Some("Paris"), Some("2024-05-10"))
                .unwrap()
                .describe(),
            "location=Paris, date=2024-05-10"
        );
    }
}
