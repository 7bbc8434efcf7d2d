/// ホテル検索サービス
///
/// 検索述語をストアで実行し、結果を分類する。
/// - 検索成功・0件: `LookupError::NotFound`（検索系の操作のみ）
/// - ストア由来の失敗: `LookupError::Internal`（原因を保持）
/// - 日付のパース失敗: `LookupError::InvalidInput`
/// - 日付必須の検索で日付が空: `LookupError::MissingDate`
///
/// 呼び出しごとに独立しており、状態を持たない。
use thiserror::Error;

use crate::domain::{DateParseError, Hotel, HotelInput, Predicate, QueryBuilder};
use crate::infrastructure::{DiagnosticLogger, HotelStore, LogFields, StoreError};

/// 読み取り失敗時にクライアントへ返す汎用メッセージ
const FETCH_FAILED_MESSAGE: &str = "failed to fetch hotel information";

/// 登録失敗時にクライアントへ返す汎用メッセージ
const CREATE_FAILED_MESSAGE: &str = "failed to create hotel entries";

/// 検索サービスのエラー型
#[derive(Debug, Error)]
pub enum LookupError {
    /// 日付フィルターが解釈できない（呼び出し側の誤り）
    #[error(transparent)]
    InvalidInput(#[from] DateParseError),

    /// 日付必須の検索で日付が空
    #[error("date is required")]
    MissingDate,

    /// 検索は成功したが一致するレコードが0件
    #[error("{message} ({filters})")]
    NotFound {
        message: &'static str,
        /// 有効だったフィルター（診断用）
        filters: String,
    },

    /// ストア由来の失敗
    ///
    /// 表示メッセージは汎用文言のみで、原因は`source()`から辿れる。
    #[error("{message}")]
    Internal {
        message: &'static str,
        #[source]
        source: StoreError,
    },
}

impl LookupError {
    fn internal(message: &'static str, source: StoreError) -> Self {
        LookupError::Internal { message, source }
    }
}

/// 条件未指定の表示
fn or_all(value: Option<&str>) -> &str {
    value.unwrap_or("ALL")
}

/// リクエストされた検索条件をそのままログ用フィールドにする
fn requested(location: Option<&str>, date: Option<&str>) -> LogFields {
    LogFields::filters(format!("location={}, date={}", or_all(location), or_all(date)))
}

/// ホテル検索サービス
pub struct HotelLookupService<S, L>
where
    S: HotelStore,
    L: DiagnosticLogger,
{
    store: S,
    logger: L,
}

impl<S, L> HotelLookupService<S, L>
where
    S: HotelStore,
    L: DiagnosticLogger,
{
    pub fn new(store: S, logger: L) -> Self {
        Self { store, logger }
    }

    /// 全件を取得する
    ///
    /// 一覧取得のため、0件でもエラーにはならない。
    pub async fn get_all(&self) -> Result<Vec<Hotel>, LookupError> {
        self.logger.info("Fetching all hotels", LogFields::none());

        match self.store.find(&Predicate::NoFilter).await {
            Ok(hotels) => {
                self.logger.info("Fetched hotels", LogFields::count(hotels.len()));
                Ok(hotels)
            }
            Err(e) => {
                self.logger.error("Failed to fetch hotels", LogFields::none().with_error(&e));
                Err(LookupError::internal(FETCH_FAILED_MESSAGE, e))
            }
        }
    }

    /// レコードを一括登録する
    ///
    /// 全件が1回のストア呼び出しで登録される。失敗時は1件も返さない。
    pub async fn create_many(&self, records: Vec<HotelInput>) -> Result<Vec<Hotel>, LookupError> {
        self.logger.info("Creating hotel entries", LogFields::count(records.len()));

        match self.store.insert_many(records).await {
            Ok(created) => {
                self.logger.info("Created hotels", LogFields::count(created.len()));
                Ok(created)
            }
            Err(e) => {
                self.logger.error("Failed to create hotels", LogFields::none().with_error(&e));
                Err(LookupError::internal(CREATE_FAILED_MESSAGE, e))
            }
        }
    }

    /// 所在地・日付（いずれも任意）で検索する
    ///
    /// 0件の場合は`NotFound`を返す。フィルターなしで0件なら
    /// 「システムにホテルが1件もない」ことを意味する。
    pub async fn find_by_location(
        &self,
        location: Option<&str>,
        date: Option<&str>,
    ) -> Result<Vec<Hotel>, LookupError> {
        self.logger.info("Searching hotels", requested(location, date));

        let predicate = self.build_predicate(location, date)?;
        let message = if predicate.is_empty() {
            "no hotels in the system"
        } else {
            "no hotels matching filters"
        };
        let filters = predicate.describe();

        self.execute(&predicate, message, filters).await
    }

    /// 所在地（任意）と日付（必須）で検索する
    ///
    /// 空の日付は未指定とみなし`MissingDate`を返す。
    /// 0件時のメッセージには所在地と日付の両方を必ず含める。
    pub async fn find_by_location_and_date(
        &self,
        location: Option<&str>,
        date: &str,
    ) -> Result<Vec<Hotel>, LookupError> {
        self.logger.info("Searching hotels with required date", requested(location, Some(date)));

        let predicate = self.build_predicate(location, Some(date))?;
        let Some(window) = predicate.window() else {
            self.logger.warn("Rejected search: date is required", requested(location, None));
            return Err(LookupError::MissingDate);
        };
        let filters = format!(
            "location={}, date={}",
            or_all(predicate.location()),
            window.date()
        );

        self.execute(&predicate, "no hotels matching filters", filters).await
    }

    /// 検索述語を構築する（パース失敗は警告のみ）
    fn build_predicate(
        &self,
        location: Option<&str>,
        date: Option<&str>,
    ) -> Result<Predicate, LookupError> {
        QueryBuilder::build(location, date).map_err(|e| {
            self.logger.warn("Rejected search", requested(location, date).with_error(&e));
            LookupError::from(e)
        })
    }

    /// 検索を実行し、0件なら`message`と`filters`を持つ`NotFound`を返す
    async fn execute(
        &self,
        predicate: &Predicate,
        message: &'static str,
        filters: String,
    ) -> Result<Vec<Hotel>, LookupError> {
        let hotels = match self.store.find(predicate).await {
            Ok(hotels) => hotels,
            Err(e) => {
                self.logger.error(
                    "Failed to fetch hotels",
                    LogFields::filters(predicate.describe()).with_error(&e),
                );
                return Err(LookupError::internal(FETCH_FAILED_MESSAGE, e));
            }
        };

        if hotels.is_empty() {
            self.logger.warn(message, LogFields::filters(filters.as_str()));
            return Err(LookupError::NotFound { message, filters });
        }

        self.logger.info(
            "Found hotels",
            LogFields::filters(predicate.describe()).with_count(hotels.len()),
        );
        Ok(hotels)
    }
}
