/// ログ基盤モジュール
///
/// tracingクレートを使用した構造化ログ設定と、
/// アプリケーション層に注入する診断ロガーを提供する。
use std::sync::Once;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// ログサブスクライバー初期化用の同期プリミティブ
static INIT: Once = Once::new();

/// ログサブスクライバーを初期化する
///
/// JSON形式での構造化ログ出力を設定し、環境変数`RUST_LOG`または
/// デフォルトのログレベル（info）でフィルタリングを行う。
///
/// この関数は複数回呼び出しても安全で、最初の呼び出しのみ初期化を実行する。
pub fn init_logging() {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .flatten_event(true)
            .with_current_span(false);

        // テストなどで既に登録済みの場合は何もしない
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init();
    });
}

/// テスト用のログサブスクライバーを初期化する（人間が読みやすい形式）
#[cfg(test)]
pub fn init_test_logging() {
    static TEST_INIT: Once = Once::new();

    TEST_INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_target(true)
            .compact();

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();
    });
}

/// 診断ログに付与する構造化フィールド
///
/// 指定されたものだけが`tracing`のフィールドとして出力される。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFields {
    /// 検索条件（`location=Paris, date=2024-05-10`形式）
    pub filters: Option<String>,
    /// 件数
    pub count: Option<usize>,
    /// 失敗の原因
    pub error: Option<String>,
}

impl LogFields {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn filters(filters: impl Into<String>) -> Self {
        Self {
            filters: Some(filters.into()),
            ..Self::default()
        }
    }

    pub fn count(count: usize) -> Self {
        Self {
            count: Some(count),
            ..Self::default()
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

/// 診断ログ出力の抽象化
///
/// サービス層はこのトレイト経由でログを出力するため、
/// 具体的なログ基盤なしでテストできる。
pub trait DiagnosticLogger: Send + Sync {
    fn info(&self, message: &str, fields: LogFields);
    fn warn(&self, message: &str, fields: LogFields);
    fn error(&self, message: &str, fields: LogFields);
}

/// tracingへ転送する診断ロガー
///
/// 出力元コンポーネント名を`component`フィールドとして付与する。
#[derive(Debug, Clone, Copy)]
pub struct TracingLogger {
    component: &'static str,
}

impl TracingLogger {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn component(&self) -> &'static str {
        self.component
    }
}

impl DiagnosticLogger for TracingLogger {
    fn info(&self, message: &str, fields: LogFields) {
        tracing::info!(
            component = self.component,
            filters = fields.filters.as_deref(),
            count = fields.count.map(|c| c as u64),
            "{}",
            message
        );
    }

    fn warn(&self, message: &str, fields: LogFields) {
        tracing::warn!(
            component = self.component,
            filters = fields.filters.as_deref(),
            count = fields.count.map(|c| c as u64),
            "{}",
            message
        );
    }

    fn error(&self, message: &str, fields: LogFields) {
        tracing::error!(
            component = self.component,
            filters = fields.filters.as_deref(),
            count = fields.count.map(|c| c as u64),
            error = fields.error.as_deref(),
            "{}",
            message
        );
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// ログレベル（記録用）
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Level {
        Info,
        Warn,
        Error,
    }

    /// 記録されたログ1件
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Entry {
        pub level: Level,
        pub message: String,
        pub fields: LogFields,
    }

    /// 出力されたログを記録するテスト用ロガー
    #[derive(Clone, Default)]
    pub struct RecordingLogger {
        entries: Arc<Mutex<Vec<Entry>>>,
    }

    impl RecordingLogger {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn entries(&self) -> Vec<Entry> {
            self.entries.lock().unwrap().clone()
        }

        /// 指定レベルのログのみ取得
        pub fn at(&self, level: Level) -> Vec<Entry> {
            self.entries()
                .into_iter()
                .filter(|e| e.level == level)
                .collect()
        }

        /// 指定レベルのメッセージのみ取得
        pub fn messages(&self, level: Level) -> Vec<String> {
            self.at(level).into_iter().map(|e| e.message).collect()
        }

        fn push(&self, level: Level, message: &str, fields: LogFields) {
            self.entries.lock().unwrap().push(Entry {
                level,
                message: message.to_string(),
                fields,
            });
        }
    }

    impl DiagnosticLogger for RecordingLogger {
        fn info(&self, message: &str, fields: LogFields) {
            self.push(Level::Info, message, fields);
        }

        fn warn(&self, message: &str, fields: LogFields) {
            self.push(Level::Warn, message, fields);
        }

        fn error(&self, message: &str, fields: LogFields) {
            self.push(Level::Error, message, fields);
        }
    }

    #[test]
    fn test_init_logging_idempotent() {
        init_test_logging();
        init_test_logging();
        init_logging();
        init_logging();
    }

    #[test]
    fn test_tracing_logger_emits_all_levels() {
        init_test_logging();

        let logger = TracingLogger::new("test");
        assert_eq!(logger.component(), "test");
        logger.info("info level log", LogFields::none());
        logger.warn("warn level log", LogFields::filters("location=Paris"));
        logger.error(
            "error level log",
            LogFields::filters("ALL").with_count(0).with_error("disk I/O error"),
        );
    }

    #[test]
    fn test_recording_logger_keeps_order_and_level() {
        let logger = RecordingLogger::new();
        logger.info("a", LogFields::none());
        logger.warn("b", LogFields::filters("location=Paris"));
        logger.error("c", LogFields::none().with_error("boom"));
        logger.info("d", LogFields::count(3));

        let levels: Vec<Level> = logger.entries().iter().map(|e| e.level).collect();
        assert_eq!(
            levels,
            vec![Level::Info, Level::Warn, Level::Error, Level::Info]
        );
        assert_eq!(logger.messages(Level::Info), vec!["a", "d"]);
        assert_eq!(logger.at(Level::Info)[1].fields.count, Some(3));
        assert_eq!(
            logger.at(Level::Warn)[0].fields.filters.as_deref(),
            Some("location=Paris")
        );
        assert_eq!(
            logger.at(Level::Error)[0].fields.error.as_deref(),
            Some("boom")
        );
    }

    #[test]
    fn test_log_fields_builders() {
        let fields = LogFields::filters("location=Paris")
            .with_count(2)
            .with_error("locked");
        assert_eq!(
            fields,
            LogFields {
                filters: Some("location=Paris".to_string()),
                count: Some(2),
                error: Some("locked".to_string()),
            }
        );
        assert_eq!(LogFields::none(), LogFields::default());
    }

    /// JSON形式のログ設定が構築できることを確認
    #[test]
    fn test_json_logging_configuration() {
        let env_filter = EnvFilter::new("info");
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .flatten_event(true);

        let _subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer);
    }
}
