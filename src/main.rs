//! ホテル在庫レコード検索用HTTP APIサーバー
//!
//! 本バイナリは以下の機能を提供する:
//! - 全件取得 (GET /hotel-info/all)
//! - 一括登録 (POST /hotel-info/create)
//! - 所在地・日付での検索 (GET /hotel-info/findByLocation)
//! - 所在地・日付（必須）での検索 (GET /hotel-info/findLateCheckIn)
//! - ヘルスチェック (GET /health)

mod error;

use error::ApiError;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use hotel_info::application::HotelLookupService;
use hotel_info::domain::HotelInput;
use hotel_info::infrastructure::{AppConfig, SqliteHotelStore, TracingLogger, init_logging};
use serde::Deserialize;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// 本番構成の検索サービス
pub type LookupService = HotelLookupService<SqliteHotelStore, TracingLogger>;

/// アプリケーション状態
///
/// ルーター全体で共有される状態を保持する。
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LookupService>,
}

/// 検索クエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub location: Option<String>,
    pub date: Option<String>,
}

/// ヘルスチェックエンドポイント
async fn health() -> &'static str {
    "OK"
}

/// 全件取得エンドポイント (GET /hotel-info/all)
///
/// # Returns
/// - 200 OK: 全レコード（0件の場合は空配列）
/// - 500 Internal Server Error: データベースエラー
async fn get_all_hotels(State(state): State<AppState>) -> Response {
    match state.service.get_all().await {
        Ok(hotels) => Json(hotels).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// 一括登録エンドポイント (POST /hotel-info/create)
///
/// ホテルレコードの配列を受け取り、全件を1トランザクションで保存する。
///
/// # Returns
/// - 201 Created: 採番済みのレコード配列（入力と同じ順序）
/// - 400 Bad Request: リクエストボディが不正
/// - 500 Internal Server Error: データベースエラー（1件も保存されない）
async fn create_hotels(
    State(state): State<AppState>,
    payload: Result<Json<Vec<HotelInput>>, JsonRejection>,
) -> Response {
    let Json(records) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "不正な登録リクエスト");
            return ApiError::from(rejection).into_response();
        }
    };

    tracing::info!(count = records.len(), "ホテル一括登録リクエストを受信");

    match state.service.create_many(records).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// 所在地検索エンドポイント (GET /hotel-info/findByLocation)
///
/// `location`と`date`はいずれも任意。`date`は暦日単位で一致判定する。
///
/// # Returns
/// - 200 OK: 一致したレコード
/// - 400 Bad Request: 日付が解釈できない
/// - 404 Not Found: 一致するレコードがない
/// - 500 Internal Server Error: データベースエラー
async fn find_by_location(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    tracing::debug!(location = ?params.location, date = ?params.date, "所在地検索リクエストを受信");

    match state
        .service
        .find_by_location(params.location.as_deref(), params.date.as_deref())
        .await
    {
        Ok(hotels) => Json(hotels).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// 所在地・日付検索エンドポイント (GET /hotel-info/findLateCheckIn)
///
/// `date`は必須、`location`は任意。
///
/// # Returns
/// - 200 OK: 一致したレコード
/// - 400 Bad Request: 日付が未指定または解釈できない
/// - 404 Not Found: 一致するレコードがない
/// - 500 Internal Server Error: データベースエラー
async fn find_by_location_and_date(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    // フォームの空欄（`date=`）も未指定とみなす
    let Some(date) = params.date.as_deref().filter(|d| !d.is_empty()) else {
        return ApiError::bad_request("date is required").into_response();
    };

    match state
        .service
        .find_by_location_and_date(params.location.as_deref(), date)
        .await
    {
        Ok(hotels) => Json(hotels).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// ルーターを構築する
///
/// TraceLayerによりリクエスト/レスポンスの構造化ログを自動記録する。
pub fn create_router(service: Arc<LookupService>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/health", get(health))
        .route("/hotel-info/all", get(get_all_hotels))
        .route("/hotel-info/create", post(create_hotels))
        .route("/hotel-info/findByLocation", get(find_by_location))
        .route("/hotel-info/findLateCheckIn", get(find_by_location_and_date))
        // リクエストトレーシングレイヤー（method, path, status, latencyを自動記録）
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// シャットダウンシグナルを待機する
///
/// SIGTERMまたはCtrl+C (SIGINT) を待機し、いずれかを受信したらリターンする。
///
/// # Panics
/// シグナルハンドラーの登録に失敗した場合はパニックする。
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Ctrl+C シグナルハンドラーの登録に失敗しました");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM シグナルハンドラーの登録に失敗しました")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C (SIGINT) を受信しました。graceful shutdownを開始します");
        }
        _ = terminate => {
            tracing::info!("SIGTERM を受信しました。graceful shutdownを開始します");
        }
    }
}

/// メイン関数
///
/// # 環境変数
/// - `DB_PATH`: データベースファイルのパス（デフォルト: hotels.db）
/// - `LISTEN_ADDR`: リッスンアドレス（デフォルト: 127.0.0.1:8080）
/// - `RUST_LOG`: ログレベル（デフォルト: info）
#[tokio::main]
async fn main() {
    init_logging();

    tracing::info!("ホテル情報 API サーバーを起動します");

    let config = AppConfig::from_env().unwrap_or_else(|e| panic!("設定の読み込みに失敗しました: {}", e));
    tracing::info!(db_path = config.db_path(), "データベースパスを読み込みました");

    let store = SqliteHotelStore::new(config.db_path())
        .await
        .expect("SQLiteストアの初期化に失敗しました");
    tracing::info!("SQLiteストアを初期化しました");

    let service = Arc::new(HotelLookupService::new(
        store,
        TracingLogger::new("hotel_lookup_service"),
    ));
    let app = create_router(service);

    let addr = config.listen_addr();
    tracing::info!("リッスン開始: {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("アドレスのバインドに失敗しました");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("サーバーの起動に失敗しました");

    tracing::info!("サーバーが正常に停止しました");
}
