use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

/// ヘルスチェックレスポンス
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// LinkedIn クライアントID・シークレットが設定済みか
    pub linkedin_configured: bool,
}

/// ヘルスチェックハンドラー
///
/// GET /api/health
///
/// LinkedIn 未設定でもサービス自体は稼働扱い（連携・投稿のみ利用不可）。
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        linkedin_configured: state.linkedin_network.is_configured(),
    })
}
