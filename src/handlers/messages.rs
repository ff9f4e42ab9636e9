use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::models::FlashMessage;
use crate::state::AppState;

/// メッセージ一覧レスポンス
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<FlashMessage>,
}

/// 未表示メッセージ取得ハンドラー
///
/// GET /api/messages
///
/// セッションに積まれたメッセージを返し、同時に削除する。
/// セッションが無い場合は空（セッションは作成しない）。
pub async fn messages(State(state): State<AppState>, jar: CookieJar) -> Json<MessagesResponse> {
    let messages = match state.sessions.find(&jar).await {
        Some(session) => session.take_messages().await,
        None => Vec::new(),
    };

    Json(MessagesResponse { messages })
}
