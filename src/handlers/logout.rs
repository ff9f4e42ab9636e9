use axum::{extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;

use crate::session::SESSION_COOKIE_NAME;
use crate::state::AppState;

/// ログアウトハンドラー
///
/// POST /api/logout
///
/// セッションを破棄し、Cookie を削除する。
/// セッションが無い場合も成功として扱う。
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let had_session = jar.get(SESSION_COOKIE_NAME).is_some();
    let jar = state.sessions.destroy(jar).await;

    if had_session {
        tracing::info!("ログアウト完了");
    }

    (jar, StatusCode::NO_CONTENT)
}
