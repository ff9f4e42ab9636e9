use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::error::AppError;
use crate::models::SocialPostAccount;
use crate::services::network::LINKEDIN_PLUGIN_ID;
use crate::state::AppState;

/// 連携アカウント一覧レスポンス
#[derive(Debug, Serialize)]
pub struct AccountsResponse {
    /// アクセストークンは含まない
    pub accounts: Vec<SocialPostAccount>,
}

/// 連携済み LinkedIn アカウント一覧ハンドラー
///
/// GET /api/social-post/linkedin/accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<AccountsResponse>, AppError> {
    let session = state
        .sessions
        .find(&jar)
        .await
        .ok_or(AppError::LoginRequired)?;
    let user_id = session.user_id().await.ok_or(AppError::LoginRequired)?;

    let accounts = state
        .account_repo
        .list_by_user(user_id, LINKEDIN_PLUGIN_ID)
        .await?;

    Ok(Json(AccountsResponse { accounts }))
}
