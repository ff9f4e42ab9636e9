use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::bulk_post::post_to_accounts;
use crate::services::linkedin::LinkedInPostManager;
use crate::services::network::LINKEDIN_PLUGIN_ID;
use crate::state::AppState;

/// 投稿リクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct PostRequest {
    /// 投稿本文
    #[garde(length(chars, min = 1, max = 3000))]
    pub status: String,
}

/// 投稿レスポンス
#[derive(Debug, Serialize)]
pub struct PostResponse {
    /// 投稿を試みたアカウント数
    pub accounts: usize,
}

/// 連携済み LinkedIn アカウントへの一括投稿ハンドラー
///
/// POST /api/social-post/linkedin/post
///
/// 処理フロー:
/// 1. リクエストバリデーション
/// 2. ログインユーザーの確認
/// 3. OAuth2 クライアントの取得（未設定なら 503）
/// 4. ユーザーの連携アカウントごとに投稿（失敗はログのみ）
pub async fn post_status(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<PostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    // 1. リクエストバリデーション
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // 2. ログインユーザーの確認
    let session = state
        .sessions
        .find(&jar)
        .await
        .ok_or(AppError::LoginRequired)?;
    let user_id = session.user_id().await.ok_or(AppError::LoginRequired)?;

    // 3. OAuth2 クライアントの取得
    let client = state.linkedin_network.get_sdk().ok_or_else(|| {
        AppError::Configuration("LinkedIn client credentials are missing".to_string())
    })?;
    let manager = LinkedInPostManager::new(client);

    // 4. 連携アカウントごとに投稿
    let accounts = state
        .account_repo
        .list_by_user(user_id, LINKEDIN_PLUGIN_ID)
        .await?;
    let attempted =
        post_to_accounts(&manager, &state.token_cipher, &accounts, &request.status).await;

    tracing::info!(user_id = %user_id, accounts = attempted, "LinkedIn 一括投稿完了");

    Ok(Json(PostResponse { accounts: attempted }))
}
