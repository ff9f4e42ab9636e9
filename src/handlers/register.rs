use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use garde::Validate;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::auth::hash_password;
use crate::state::AppState;

/// 登録リクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[garde(email)]
    pub email: String,
    /// Deserialize 後すぐにハッシュ化する
    #[garde(length(chars, min = 8))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// ユーザー登録ハンドラー
///
/// POST /api/register
///
/// 登録後はそのままログイン状態になり、LinkedIn 連携を開始できる。
/// メールアドレスが使用済みの場合は 409。
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<RegisterResponse>), AppError> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let password_hash = hash_password(&request.password)?;
    let user = state.user_repo.create(&request.email, &password_hash).await?;

    let (jar, session) = state.sessions.rotate(jar).await;
    session.set_user_id(user.id).await;

    tracing::info!(user_id = %user.id, "ユーザー登録完了");

    Ok((
        jar,
        Json(RegisterResponse {
            user_id: user.id,
            email: user.email,
            created_at: user.created_at,
        }),
    ))
}
