use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// ログインリクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1))]
    pub password: String,
}

/// ログインレスポンス
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
}

/// ログインハンドラー
///
/// POST /api/login
///
/// 処理フロー:
/// 1. リクエストバリデーション
/// 2. ユーザー認証（DB照合）
/// 3. セッションIDを再発行し、ユーザーIDを保存
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    // 1. リクエストバリデーション
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // 2. ユーザー認証（DB照合）
    let auth_service = AuthService::new(state.user_repo.clone());
    let user = auth_service
        .authenticate(&request.email, &request.password)
        .await?;

    // 3. セッション固定攻撃対策としてIDを再発行
    let (jar, session) = state.sessions.rotate(jar).await;
    session.set_user_id(user.id).await;

    tracing::info!(user_id = %user.id, "ログイン完了");

    Ok((jar, Json(LoginResponse { user_id: user.id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_rejects_invalid_email() {
        assert!(request("", "password123").validate().is_err());
        assert!(request("invalid-email", "password123").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_password() {
        assert!(request("jane@example.com", "").validate().is_err());
    }

    #[test]
    fn test_validate_valid_request() {
        assert!(request("jane@example.com", "password123").validate().is_ok());
    }
}
