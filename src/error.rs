use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("認証エラー: {0}")]
    Authentication(String),

    #[error("ログインが必要です")]
    LoginRequired,

    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("設定エラー: {0}")]
    Configuration(String),

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),

    #[error("このメールアドレスは既に使用されています")]
    EmailAlreadyExists,

    #[error("OAuth認証エラー: {0}")]
    OAuthError(String),

    #[error("この LinkedIn アカウントは連携済みです")]
    AccountAlreadyLinked,

    #[error("OAuthプロバイダーエラー")]
    OAuthProviderError,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "Unrecognized email or password.".to_string(),
            ),
            Self::LoginRequired => (
                StatusCode::UNAUTHORIZED,
                "You must be logged in.".to_string(),
            ),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Configuration(e) => {
                tracing::error!(error = %e, "設定エラー");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Social Post LinkedIn not configured properly. Contact site administrator."
                        .to_string(),
                )
            }
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred.".to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred.".to_string(),
                )
            }
            Self::EmailAlreadyExists => (
                StatusCode::CONFLICT,
                "The email address is already taken.".to_string(),
            ),
            Self::OAuthError(e) => {
                tracing::error!(error = %e, "OAuth認証エラー");
                (
                    StatusCode::UNAUTHORIZED,
                    "You could not be authenticated.".to_string(),
                )
            }
            Self::AccountAlreadyLinked => (
                StatusCode::CONFLICT,
                "You have already authorized to post on behalf of this user.".to_string(),
            ),
            Self::OAuthProviderError => (
                StatusCode::BAD_GATEWAY,
                "Failed to communicate with LinkedIn.".to_string(),
            ),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_is_service_unavailable() {
        let response = AppError::Configuration("missing client id".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_login_required_is_unauthorized() {
        let response = AppError::LoginRequired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_account_already_linked_is_conflict() {
        let response = AppError::AccountAlreadyLinked.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
