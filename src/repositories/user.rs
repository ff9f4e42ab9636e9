use sqlx::PgPool;

use crate::error::AppError;
use crate::models::User;
use crate::repositories::is_unique_violation;

const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

/// サイトユーザーの永続化
///
/// メールアドレスは前後の空白を除き小文字化して保存・検索する。
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// ユーザーを作成
    ///
    /// # Errors
    /// メールアドレスが使用済みの場合は `AppError::EmailAlreadyExists`
    pub async fn create(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(normalize_email(email))
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, EMAIL_UNIQUE_CONSTRAINT) {
                return AppError::EmailAlreadyExists;
            }
            AppError::Database(e)
        })
    }
}

/// 照合用にメールアドレスを正規化
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
