use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewSocialPostAccount, SocialPostAccount};
use crate::repositories::is_unique_violation;

/// (user_id, plugin_id, provider_user_id) の一意制約
const ACCOUNT_UNIQUE_CONSTRAINT: &str = "social_post_accounts_user_plugin_provider_key";

/// 連携アカウントの永続化
///
/// (user_id, plugin_id, provider_user_id) の組で一意。
#[async_trait]
pub trait SocialPostAccountRepository: Send + Sync {
    /// ユーザー・プラグイン・プロバイダユーザーIDで連携アカウントを検索
    async fn find(
        &self,
        user_id: Uuid,
        plugin_id: &str,
        provider_user_id: &str,
    ) -> Result<Option<SocialPostAccount>, AppError>;

    /// ユーザーに紐付く連携アカウント一覧を取得
    async fn list_by_user(
        &self,
        user_id: Uuid,
        plugin_id: &str,
    ) -> Result<Vec<SocialPostAccount>, AppError>;

    /// 連携アカウントを作成
    ///
    /// # Errors
    /// 同じ組み合わせが既に存在する場合は `AppError::AccountAlreadyLinked`
    async fn create(&self, account: NewSocialPostAccount) -> Result<SocialPostAccount, AppError>;
}

/// PostgreSQL 実装
#[derive(Clone)]
pub struct PgSocialPostAccountRepository {
    pool: PgPool,
}

impl PgSocialPostAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SocialPostAccountRepository for PgSocialPostAccountRepository {
    async fn find(
        &self,
        user_id: Uuid,
        plugin_id: &str,
        provider_user_id: &str,
    ) -> Result<Option<SocialPostAccount>, AppError> {
        let account = sqlx::query_as::<_, SocialPostAccount>(
            r#"
            SELECT id, user_id, plugin_id, provider_user_id, name, token_encrypted,
                   profile_url, created_at
            FROM social_post_accounts
            WHERE user_id = $1 AND plugin_id = $2 AND provider_user_id = $3
            "#,
        )
        .bind(user_id)
        .bind(plugin_id)
        .bind(provider_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        plugin_id: &str,
    ) -> Result<Vec<SocialPostAccount>, AppError> {
        let accounts = sqlx::query_as::<_, SocialPostAccount>(
            r#"
            SELECT id, user_id, plugin_id, provider_user_id, name, token_encrypted,
                   profile_url, created_at
            FROM social_post_accounts
            WHERE user_id = $1 AND plugin_id = $2
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .bind(plugin_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    async fn create(&self, account: NewSocialPostAccount) -> Result<SocialPostAccount, AppError> {
        let created = sqlx::query_as::<_, SocialPostAccount>(
            r#"
            INSERT INTO social_post_accounts
                (user_id, plugin_id, provider_user_id, name, token_encrypted, profile_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, plugin_id, provider_user_id, name, token_encrypted,
                      profile_url, created_at
            "#,
        )
        .bind(account.user_id)
        .bind(&account.plugin_id)
        .bind(&account.provider_user_id)
        .bind(&account.name)
        .bind(&account.token_encrypted)
        .bind(&account.profile_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // 並行するコールバックが find の後に同じアカウントを作成した場合
            if is_unique_violation(&e, ACCOUNT_UNIQUE_CONSTRAINT) {
                return AppError::AccountAlreadyLinked;
            }
            AppError::Database(e)
        })?;

        Ok(created)
    }
}
