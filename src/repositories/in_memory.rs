//! インメモリの連携アカウントリポジトリ（テスト用）

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewSocialPostAccount, SocialPostAccount};
use crate::repositories::SocialPostAccountRepository;

/// インメモリ実装（テスト用）
#[derive(Debug, Default, Clone)]
pub struct InMemorySocialPostAccountRepository {
    accounts: Arc<RwLock<HashMap<Uuid, SocialPostAccount>>>,
}

impl InMemorySocialPostAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存されている連携アカウント数
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl SocialPostAccountRepository for InMemorySocialPostAccountRepository {
    async fn find(
        &self,
        user_id: Uuid,
        plugin_id: &str,
        provider_user_id: &str,
    ) -> Result<Option<SocialPostAccount>, AppError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|a| {
                a.user_id == user_id
                    && a.plugin_id == plugin_id
                    && a.provider_user_id == provider_user_id
            })
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        plugin_id: &str,
    ) -> Result<Vec<SocialPostAccount>, AppError> {
        let accounts = self.accounts.read().await;
        let mut result: Vec<SocialPostAccount> = accounts
            .values()
            .filter(|a| a.user_id == user_id && a.plugin_id == plugin_id)
            .cloned()
            .collect();
        result.sort_by_key(|a| a.created_at);
        Ok(result)
    }

    async fn create(&self, account: NewSocialPostAccount) -> Result<SocialPostAccount, AppError> {
        let mut accounts = self.accounts.write().await;

        let exists = accounts.values().any(|a| {
            a.user_id == account.user_id
                && a.plugin_id == account.plugin_id
                && a.provider_user_id == account.provider_user_id
        });
        if exists {
            return Err(AppError::AccountAlreadyLinked);
        }

        let created = SocialPostAccount {
            id: Uuid::new_v4(),
            user_id: account.user_id,
            plugin_id: account.plugin_id,
            provider_user_id: account.provider_user_id,
            name: account.name,
            token_encrypted: account.token_encrypted,
            profile_url: account.profile_url,
            created_at: OffsetDateTime::now_utc(),
        };
        accounts.insert(created.id, created.clone());

        Ok(created)
    }
}

mod tests {
    use super::*;

    fn new_account(user_id: Uuid, provider_user_id: &str) -> NewSocialPostAccount {
        NewSocialPostAccount {
            user_id,
            plugin_id: "social_post_linkedin".to_string(),
            provider_user_id: provider_user_id.to_string(),
            name: "Jane Doe".to_string(),
            token_encrypted: vec![1, 2, 3],
            profile_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = InMemorySocialPostAccountRepository::new();
        let user_id = Uuid::new_v4();

        let created = repo.create(new_account(user_id, "li-1")).await.unwrap();
        let found = repo
            .find(user_id, "social_post_linkedin", "li-1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(created.id, found.id);
        assert_eq!(found.name, "Jane Doe");
    }

    #[tokio::test]
    async fn test_find_is_scoped_to_user() {
        let repo = InMemorySocialPostAccountRepository::new();
        repo.create(new_account(Uuid::new_v4(), "li-1")).await.unwrap();

        let found = repo
            .find(Uuid::new_v4(), "social_post_linkedin", "li-1")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_is_rejected() {
        let repo = InMemorySocialPostAccountRepository::new();
        let user_id = Uuid::new_v4();
        repo.create(new_account(user_id, "li-1")).await.unwrap();

        let result = repo.create(new_account(user_id, "li-1")).await;

        assert!(matches!(result, Err(AppError::AccountAlreadyLinked)));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_by_user_filters_plugin() {
        let repo = InMemorySocialPostAccountRepository::new();
        let user_id = Uuid::new_v4();
        repo.create(new_account(user_id, "li-1")).await.unwrap();
        repo.create(new_account(user_id, "li-2")).await.unwrap();
        let mut other = new_account(user_id, "tw-1");
        other.plugin_id = "social_post_twitter".to_string();
        repo.create(other).await.unwrap();

        let accounts = repo
            .list_by_user(user_id, "social_post_linkedin")
            .await
            .unwrap();

        assert_eq!(accounts.len(), 2);
    }
}
