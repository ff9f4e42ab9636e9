use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::{
    PgSocialPostAccountRepository, SocialPostAccountRepository, UserRepository,
};
use crate::services::{LinkedInPostNetwork, TokenCipher};
use crate::session::SessionStore;

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
#[derive(Clone)]
pub struct AppState {
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// ユーザーリポジトリ
    pub user_repo: UserRepository,
    /// 連携アカウントリポジトリ
    pub account_repo: Arc<dyn SocialPostAccountRepository>,
    /// アクセストークン暗号化サービス
    pub token_cipher: TokenCipher,
    /// LinkedIn ネットワーク（OAuth2 クライアントの生成元）
    pub linkedin_network: Arc<LinkedInPostNetwork>,
    /// サーバーサイドセッション
    pub sessions: SessionStore,
}

impl AppState {
    /// 新しい AppState を作成
    pub fn new(db_pool: PgPool, config: Config) -> Result<Self, AppError> {
        let user_repo = UserRepository::new(db_pool.clone());
        let account_repo = Arc::new(PgSocialPostAccountRepository::new(db_pool));
        Self::with_repositories(config, user_repo, account_repo)
    }

    /// リポジトリを指定して AppState を作成
    pub fn with_repositories(
        config: Config,
        user_repo: UserRepository,
        account_repo: Arc<dyn SocialPostAccountRepository>,
    ) -> Result<Self, AppError> {
        let config = Arc::new(config);
        let token_cipher = TokenCipher::new(config.token_encryption_key.expose_secret())?;
        let linkedin_network = Arc::new(LinkedInPostNetwork::from_config(&config));
        let sessions = SessionStore::new(
            config.session_cookie_secure,
            Duration::from_secs(config.session_ttl_secs),
        );

        if !linkedin_network.is_configured() {
            tracing::warn!("LinkedIn クライアント未設定（連携機能は利用できません）");
        }

        Ok(Self {
            config,
            user_repo,
            account_repo,
            token_cipher,
            linkedin_network,
            sessions,
        })
    }
}
