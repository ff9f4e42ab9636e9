use secrecy::{ExposeSecret, SecretBox};

use crate::config::Config;
use crate::services::linkedin::{LinkedInClient, LinkedInEndpoints};

/// 連携アカウントの識別子（ソーシャルネットワークID）
pub const LINKEDIN_PLUGIN_ID: &str = "social_post_linkedin";

/// OAuth コールバックのパス
pub const CALLBACK_PATH: &str = "/user/social-post/linkedin/auth/callback";

/// LinkedIn アプリケーション設定
pub struct LinkedInSettings {
    pub client_id: Option<String>,
    /// クライアントシークレット（機密情報 - ログ出力禁止）
    pub client_secret: Option<SecretBox<String>>,
}

/// LinkedIn ネットワーク
///
/// 設定から OAuth2 クライアントを生成する。
/// クライアントID・シークレットが未設定の場合はクライアントを返さない。
pub struct LinkedInPostNetwork {
    settings: LinkedInSettings,
    redirect_uri: String,
    endpoints: LinkedInEndpoints,
}

impl LinkedInPostNetwork {
    pub fn new(settings: LinkedInSettings, base_url: &str, endpoints: LinkedInEndpoints) -> Self {
        Self {
            settings,
            redirect_uri: format!("{}{}", base_url.trim_end_matches('/'), CALLBACK_PATH),
            endpoints,
        }
    }

    /// アプリケーション設定から生成
    pub fn from_config(config: &Config) -> Self {
        let settings = LinkedInSettings {
            client_id: config.linkedin_client_id.clone(),
            client_secret: config
                .linkedin_client_secret
                .as_ref()
                .map(|s| SecretBox::new(Box::new(s.expose_secret().clone()))),
        };
        let endpoints = LinkedInEndpoints {
            auth_url: config.linkedin_auth_url.clone(),
            token_url: config.linkedin_token_url.clone(),
            api_base_url: config.linkedin_api_base_url.clone(),
        };

        Self::new(settings, &config.base_url, endpoints)
    }

    /// クライアントID・シークレットが設定済みか（ログは出力しない）
    pub fn is_configured(&self) -> bool {
        self.credentials().is_some()
    }

    /// OAuth2 クライアントを取得
    ///
    /// # Returns
    /// 設定が不完全な場合は `None`（エラーログを1件出力）
    pub fn get_sdk(&self) -> Option<LinkedInClient> {
        let (client_id, client_secret) = self.validate_config()?;

        match LinkedInClient::new(
            client_id.to_string(),
            client_secret.to_string(),
            self.redirect_uri.clone(),
            &self.endpoints,
        ) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::error!(error = %e, "LinkedIn クライアントの初期化に失敗");
                None
            }
        }
    }

    /// クライアントID・シークレットが設定されているか検証
    fn validate_config(&self) -> Option<(&str, &str)> {
        let credentials = self.credentials();
        if credentials.is_none() {
            tracing::error!("Define Client ID and Client Secret on module settings.");
        }
        credentials
    }

    /// 空白のみの値は未設定として扱う
    fn credentials(&self) -> Option<(&str, &str)> {
        let client_id = self
            .settings
            .client_id
            .as_deref()
            .filter(|id| !id.trim().is_empty());
        let client_secret = self
            .settings
            .client_secret
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .filter(|secret| !secret.trim().is_empty());

        client_id.zip(client_secret)
    }
}
