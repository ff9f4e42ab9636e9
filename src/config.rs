use secrecy::SecretBox;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub database_url: SecretBox<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// サイトのベースURL（リダイレクトURIの生成に使用）
    pub base_url: String,
    /// ログインページのパス
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_session_cookie_secure")]
    pub session_cookie_secure: bool,
    /// 最終アクセスからセッションが失効するまでの秒数
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// アクセストークン暗号化キー（Base64エンコード、32バイト）
    pub token_encryption_key: SecretBox<String>,

    // LinkedIn アプリケーション設定（未設定の場合は連携機能が無効）
    #[serde(default)]
    pub linkedin_client_id: Option<String>,
    pub linkedin_client_secret: Option<SecretBox<String>>,

    // LinkedIn エンドポイント（テスト時に差し替え可能）
    #[serde(default = "default_linkedin_auth_url")]
    pub linkedin_auth_url: String,
    #[serde(default = "default_linkedin_token_url")]
    pub linkedin_token_url: String,
    #[serde(default = "default_linkedin_api_base_url")]
    pub linkedin_api_base_url: String,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOGIN_PATH: &str = "/user/login";
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_LINKEDIN_AUTH_URL: &str = "https://www.linkedin.com/oauth/v2/authorization";
const DEFAULT_LINKEDIN_TOKEN_URL: &str = "https://www.linkedin.com/oauth/v2/accessToken";
const DEFAULT_LINKEDIN_API_BASE_URL: &str = "https://api.linkedin.com";

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

fn default_session_cookie_secure() -> bool {
    true
}

fn default_session_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

fn default_linkedin_auth_url() -> String {
    DEFAULT_LINKEDIN_AUTH_URL.to_string()
}

fn default_linkedin_token_url() -> String {
    DEFAULT_LINKEDIN_TOKEN_URL.to_string()
}

fn default_linkedin_api_base_url() -> String {
    DEFAULT_LINKEDIN_API_BASE_URL.to_string()
}

impl Config {
    pub fn load() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}
