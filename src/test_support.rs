//! テスト用ヘルパー

use std::io::Write;
use std::sync::{Arc, Mutex};

use axum_extra::extract::cookie::CookieJar;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use secrecy::{ExposeSecret, SecretBox};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::fmt::MakeWriter;
use uuid::Uuid;

use crate::config::Config;
use crate::repositories::{
    InMemorySocialPostAccountRepository, SocialPostAccountRepository, UserRepository,
};
use crate::session::Session;
use crate::state::AppState;

/// tracing の出力をメモリに取り込む
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// このバッファに書き込むサブスクライバー
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
    }

    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// ERROR レベルのログ行数
    pub fn count_errors(&self) -> usize {
        self.contents()
            .lines()
            .filter(|line| line.contains(" ERROR "))
            .count()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// テスト用の設定（LinkedIn エンドポイントは `linkedin_base` を向く）
pub fn test_config(linkedin_base: &str, configured: bool) -> Config {
    Config {
        database_url: SecretBox::new(Box::new(
            "postgres://localhost/social_post_test".to_string(),
        )),
        host: "127.0.0.1".to_string(),
        port: 0,
        base_url: "https://example.com".to_string(),
        login_path: "/user/login".to_string(),
        session_cookie_secure: false,
        session_ttl_secs: 3600,
        token_encryption_key: SecretBox::new(Box::new(STANDARD.encode([5u8; 32]))),
        linkedin_client_id: configured.then(|| "test-client-id".to_string()),
        linkedin_client_secret: configured
            .then(|| SecretBox::new(Box::new("test-client-secret".to_string()))),
        linkedin_auth_url: format!("{}/oauth/v2/authorization", linkedin_base),
        linkedin_token_url: format!("{}/oauth/v2/accessToken", linkedin_base),
        linkedin_api_base_url: linkedin_base.to_string(),
    }
}

/// インメモリの連携アカウントリポジトリを使う AppState
///
/// tokio ランタイム上で呼び出すこと（DB プールは遅延接続）。
pub fn test_state(config: Config) -> (AppState, Arc<InMemorySocialPostAccountRepository>) {
    let account_repo = Arc::new(InMemorySocialPostAccountRepository::new());
    let state = test_state_with_repository(config, account_repo.clone());
    (state, account_repo)
}

/// 連携アカウントリポジトリを指定した AppState
pub fn test_state_with_repository(
    config: Config,
    account_repo: Arc<dyn SocialPostAccountRepository>,
) -> AppState {
    let pool = PgPoolOptions::new()
        .connect_lazy(config.database_url.expose_secret())
        .unwrap();
    AppState::with_repositories(config, UserRepository::new(pool), account_repo).unwrap()
}

/// ログイン済みセッションを作成
pub async fn logged_in_session(state: &AppState, user_id: Uuid) -> (CookieJar, Session) {
    let (jar, session) = state.sessions.load(CookieJar::new()).await;
    session.set_user_id(user_id).await;
    (jar, session)
}
