//! サーバーサイドセッション
//!
//! Cookie にはランダムなセッションIDのみを保存し、データはサーバー側に保持する。
//! セッションはログイン時などに作成され、ログアウトまたは一定時間アクセスが無いと破棄される。
//! 期限切れのセッションは新規作成時にまとめて削除する。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::FlashMessage;

pub const SESSION_COOKIE_NAME: &str = "social_post_session";

/// セッションに保持するデータ
#[derive(Debug, Clone)]
struct SessionData {
    user_id: Option<Uuid>,
    values: HashMap<String, String>,
    messages: Vec<FlashMessage>,
    last_seen: Instant,
}

impl SessionData {
    fn new() -> Self {
        Self {
            user_id: None,
            values: HashMap::new(),
            messages: Vec::new(),
            last_seen: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_seen.elapsed() >= ttl
    }
}

/// インメモリのセッションストア
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
    cookie_secure: bool,
    /// 最終アクセスからの有効期間
    ttl: Duration,
}

impl SessionStore {
    pub fn new(cookie_secure: bool, ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            cookie_secure,
            ttl,
        }
    }

    /// Cookie のセッションIDから有効なセッションを取得する（作成はしない）
    ///
    /// 期限切れのセッションはここで削除される。
    pub async fn find(&self, jar: &CookieJar) -> Option<Session> {
        let id = jar.get(SESSION_COOKIE_NAME)?.value().to_string();
        let mut sessions = self.sessions.write().await;

        let expired = sessions.get(&id)?.is_expired(self.ttl);
        if expired {
            sessions.remove(&id);
            tracing::debug!("期限切れセッションを破棄");
            return None;
        }

        if let Some(data) = sessions.get_mut(&id) {
            data.last_seen = Instant::now();
        }
        drop(sessions);

        Some(self.handle(id))
    }

    /// 有効なセッションを取得し、無ければ新規作成する
    pub async fn load(&self, jar: CookieJar) -> (CookieJar, Session) {
        if let Some(session) = self.find(&jar).await {
            return (jar, session);
        }

        let id = generate_session_id();
        {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, data| !data.is_expired(self.ttl));
            let pruned = before - sessions.len();
            if pruned > 0 {
                tracing::debug!(pruned, "期限切れセッションを削除");
            }
            sessions.insert(id.clone(), SessionData::new());
        }
        tracing::debug!("新規セッション作成");

        let jar = jar.add(self.session_cookie(id.clone()));
        (jar, self.handle(id))
    }

    /// セッションIDを再発行する（ログイン時のセッション固定攻撃対策）
    ///
    /// 旧セッションのデータは破棄される。
    pub async fn rotate(&self, jar: CookieJar) -> (CookieJar, Session) {
        let jar = self.destroy(jar).await;
        self.load(jar).await
    }

    /// セッションを破棄し、Cookie を削除する
    pub async fn destroy(&self, jar: CookieJar) -> CookieJar {
        if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
            self.sessions.write().await.remove(cookie.value());
        }
        jar.remove(Cookie::build(SESSION_COOKIE_NAME).path("/"))
    }

    fn handle(&self, id: String) -> Session {
        Session {
            id,
            store: self.clone(),
        }
    }

    fn session_cookie(&self, id: String) -> Cookie<'static> {
        // OAuth コールバック（外部サイトからのトップレベル遷移）で送信されるよう Lax
        Cookie::build((SESSION_COOKIE_NAME, id))
            .path("/")
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .build()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn with_data<R>(&self, id: &str, f: impl FnOnce(&mut SessionData) -> R) -> Option<R> {
        let mut sessions = self.sessions.write().await;
        sessions.get_mut(id).map(f)
    }
}

/// 256ビットのランダムなセッションIDを生成
fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// 1リクエスト中に扱うセッションのハンドル
#[derive(Clone)]
pub struct Session {
    id: String,
    store: SessionStore,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// ログイン中のユーザーID
    pub async fn user_id(&self) -> Option<Uuid> {
        self.store
            .with_data(&self.id, |data| data.user_id)
            .await
            .flatten()
    }

    pub async fn set_user_id(&self, user_id: Uuid) {
        self.store
            .with_data(&self.id, |data| data.user_id = Some(user_id))
            .await;
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.store
            .with_data(&self.id, |data| data.values.get(key).cloned())
            .await
            .flatten()
    }

    pub async fn set(&self, key: &str, value: String) {
        self.store
            .with_data(&self.id, |data| {
                data.values.insert(key.to_string(), value);
            })
            .await;
    }

    /// 値を取り出して削除する
    pub async fn take(&self, key: &str) -> Option<String> {
        self.store
            .with_data(&self.id, |data| data.values.remove(key))
            .await
            .flatten()
    }

    /// 指定プレフィックスのキーを全て削除する
    pub async fn remove_prefixed(&self, prefix: &str) {
        self.store
            .with_data(&self.id, |data| {
                data.values.retain(|key, _| !key.starts_with(prefix));
            })
            .await;
    }

    pub async fn push_message(&self, message: FlashMessage) {
        self.store
            .with_data(&self.id, |data| data.messages.push(message))
            .await;
    }

    /// 未表示のメッセージを取り出す（取り出したメッセージは削除される）
    pub async fn take_messages(&self) -> Vec<FlashMessage> {
        self.store
            .with_data(&self.id, |data| std::mem::take(&mut data.messages))
            .await
            .unwrap_or_default()
    }
}

/// モジュールごとのキープレフィックス付きでセッションを扱う
pub struct SessionDataHandler<'a> {
    session: &'a Session,
    prefix: &'static str,
}

impl<'a> SessionDataHandler<'a> {
    pub fn new(session: &'a Session, prefix: &'static str) -> Self {
        Self { session, prefix }
    }

    fn key(&self, key: &str) -> String {
        format!("{}_{}", self.prefix, key)
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.session.get(&self.key(key)).await
    }

    pub async fn set(&self, key: &str, value: String) {
        self.session.set(&self.key(key), value).await;
    }

    pub async fn take(&self, key: &str) -> Option<String> {
        self.session.take(&self.key(key)).await
    }

    /// このモジュールが保存したキーを全て無効化する
    pub async fn nullify(&self) {
        self.session.remove_prefixed(&format!("{}_", self.prefix)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_load_creates_session_and_cookie() {
        let store = SessionStore::new(true, TTL);

        let (jar, session) = store.load(CookieJar::new()).await;

        let cookie = jar.get(SESSION_COOKIE_NAME).unwrap();
        assert_eq!(cookie.value(), session.id());
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }

    #[tokio::test]
    async fn test_load_reuses_existing_session() {
        let store = SessionStore::new(false, TTL);
        let (jar, first) = store.load(CookieJar::new()).await;
        first.set("key", "value".to_string()).await;

        let (_, second) = store.load(jar).await;

        assert_eq!(first.id(), second.id());
        assert_eq!(second.get("key").await.as_deref(), Some("value"));
    }

    #[tokio::test]
    async fn test_load_ignores_unknown_session_id() {
        let store = SessionStore::new(false, TTL);
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE_NAME, "forged-id"));

        let (_, session) = store.load(jar).await;

        assert_ne!(session.id(), "forged-id");
    }

    #[tokio::test]
    async fn test_take_is_single_use() {
        let store = SessionStore::new(false, TTL);
        let (_, session) = store.load(CookieJar::new()).await;
        session.set("state", "abc".to_string()).await;

        assert_eq!(session.take("state").await.as_deref(), Some("abc"));
        assert!(session.take("state").await.is_none());
    }

    #[tokio::test]
    async fn test_data_handler_prefix_and_nullify() {
        let store = SessionStore::new(false, TTL);
        let (_, session) = store.load(CookieJar::new()).await;
        session.set("other_key", "keep".to_string()).await;

        let handler = SessionDataHandler::new(&session, "social_post_linkedin");
        handler.set("oauth2state", "abc".to_string()).await;
        assert_eq!(
            session.get("social_post_linkedin_oauth2state").await.as_deref(),
            Some("abc")
        );

        handler.nullify().await;

        assert!(handler.get("oauth2state").await.is_none());
        assert_eq!(session.get("other_key").await.as_deref(), Some("keep"));
    }

    #[tokio::test]
    async fn test_messages_are_drained() {
        let store = SessionStore::new(false, TTL);
        let (_, session) = store.load(CookieJar::new()).await;
        session.push_message(FlashMessage::warning("careful")).await;

        let messages = session.take_messages().await;

        assert_eq!(messages, vec![FlashMessage::warning("careful")]);
        assert!(session.take_messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_rotate_discards_previous_session() {
        let store = SessionStore::new(false, TTL);
        let (jar, old) = store.load(CookieJar::new()).await;
        old.set_user_id(Uuid::new_v4()).await;

        let (jar, new) = store.rotate(jar).await;

        assert_ne!(old.id(), new.id());
        assert!(old.user_id().await.is_none());
        assert!(new.user_id().await.is_none());
        assert_eq!(jar.get(SESSION_COOKIE_NAME).unwrap().value(), new.id());
    }

    #[tokio::test]
    async fn test_destroy_removes_session() {
        let store = SessionStore::new(false, TTL);
        let (jar, session) = store.load(CookieJar::new()).await;
        session.set_user_id(Uuid::new_v4()).await;

        let jar = store.destroy(jar).await;

        assert!(session.user_id().await.is_none());
        assert!(jar.get(SESSION_COOKIE_NAME).is_none());
    }

    #[tokio::test]
    async fn test_find_does_not_create_session() {
        let store = SessionStore::new(false, TTL);

        assert!(store.find(&CookieJar::new()).await.is_none());
        let forged = CookieJar::new().add(Cookie::new(SESSION_COOKIE_NAME, "forged-id"));
        assert!(store.find(&forged).await.is_none());

        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_find_returns_existing_session() {
        let store = SessionStore::new(false, TTL);
        let (jar, created) = store.load(CookieJar::new()).await;

        let found = store.find(&jar).await.unwrap();

        assert_eq!(found.id(), created.id());
    }

    #[tokio::test]
    async fn test_expired_session_is_replaced() {
        let store = SessionStore::new(false, Duration::ZERO);
        let (jar, expired) = store.load(CookieJar::new()).await;

        assert!(store.find(&jar).await.is_none());
        let (_, session) = store.load(jar).await;

        assert_ne!(session.id(), expired.id());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_cookieless_loads_do_not_accumulate_expired_sessions() {
        let store = SessionStore::new(false, Duration::ZERO);

        for _ in 0..1000 {
            store.load(CookieJar::new()).await;
        }

        assert_eq!(store.len().await, 1);
    }
}
