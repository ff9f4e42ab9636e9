//! LinkedIn 連携ハンドラー
//!
//! LinkedIn の OAuth2 認可コードフローでアカウントを連携する。
//! `Unauthenticated → Redirected → CallbackReceived → {Linked | Rejected}`
//!
//! # Security
//! - state はセッションに保存し、コールバックで必ず照合する（一度きり）
//! - access_token はログに出力しない

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{FlashMessage, NewSocialPostAccount};
use crate::services::linkedin::{LinkedInPostManager, LinkedInProfile};
use crate::services::network::LINKEDIN_PLUGIN_ID;
use crate::session::{Session, SessionDataHandler};
use crate::state::AppState;

const STATE_KEY: &str = "oauth2state";

const MSG_LOGIN_REQUIRED: &str = "You must be logged in to link a LinkedIn account.";
const MSG_NOT_CONFIGURED: &str =
    "Social Post LinkedIn not configured properly. Contact site administrator.";
const MSG_NOT_AUTHENTICATED: &str = "You could not be authenticated.";
const MSG_INVALID_STATE: &str = "LinkedIn login failed. Invalid OAuth2 state.";
const MSG_PROFILE_FAILED: &str =
    "LinkedIn login failed, could not load LinkedIn profile. Contact site administrator.";
const MSG_SAVE_FAILED: &str =
    "The LinkedIn account could not be saved. Contact site administrator.";
const MSG_ACCOUNT_ADDED: &str = "Account added successfully.";
const MSG_ALREADY_AUTHORIZED: &str = "You have already authorized to post on behalf of this user.";

/// OAuth コールバック時のクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    /// LinkedIn から受け取った認可コード
    pub code: Option<String>,
    pub state: Option<String>,
    /// ユーザーがキャンセルした場合など（例: user_cancelled_authorize）
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// フローの結果（リダイレクト先と表示メッセージ）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowOutcome {
    pub redirect_to: String,
    pub message: Option<FlashMessage>,
}

impl FlowOutcome {
    fn to(redirect_to: impl Into<String>) -> Self {
        Self {
            redirect_to: redirect_to.into(),
            message: None,
        }
    }

    fn with(mut self, message: FlashMessage) -> Self {
        self.message = Some(message);
        self
    }
}

/// ユーザーのプロフィール編集ページ
pub fn profile_edit_path(user_id: Uuid) -> String {
    format!("/user/{}/edit", user_id)
}

/// LinkedIn 認可画面へリダイレクト
///
/// GET /user/social-post/linkedin/auth
pub async fn redirect_to_provider(State(state): State<AppState>, jar: CookieJar) -> Redirect {
    tracing::info!("LinkedIn 連携開始");

    let Some(session) = state.sessions.find(&jar).await else {
        return Redirect::to(&state.config.login_path);
    };
    let outcome = start_authorization(&state, &session).await;

    finish(&session, outcome).await
}

/// LinkedIn OAuth コールバック処理
///
/// GET /user/social-post/linkedin/auth/callback
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    tracing::info!("LinkedIn OAuth コールバック受信");

    // セッションが無い場合はログインページへ（セッションは作成しない）
    let Some(session) = state.sessions.find(&jar).await else {
        return Redirect::to(&state.config.login_path);
    };
    let outcome = handle_callback(&state, &session, &query).await;

    finish(&session, outcome).await
}

/// メッセージをセッションに積んでリダイレクトする
async fn finish(session: &Session, outcome: FlowOutcome) -> Redirect {
    if let Some(message) = outcome.message {
        session.push_message(message).await;
    }
    Redirect::to(&outcome.redirect_to)
}

/// 認可 URL を生成し、state をセッションに保存する
pub async fn start_authorization(state: &AppState, session: &Session) -> FlowOutcome {
    let login_page = FlowOutcome::to(&state.config.login_path);

    let Some(user_id) = session.user_id().await else {
        return login_page.with(FlashMessage::error(MSG_LOGIN_REQUIRED));
    };

    let Some(client) = state.linkedin_network.get_sdk() else {
        return login_page.with(FlashMessage::error(MSG_NOT_CONFIGURED));
    };

    let mut manager = LinkedInPostManager::new(client);
    let login_url = manager.login_url();
    let Some(oauth_state) = manager.state().map(str::to_string) else {
        tracing::error!("OAuth state が生成されていない");
        return login_page.with(FlashMessage::error(MSG_NOT_CONFIGURED));
    };

    SessionDataHandler::new(session, LINKEDIN_PLUGIN_ID)
        .set(STATE_KEY, oauth_state)
        .await;

    tracing::debug!(user_id = %user_id, "LinkedIn 認可 URL 生成成功");
    FlowOutcome::to(login_url)
}

/// コールバックを処理し、連携アカウントを作成する
///
/// # 処理フロー
/// 1. error パラメータがあれば拒否
/// 2. セッションの state とクエリの state を照合（不一致ならセッションキーを無効化して拒否）
/// 3. code でトークン交換、プロフィール取得
/// 4. 未連携なら連携アカウントを作成、連携済みなら警告
pub async fn handle_callback(
    state: &AppState,
    session: &Session,
    query: &CallbackQuery,
) -> FlowOutcome {
    let login_page = FlowOutcome::to(&state.config.login_path);

    let Some(user_id) = session.user_id().await else {
        return login_page.with(FlashMessage::error(MSG_LOGIN_REQUIRED));
    };
    let profile_edit = FlowOutcome::to(profile_edit_path(user_id));

    // 1. キャンセルまたはプロバイダーエラー
    if let Some(error) = &query.error {
        tracing::warn!(
            error = %error,
            description = ?query.error_description,
            "LinkedIn 認可が拒否された"
        );
        return profile_edit.with(FlashMessage::error(MSG_NOT_AUTHENTICATED));
    }

    let Some(client) = state.linkedin_network.get_sdk() else {
        return login_page.with(FlashMessage::error(MSG_NOT_CONFIGURED));
    };

    // 2. state 照合（保存済み state は一度きり）
    let data_handler = SessionDataHandler::new(session, LINKEDIN_PLUGIN_ID);
    let stored_state = data_handler.take(STATE_KEY).await;
    if !state_matches(stored_state.as_deref(), query.state.as_deref()) {
        data_handler.nullify().await;
        tracing::warn!(user_id = %user_id, "OAuth state 照合失敗");
        return login_page.with(FlashMessage::error(MSG_INVALID_STATE));
    }
    tracing::debug!("state 照合成功");

    // 3. トークン交換とプロフィール取得
    let mut manager = LinkedInPostManager::new(client);
    if let Err(e) = manager.authenticate(query.code.as_deref()).await {
        tracing::error!(error = %e, "LinkedIn トークン交換失敗");
        return login_page.with(FlashMessage::error(MSG_PROFILE_FAILED));
    }
    // Note: access_token はログに出力しない

    let profile = match manager.user_info().await {
        Ok(profile) => profile.clone(),
        Err(e) => {
            tracing::error!(error = %e, "LinkedIn プロフィール取得失敗");
            return login_page.with(FlashMessage::error(MSG_PROFILE_FAILED));
        }
    };
    let Some(access_token) = manager.access_token() else {
        return login_page.with(FlashMessage::error(MSG_PROFILE_FAILED));
    };

    // 4. 連携アカウントの作成
    match link_account(state, user_id, &profile, access_token).await {
        Ok(true) => profile_edit.with(FlashMessage::success(MSG_ACCOUNT_ADDED)),
        Ok(false) => profile_edit.with(FlashMessage::warning(MSG_ALREADY_AUTHORIZED)),
        Err(e) => {
            tracing::error!(error = %e, user_id = %user_id, "連携アカウントの保存に失敗");
            profile_edit.with(FlashMessage::error(MSG_SAVE_FAILED))
        }
    }
}

/// セッションに保存した state とコールバックの state を照合
///
/// どちらかが無い、または空の場合は不一致とする。
fn state_matches(stored: Option<&str>, returned: Option<&str>) -> bool {
    matches!(
        (stored, returned),
        (Some(stored), Some(returned)) if !stored.is_empty() && stored == returned
    )
}

/// 連携アカウントを作成
///
/// # Returns
/// 新規作成した場合は `true`、既に連携済みの場合は `false`
async fn link_account(
    state: &AppState,
    user_id: Uuid,
    profile: &LinkedInProfile,
    access_token: &str,
) -> Result<bool, AppError> {
    let existing = state
        .account_repo
        .find(user_id, LINKEDIN_PLUGIN_ID, &profile.id)
        .await?;
    if existing.is_some() {
        tracing::info!(user_id = %user_id, "LinkedIn アカウントは連携済み");
        return Ok(false);
    }

    let token_encrypted = state.token_cipher.encrypt(access_token)?;
    let created = state
        .account_repo
        .create(NewSocialPostAccount {
            user_id,
            plugin_id: LINKEDIN_PLUGIN_ID.to_string(),
            provider_user_id: profile.id.clone(),
            name: profile.full_name(),
            token_encrypted,
            profile_url: profile.profile_url.clone(),
        })
        .await;
    let account = match created {
        Ok(account) => account,
        // 並行するコールバックが先に作成した
        Err(AppError::AccountAlreadyLinked) => {
            tracing::info!(user_id = %user_id, "LinkedIn アカウントは連携済み（同時連携）");
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    tracing::info!(
        user_id = %user_id,
        account_id = %account.id,
        "LinkedIn アカウント連携完了"
    );
    Ok(true)
}
