//! LinkedIn OAuth2 クライアントと投稿マネージャー
//!
//! # Security
//! - client_secret とアクセストークンはログに出力しない
//! - state は OAuth2 クライアントがリクエスト毎にランダム生成する

use oauth2::basic::BasicClient;
use oauth2::{
    AccessToken, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl,
    Scope, TokenUrl,
};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::Post;

/// 認可リクエストで要求するスコープ（プロフィール、メール、投稿権限）
pub const LINKEDIN_SCOPES: [&str; 3] = ["r_liteprofile", "r_emailaddress", "w_member_social"];

const PROFILE_PATH: &str = "/v2/me";
const UGC_POSTS_PATH: &str = "/v2/ugcPosts";
const RESTLI_PROTOCOL_VERSION: &str = "2.0.0";

/// LinkedIn のエンドポイント設定
#[derive(Debug, Clone)]
pub struct LinkedInEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub api_base_url: String,
}

/// LinkedIn トークンエンドポイントからのレスポンス
///
/// LinkedIn は token_type を返さないため、oauth2 の標準トークンレスポンスは使えない。
#[derive(Debug, Deserialize)]
struct LinkedInTokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// `/v2/me` のレスポンス
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkedInMeResponse {
    id: String,
    localized_first_name: String,
    localized_last_name: String,
    vanity_name: Option<String>,
}

/// リソースオーナー（認証済み LinkedIn ユーザー）のプロフィール
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedInProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_url: Option<String>,
}

impl LinkedInProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// LinkedIn OAuth2 クライアント
///
/// 認可 URL と state の生成は oauth2 クライアント、トークン交換と API 呼び出しは reqwest で行う。
#[derive(Clone)]
pub struct LinkedInClient {
    oauth_client: BasicClient,
    client_id: ClientId,
    /// クライアントシークレット（機密情報 - ログ出力禁止）
    client_secret: ClientSecret,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    api_base_url: String,
    http_client: reqwest::Client,
}

impl LinkedInClient {
    /// 新しい LinkedInClient を作成
    ///
    /// # Errors
    /// エンドポイントまたはリダイレクト URI が不正な URL の場合は `AppError::Configuration`
    pub fn new(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        endpoints: &LinkedInEndpoints,
    ) -> Result<Self, AppError> {
        let auth_url = AuthUrl::new(endpoints.auth_url.clone())
            .map_err(|e| AppError::Configuration(format!("invalid authorization url: {}", e)))?;
        let token_url = TokenUrl::new(endpoints.token_url.clone())
            .map_err(|e| AppError::Configuration(format!("invalid token url: {}", e)))?;
        let redirect_url = RedirectUrl::new(redirect_uri)
            .map_err(|e| AppError::Configuration(format!("invalid redirect uri: {}", e)))?;

        let client_id = ClientId::new(client_id);
        let client_secret = ClientSecret::new(client_secret);

        let oauth_client = BasicClient::new(
            client_id.clone(),
            Some(client_secret.clone()),
            auth_url,
            Some(token_url.clone()),
        )
        .set_redirect_uri(redirect_url.clone());

        Ok(Self {
            oauth_client,
            client_id,
            client_secret,
            token_url,
            redirect_url,
            api_base_url: endpoints.api_base_url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        })
    }

    pub fn redirect_uri(&self) -> &str {
        self.redirect_url.url().as_str()
    }

    /// 認可 URL と state を生成
    pub fn authorization_url(&self, scopes: &[&str]) -> (String, CsrfToken) {
        let (url, state) = self
            .oauth_client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(scopes.iter().map(|s| Scope::new(s.to_string())))
            .url();

        (url.to_string(), state)
    }

    /// 認可コードをアクセストークンに交換
    pub async fn exchange_code(&self, code: &AuthorizationCode) -> Result<AccessToken, AppError> {
        // LinkedIn はクライアント認証情報をリクエストボディで受け取る
        let body = format!(
            "grant_type=authorization_code&code={}&redirect_uri={}&client_id={}&client_secret={}",
            urlencoding::encode(code.secret()),
            urlencoding::encode(self.redirect_uri()),
            urlencoding::encode(self.client_id.as_str()),
            urlencoding::encode(self.client_secret.secret()),
        );

        let response = self
            .http_client
            .post(self.token_url.url().as_str())
            .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(http::header::ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "LinkedInトークンエンドポイント通信エラー");
                AppError::OAuthProviderError
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "LinkedInトークン交換エラー");
            return Err(AppError::OAuthError(format!(
                "token exchange failed: {}",
                status
            )));
        }

        let token_response: LinkedInTokenResponse = response.json().await.map_err(|e| {
            tracing::error!(error = ?e, "LinkedInトークンレスポンスのパースエラー");
            AppError::OAuthError("invalid token response".to_string())
        })?;

        tracing::debug!(expires_in = ?token_response.expires_in, "トークン交換成功");
        Ok(AccessToken::new(token_response.access_token))
    }

    /// アクセストークンを使用してリソースオーナーのプロフィールを取得
    pub async fn resource_owner(
        &self,
        access_token: &AccessToken,
    ) -> Result<LinkedInProfile, AppError> {
        let response = self
            .http_client
            .get(format!("{}{}", self.api_base_url, PROFILE_PATH))
            .bearer_auth(access_token.secret())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "LinkedIn プロフィールAPI通信エラー");
                AppError::OAuthProviderError
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(status = %status, "LinkedIn プロフィール取得エラー");
            return Err(AppError::OAuthError(format!(
                "profile request failed: {}",
                status
            )));
        }

        let me: LinkedInMeResponse = response.json().await.map_err(|e| {
            tracing::error!(error = ?e, "LinkedIn プロフィールレスポンスのパースエラー");
            AppError::OAuthError("invalid profile response".to_string())
        })?;

        Ok(LinkedInProfile {
            profile_url: me
                .vanity_name
                .map(|vanity| format!("https://www.linkedin.com/in/{}", vanity)),
            id: me.id,
            first_name: me.localized_first_name,
            last_name: me.localized_last_name,
        })
    }

    /// 認証付き JSON POST リクエストを送信
    async fn post_json(
        &self,
        path: &str,
        access_token: &str,
        body: String,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.http_client
            .post(format!("{}{}", self.api_base_url, path))
            .bearer_auth(access_token)
            .header(http::header::CONTENT_TYPE, "application/json")
            .header("X-Restli-Protocol-Version", RESTLI_PROTOCOL_VERSION)
            .body(body)
            .send()
            .await
    }
}

/// LinkedIn 認証・投稿マネージャー
///
/// 1リクエストの間だけ使用する。state・アクセストークン・プロフィールはメモリ上にのみ保持する。
pub struct LinkedInPostManager {
    client: LinkedInClient,
    state: Option<CsrfToken>,
    access_token: Option<AccessToken>,
    user: Option<LinkedInProfile>,
}

impl LinkedInPostManager {
    pub fn new(client: LinkedInClient) -> Self {
        Self {
            client,
            state: None,
            access_token: None,
            user: None,
        }
    }

    /// ログイン（認可）URL を生成
    ///
    /// 生成された state は `state()` で取得できる。
    pub fn login_url(&mut self) -> String {
        let (url, state) = self.client.authorization_url(&LINKEDIN_SCOPES);
        self.state = Some(state);
        url
    }

    /// 直近の認可リクエストで生成された state
    pub fn state(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.secret().as_str())
    }

    /// コールバックで受け取った認可コードをアクセストークンに交換して保持する
    ///
    /// # Errors
    /// コードが無い、または交換に失敗した場合（トークンは保持されない）
    pub async fn authenticate(&mut self, code: Option<&str>) -> Result<(), AppError> {
        let code = match code {
            Some(code) if !code.is_empty() => code,
            _ => {
                tracing::warn!("認可コードがありません");
                return Err(AppError::OAuthError("authorization code is missing".to_string()));
            }
        };

        let token = self
            .client
            .exchange_code(&AuthorizationCode::new(code.to_string()))
            .await?;
        self.access_token = Some(token);
        Ok(())
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_ref().map(|t| t.secret().as_str())
    }

    /// リソースオーナーのプロフィールを取得（このマネージャーの生存期間中はキャッシュ）
    pub async fn user_info(&mut self) -> Result<&LinkedInProfile, AppError> {
        if self.user.is_none() {
            let token = self.access_token.as_ref().ok_or_else(|| {
                AppError::OAuthError("access token is not available".to_string())
            })?;
            let profile = self.client.resource_owner(token).await?;
            self.user = Some(profile);
        }

        self.user
            .as_ref()
            .ok_or_else(|| AppError::OAuthError("profile is not available".to_string()))
    }

    /// LinkedIn に投稿する
    ///
    /// # Returns
    /// HTTP 201 の場合のみ `true`。それ以外のステータスや通信エラーはログに記録して `false`。
    ///
    /// # Errors
    /// 投稿者が未設定の場合は `AppError::Configuration`（リクエストは送信しない）
    pub async fn do_post(&self, access_token: &str, post: &Post) -> Result<bool, AppError> {
        let body = post.body()?;

        let response = match self
            .client
            .post_json(UGC_POSTS_PATH, access_token, body)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = ?e, "LinkedIn 投稿APIの通信エラー");
                return Ok(false);
            }
        };

        if response.status() != StatusCode::CREATED {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Error posting on LinkedIn");
            return Ok(false);
        }

        tracing::info!("LinkedIn への投稿成功");
        Ok(true)
    }
}
