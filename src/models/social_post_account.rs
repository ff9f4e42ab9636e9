use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// サイトユーザーと連携済みソーシャルアカウント（投稿用）の紐付け
///
/// アクセストークンは AES-256-GCM で暗号化して保存する。
/// 作成後は更新しない（トークンのリフレッシュは未対応）。
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SocialPostAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plugin_id: String,
    pub provider_user_id: String,
    pub name: String,
    #[serde(skip)]
    pub token_encrypted: Vec<u8>,
    pub profile_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// 新規連携アカウントの作成パラメータ
#[derive(Debug, Clone)]
pub struct NewSocialPostAccount {
    pub user_id: Uuid,
    pub plugin_id: String,
    pub provider_user_id: String,
    pub name: String,
    pub token_encrypted: Vec<u8>,
    pub profile_url: Option<String>,
}
