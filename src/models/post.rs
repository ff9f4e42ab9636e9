use serde::Serialize;

use crate::error::AppError;

/// 投稿者の種別（URN の種別部分）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileType {
    Person,
    #[default]
    Organization,
}

impl ProfileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Organization => "organization",
        }
    }
}

/// 投稿の公開範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    #[default]
    Public,
    Connections,
}

/// 投稿のライフサイクル状態（常に PUBLISHED）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LifecycleState {
    #[default]
    Published,
}

/// LinkedIn UGC 投稿
///
/// `body()` で ugcPosts API のリクエストボディを生成する。
/// 投稿者が未設定のままシリアライズすると設定エラーになる。
#[derive(Debug, Clone)]
pub struct Post {
    text: String,
    author: Option<String>,
    profile_type: ProfileType,
    visibility: Visibility,
    lifecycle_state: LifecycleState,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UgcPostBody<'a> {
    author: String,
    lifecycle_state: LifecycleState,
    specific_content: SpecificContent<'a>,
    visibility: MemberNetworkVisibility,
}

#[derive(Serialize)]
struct SpecificContent<'a> {
    #[serde(rename = "com.linkedin.ugc.ShareContent")]
    share_content: ShareContent<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShareContent<'a> {
    share_commentary: ShareCommentary<'a>,
    // メディア添付は未対応
    share_media_category: &'static str,
}

#[derive(Serialize)]
struct ShareCommentary<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct MemberNetworkVisibility {
    #[serde(rename = "com.linkedin.ugc.MemberNetworkVisibility")]
    visibility: Visibility,
}

impl Post {
    pub fn new(text: impl Into<String>, author: Option<String>) -> Self {
        Self {
            text: text.into(),
            author,
            profile_type: ProfileType::default(),
            visibility: Visibility::default(),
            lifecycle_state: LifecycleState::default(),
        }
    }

    pub fn with_profile_type(mut self, profile_type: ProfileType) -> Self {
        self.profile_type = profile_type;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// ugcPosts API のリクエストボディ（JSON文字列）を生成
    ///
    /// # Errors
    /// 投稿者が未設定（または空文字）の場合は `AppError::Configuration`
    pub fn body(&self) -> Result<String, AppError> {
        let author = match self.author.as_deref() {
            Some(author) if !author.trim().is_empty() => author,
            _ => {
                return Err(AppError::Configuration(
                    "Author was not specified".to_string(),
                ));
            }
        };

        let body = UgcPostBody {
            author: format!("urn:li:{}:{}", self.profile_type.as_str(), author),
            lifecycle_state: self.lifecycle_state,
            specific_content: SpecificContent {
                share_content: ShareContent {
                    share_commentary: ShareCommentary { text: &self.text },
                    share_media_category: "NONE",
                },
            },
            visibility: MemberNetworkVisibility {
                visibility: self.visibility,
            },
        };

        serde_json::to_string(&body).map_err(|e| {
            tracing::error!(error = ?e, "投稿ボディのシリアライズエラー");
            AppError::Internal(anyhow::anyhow!("failed to serialize post body"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parse(body: &str) -> Value {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_body_contains_text_and_author_urn() {
        let post = Post::new("Hello LinkedIn", Some("abc123".to_string()));

        let body = parse(&post.body().unwrap());

        assert_eq!(
            body["specificContent"]["com.linkedin.ugc.ShareContent"]["shareCommentary"]["text"],
            "Hello LinkedIn"
        );
        assert_eq!(body["author"], "urn:li:organization:abc123");
    }

    #[test]
    fn test_body_fixed_fields() {
        let post = Post::new("text", Some("abc123".to_string()));

        let body = parse(&post.body().unwrap());

        assert_eq!(body["lifecycleState"], "PUBLISHED");
        assert_eq!(
            body["specificContent"]["com.linkedin.ugc.ShareContent"]["shareMediaCategory"],
            "NONE"
        );
        assert_eq!(
            body["visibility"]["com.linkedin.ugc.MemberNetworkVisibility"],
            "PUBLIC"
        );
    }

    #[test]
    fn test_body_person_profile_with_connections_visibility() {
        let post = Post::new("text", Some("member-1".to_string()))
            .with_profile_type(ProfileType::Person)
            .with_visibility(Visibility::Connections);

        let body = parse(&post.body().unwrap());

        assert_eq!(body["author"], "urn:li:person:member-1");
        assert_eq!(
            body["visibility"]["com.linkedin.ugc.MemberNetworkVisibility"],
            "CONNECTIONS"
        );
    }

    #[test]
    fn test_body_escapes_text() {
        let text = "quote \" and\nnewline";
        let post = Post::new(text, Some("abc".to_string()));

        let body = parse(&post.body().unwrap());

        assert_eq!(
            body["specificContent"]["com.linkedin.ugc.ShareContent"]["shareCommentary"]["text"],
            text
        );
    }

    #[test]
    fn test_body_without_author_is_configuration_error() {
        let post = Post::new("text", None);
        assert!(matches!(post.body(), Err(AppError::Configuration(_))));

        let blank = Post::new("text", Some("  ".to_string()));
        assert!(matches!(blank.body(), Err(AppError::Configuration(_))));
    }
}
