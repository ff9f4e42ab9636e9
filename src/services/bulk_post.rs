use crate::models::{Post, ProfileType, SocialPostAccount};
use crate::services::linkedin::LinkedInPostManager;
use crate::services::token_cipher::TokenCipher;

/// 連携済みの全 LinkedIn アカウントに同じ内容を投稿する
///
/// 各投稿は独立して順番に実行し、失敗はログに記録するのみで集約しない。
///
/// # Returns
/// 投稿を試みたアカウント数
pub async fn post_to_accounts(
    manager: &LinkedInPostManager,
    cipher: &TokenCipher,
    accounts: &[SocialPostAccount],
    status: &str,
) -> usize {
    let mut attempted = 0;

    for account in accounts {
        let access_token = match cipher.decrypt(&account.token_encrypted) {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    account_id = %account.id,
                    "アクセストークンの復号に失敗（投稿をスキップ）"
                );
                continue;
            }
        };

        let post = Post::new(status, Some(account.provider_user_id.clone()))
            .with_profile_type(ProfileType::Person);

        attempted += 1;
        match manager.do_post(&access_token, &post).await {
            Ok(true) => {
                tracing::info!(account_id = %account.id, "LinkedIn 投稿完了");
            }
            Ok(false) => {
                tracing::warn!(account_id = %account.id, "LinkedIn 投稿失敗");
            }
            Err(e) => {
                tracing::error!(error = %e, account_id = %account.id, "LinkedIn 投稿エラー");
            }
        }
    }

    attempted
}
