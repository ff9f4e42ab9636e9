pub mod social_post_account;
pub mod user;

#[cfg(test)]
pub mod in_memory;

#[cfg(test)]
pub use in_memory::InMemorySocialPostAccountRepository;
pub use social_post_account::{PgSocialPostAccountRepository, SocialPostAccountRepository};
pub use user::UserRepository;

/// 指定した一意制約への違反かどうか
pub(crate) fn is_unique_violation(error: &sqlx::Error, constraint: &str) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db_err) if db_err.constraint() == Some(constraint)
    )
}
