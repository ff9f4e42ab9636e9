pub mod message;
pub mod post;
pub mod social_post_account;
pub mod user;

pub use message::{FlashMessage, MessageKind};
pub use post::{LifecycleState, Post, ProfileType, Visibility};
pub use social_post_account::{NewSocialPostAccount, SocialPostAccount};
pub use user::User;
