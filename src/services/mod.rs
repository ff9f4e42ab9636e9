pub mod auth;
pub mod bulk_post;
pub mod linkedin;
pub mod network;
pub mod token_cipher;

pub use auth::AuthService;
pub use linkedin::{LinkedInClient, LinkedInPostManager, LinkedInProfile};
pub use network::LinkedInPostNetwork;
pub use token_cipher::TokenCipher;
