pub mod accounts;
pub mod health;
pub mod linkedin;
pub mod login;
pub mod logout;
pub mod messages;
pub mod post;
pub mod register;

pub use accounts::list_accounts;
pub use health::health_check;
pub use linkedin::{callback as linkedin_callback, redirect_to_provider as linkedin_auth};
pub use login::login;
pub use logout::logout;
pub use messages::messages;
pub use post::post_status;
pub use register::register;
