//! User accounts, password handling and bearer token authentication.

mod log_in;
mod middleware;
mod password;
mod profile;
mod register_user;
mod token;
mod user;

pub use log_in::post_log_in;
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use profile::{get_user, upload_profile_image};
pub use register_user::register_user;
pub use token::DEFAULT_TOKEN_DURATION;
pub use user::{User, UserID, create_user_table};

#[cfg(test)]
pub(crate) use user::{NewUser, create_user};
