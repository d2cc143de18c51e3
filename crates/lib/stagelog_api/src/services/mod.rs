//! Business services behind the request handlers.

pub mod auth;
pub mod login_attempts;
pub mod users;
