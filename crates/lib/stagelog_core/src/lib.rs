//! # stagelog_core
//!
//! Core identity and session domain logic for Stagelog.
//!
//! Token codec, password and refresh-token hashing, login-attempt
//! tracking, OAuth2 identity resolution, and the database queries they
//! share. HTTP concerns live in `stagelog_api`.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod oauth2;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
