/// Authentication and authorization primitives
///
/// # Modules
///
/// - [`jwt`]: signed, expiring access/refresh tokens (HS256)
/// - [`password`]: Argon2id password hashing and verification
/// - [`refresh_store`]: registry of the single live refresh token per user
/// - [`service`]: register/login/refresh/logout orchestration
/// - [`policy`]: declarative role policy table for routes
/// - [`identity`]: authenticated request identity

pub mod identity;
pub mod jwt;
pub mod password;
pub mod policy;
pub mod refresh_store;
pub mod service;
