//! Authentication module
//!
//! Provides complete authentication functionality:
//! - Account registration with email/password
//! - Email verification with signed, expiring tokens
//! - Password recovery via email
//! - JWT access tokens and the access gate for protected routes

pub mod database;
pub mod email;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod routes;
pub mod service;

pub use database::{CredentialStore, SqliteCredentialStore};
pub use email::{LogMailer, MailDispatcher, OutgoingMail};
pub use jwt::{TokenError, TokenService};
pub use middleware::{access_gate, AccessGate};
pub use models::*;
pub use password::CredentialHasher;
pub use routes::auth_router;
pub use service::AuthService;
