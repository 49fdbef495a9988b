//! # Storefront
//!
//! REST backend for a small online shop, built around its authentication flow.
//!
//! ## Features
//!
//! - **Accounts**: Registration, email verification and password recovery
//! - **Sessions**: Signed, expiring access tokens and a role-aware access gate
//! - **Catalog**: Seller-managed products with soft delete
//! - **Cart**: Per-user shopping cart
//!
//! Every response, success or failure, uses the same JSON envelope
//! (see [`response::ApiResponse`]).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use clap::Parser;
//! use storefront::{AppConfig, AppState, WebConfig, WebServer};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::parse();
//! let state = AppState::build(&config)?;
//! WebServer::new(WebConfig::from(&config), state, &config.cors_origins())
//!     .start()
//!     .await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// Registration, login, tokens and the access gate
pub mod auth;

/// Products and shopping cart
pub mod catalog;

/// Startup configuration
pub mod config;

/// Shared SQLite handle and schema
pub mod db;

/// Error taxonomy
pub mod error;

/// Logger setup
pub mod logging;

/// Response envelope
pub mod response;

/// HTTP server
pub mod servers;

/// Field validation rules
pub mod validation;

// ============================================================================
// INTERNAL MODULES (not exposed publicly)
// ============================================================================

mod extract;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use config::AppConfig;
pub use error::{Result, StorefrontError};
pub use response::ApiResponse;
pub use servers::{app_router, AppState, WebConfig, WebServer};

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
