// Modules for server components
pub mod web;

// Re-export public APIs
pub use web::{app_router, AppState, WebConfig, WebServer};
