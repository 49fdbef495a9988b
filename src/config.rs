//! Process-wide configuration.
//!
//! Parsed once at startup from flags or environment variables and handed by
//! reference to the components that need it. Nothing reads the environment
//! after this point.

use std::fmt;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Clone)]
#[command(name = "storefront", version, about)]
pub struct AppConfig {
    /// Interface to bind the HTTP server on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the HTTP server
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Path to the SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "data/storefront.db")]
    pub database_path: PathBuf,

    /// Secret used to sign and verify every token
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,

    /// Base URL of the frontend, used to build verification and recovery links
    #[arg(long, env = "URL_FRONTEND", default_value = "http://localhost:5173")]
    pub frontend_url: String,

    /// Origins allowed by CORS. Defaults to the frontend URL.
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Lifetime of verification, access and reset tokens
    #[arg(long, env = "TOKEN_TTL_HOURS", default_value_t = 24)]
    pub token_ttl_hours: i64,

    /// Argon2 memory cost in KiB
    #[arg(long, env = "HASH_MEMORY_KIB", default_value_t = 19_456)]
    pub hash_memory_kib: u32,

    /// Argon2 iteration count
    #[arg(long, env = "HASH_ITERATIONS", default_value_t = 2)]
    pub hash_iterations: u32,

    /// Argon2 lanes
    #[arg(long, env = "HASH_PARALLELISM", default_value_t = 1)]
    pub hash_parallelism: u32,

    /// SMTP relay. Without it mail is only logged.
    #[arg(long, env = "SMTP_HOST")]
    pub smtp_host: Option<String>,

    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,

    #[arg(long, env = "EMAIL_USER")]
    pub smtp_username: Option<String>,

    #[arg(long, env = "EMAIL_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// Sender address for outgoing mail. Defaults to the SMTP user.
    #[arg(long, env = "MAIL_FROM")]
    pub mail_from: Option<String>,

    /// Write rotating log files here instead of stderr
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours)
    }

    pub fn cors_origins(&self) -> Vec<String> {
        if self.allowed_origins.is_empty() {
            vec![self.frontend_url.clone()]
        } else {
            self.allowed_origins.clone()
        }
    }

    /// SMTP settings, present only when host and credentials are all set.
    pub fn smtp(&self) -> Option<SmtpSettings> {
        let host = self.smtp_host.clone()?;
        let username = self.smtp_username.clone()?;
        let password = self.smtp_password.clone()?;
        let from = self.mail_from.clone().unwrap_or_else(|| username.clone());
        Some(SmtpSettings {
            host,
            port: self.smtp_port,
            username,
            password,
            from,
        })
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_path", &self.database_path)
            .field("secret_key", &"<redacted>")
            .field("frontend_url", &self.frontend_url)
            .field("allowed_origins", &self.allowed_origins)
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("smtp_host", &self.smtp_host)
            .field("log_dir", &self.log_dir)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}
