//! Configuration module for the Design Hub backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Google OAuth client settings.
#[derive(Debug, Clone, Default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Must match the redirect URI registered with Google
    pub redirect_uri: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
    /// HMAC secret for session tokens; a random one is generated when unset
    pub jwt_secret: Option<String>,
    pub jwt_issuer: String,
    pub google: GoogleConfig,
    /// Where the browser is sent after login
    pub frontend_url: String,
    /// Accounts promoted to admin on login (lowercase)
    pub admin_emails: Vec<String>,
    /// Load the sample team and resources into an empty database at startup
    pub seed_sample: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("HUB_DB_PATH")
            .unwrap_or_else(|_| "./data/hub.sqlite".to_string())
            .into();

        let index_path = env::var("HUB_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_addr_raw =
            env::var("HUB_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:5000".to_string());
        let bind_addr = bind_addr_raw.parse().map_err(|e| {
            AppError::Internal(format!("Invalid HUB_BIND_ADDR {:?}: {}", bind_addr_raw, e))
        })?;

        let log_level = env::var("HUB_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_json = env::var("HUB_LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let jwt_secret = env::var("HUB_JWT_SECRET").ok().filter(|s| !s.is_empty());
        let jwt_issuer = env::var("HUB_JWT_ISSUER").unwrap_or_else(|_| "design-hub".to_string());

        let google = GoogleConfig {
            client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            redirect_uri: env::var("GOOGLE_REDIRECT_URI").unwrap_or_else(|_| {
                "http://localhost:5000/api/auth/google/callback".to_string()
            }),
        };

        let frontend_url = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let admin_emails = env::var("HUB_ADMIN_EMAILS")
            .map(|raw| parse_email_list(&raw))
            .unwrap_or_default();

        let seed_sample = env::var("HUB_SEED_SAMPLE")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Ok(Self {
            db_path,
            index_path,
            bind_addr,
            log_level,
            log_json,
            jwt_secret,
            jwt_issuer,
            google,
            frontend_url,
            admin_emails,
            seed_sample,
        })
    }

    /// Whether the given email is on the admin bootstrap list.
    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|e| *e == email)
    }
}

fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        for key in [
            "HUB_DB_PATH",
            "HUB_INDEX_PATH",
            "HUB_BIND_ADDR",
            "HUB_LOG_LEVEL",
            "HUB_JWT_SECRET",
            "HUB_JWT_ISSUER",
            "GOOGLE_CLIENT_ID",
            "GOOGLE_REDIRECT_URI",
            "FRONTEND_URL",
            "HUB_ADMIN_EMAILS",
            "HUB_LOG_FORMAT",
            "HUB_SEED_SAMPLE",
        ] {
            env::remove_var(key);
        }

        let config = Config::from_env().unwrap();

        assert!(config.jwt_secret.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/hub.sqlite"));
        assert_eq!(config.index_path, PathBuf::from("./data/index"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:5000");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.jwt_issuer, "design-hub");
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert!(config.admin_emails.is_empty());
        assert!(!config.log_json);
        assert!(!config.seed_sample);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" 1 "));
        assert!(parse_flag("YES"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_parse_email_list() {
        let emails = parse_email_list(" Alex@Company.com, ,sarah@company.com ");
        assert_eq!(emails, vec!["alex@company.com", "sarah@company.com"]);
    }
}
