//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default location of the question/item catalog.
pub const DEFAULT_CATALOG_PATH: &str = "./data/catalog.json";

/// Bot configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram Bot API token.
    pub bot_token: SecretString,
    /// Usernames or numeric ids allowed to use the bot. `*` admits everyone.
    pub allowed_users: Vec<String>,
    /// Path to the JSON catalog.
    pub catalog_path: PathBuf,
    /// Long-poll timeout passed to `getUpdates`.
    pub poll_timeout: Duration,
}

impl BotConfig {
    /// Build the config from environment variables.
    ///
    /// `TELEGRAM_BOT_TOKEN` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN".to_string()))?;
        if bot_token.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "TELEGRAM_BOT_TOKEN".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        let allowed_users = parse_allowed_users(
            &std::env::var("TELEGRAM_ALLOWED_USERS").unwrap_or_else(|_| "*".to_string()),
        );

        let catalog_path = std::env::var("QUIZ_CATALOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CATALOG_PATH));

        let poll_timeout = match std::env::var("QUIZ_POLL_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "QUIZ_POLL_TIMEOUT_SECS".to_string(),
                    message: format!("expected whole seconds, got {raw:?}"),
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(30),
        };

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            allowed_users,
            catalog_path,
            poll_timeout,
        })
    }

    /// Human-readable summary of the allowlist for the startup banner.
    pub fn allowed_users_label(&self) -> String {
        if self.allowed_users.iter().any(|u| u == "*") {
            "everyone".to_string()
        } else if self.allowed_users.is_empty() {
            "none (deny all)".to_string()
        } else {
            self.allowed_users.join(", ")
        }
    }
}

/// Split a comma-separated allowlist, dropping blanks.
pub fn parse_allowed_users(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
