//! Configuration module for the lodge registry.
//!
//! All configuration is loaded from environment variables with sensible defaults.
//! Optional integrations are detected from their variables; an incomplete
//! block disables the feature instead of failing startup.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Serialize;

pub const DEFAULT_LODGE_NAME: &str = "ΑΚΡΟΠΟΛΙΣ Υπ ΑΡΙΘΜ 84";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Lodge name printed on member cards
    pub lodge_name: String,
    /// Directory holding DejaVuSans.ttf and DejaVuSans-Bold.ttf
    pub font_dir: PathBuf,
    /// SMTP settings, present only when complete
    pub email: Option<EmailConfig>,
    /// Chat assistant settings
    pub ai: Option<AiConfig>,
}

#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender_email: String,
    pub sender_password: String,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("sender_email", &self.sender_email)
            .field("sender_password", &redact(&self.sender_password))
            .finish()
    }
}

#[derive(Clone)]
pub struct AiConfig {
    pub api_key: String,
}

impl fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

/// Stand-in for a secret in debug output.
fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

/// Which parts of the application are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureFlags {
    pub core: bool,
    pub tasks: bool,
    pub email: bool,
    pub ai: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = var("LODGE_DB_PATH")
            .unwrap_or_else(|| "./data/lodge_members.sqlite".to_string())
            .into();

        let bind_addr = var("LODGE_BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid LODGE_BIND_ADDR format");

        let log_level = var("LODGE_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let lodge_name = var("LODGE_NAME").unwrap_or_else(|| DEFAULT_LODGE_NAME.to_string());

        let font_dir = var("LODGE_FONT_DIR")
            .unwrap_or_else(|| "/usr/share/fonts/truetype/dejavu".to_string())
            .into();

        Self {
            db_path,
            bind_addr,
            log_level,
            lodge_name,
            font_dir,
            email: email_from_vars(&var),
            ai: ai_from_vars(&var),
        }
    }

    pub fn features(&self) -> FeatureFlags {
        FeatureFlags {
            core: true,
            tasks: true,
            email: self.email.is_some(),
            ai: self.ai.is_some(),
        }
    }
}

fn email_from_vars(var: &impl Fn(&str) -> Option<String>) -> Option<EmailConfig> {
    Some(EmailConfig {
        smtp_server: non_empty(var("LODGE_SMTP_SERVER"))?,
        smtp_port: var("LODGE_SMTP_PORT")?.trim().parse().ok()?,
        sender_email: non_empty(var("LODGE_SENDER_EMAIL"))?,
        sender_password: non_empty(var("LODGE_SENDER_PASSWORD"))?,
    })
}

fn ai_from_vars(var: &impl Fn(&str) -> Option<String>) -> Option<AiConfig> {
    Some(AiConfig {
        api_key: non_empty(var("LODGE_AI_API_KEY"))?,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = config_from(&[]);

        assert_eq!(config.db_path, PathBuf::from("./data/lodge_members.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.lodge_name, DEFAULT_LODGE_NAME);
        assert!(config.email.is_none());
        assert!(config.ai.is_none());
        assert_eq!(
            config.features(),
            FeatureFlags {
                core: true,
                tasks: true,
                email: false,
                ai: false
            }
        );
    }

    #[test]
    fn test_complete_email_block_enables_email() {
        let config = config_from(&[
            ("LODGE_SMTP_SERVER", "smtp.example.org"),
            ("LODGE_SMTP_PORT", "587"),
            ("LODGE_SENDER_EMAIL", "secretary@example.org"),
            ("LODGE_SENDER_PASSWORD", "hunter2"),
        ]);

        let email = config.email.as_ref().unwrap();
        assert_eq!(email.smtp_port, 587);
        assert!(config.features().email);
        assert!(!format!("{:?}", email).contains("hunter2"));
    }

    #[test]
    fn test_incomplete_or_invalid_email_block_disables_email() {
        let missing_password = config_from(&[
            ("LODGE_SMTP_SERVER", "smtp.example.org"),
            ("LODGE_SMTP_PORT", "587"),
            ("LODGE_SENDER_EMAIL", "secretary@example.org"),
        ]);
        assert!(!missing_password.features().email);

        let bad_port = config_from(&[
            ("LODGE_SMTP_SERVER", "smtp.example.org"),
            ("LODGE_SMTP_PORT", "five-eight-seven"),
            ("LODGE_SENDER_EMAIL", "secretary@example.org"),
            ("LODGE_SENDER_PASSWORD", "hunter2"),
        ]);
        assert!(!bad_port.features().email);
    }

    #[test]
    fn test_ai_key_enables_ai() {
        assert!(config_from(&[("LODGE_AI_API_KEY", "key")]).features().ai);
        assert!(!config_from(&[("LODGE_AI_API_KEY", "  ")]).features().ai);
    }

    #[test]
    fn test_ai_key_is_redacted_in_debug_output() {
        let config = config_from(&[("LODGE_AI_API_KEY", "sk-live-123")]);
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-live-123"));
        assert!(debug.contains("api_key: \"<redacted>\""));
    }
}
