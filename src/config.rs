use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_SQUARE_BASE_URL: &str = "https://connect.squareupsandbox.com";
const DEFAULT_MEMBERSTACK_BASE_URL: &str = "https://admin.memberstack.com";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Square API access token
    #[validate(length(min = 1))]
    pub square_access_token: String,

    /// Square API base URL (sandbox by default)
    #[serde(default = "default_square_base_url")]
    pub square_base_url: String,

    /// Square location checkouts are created under
    #[validate(length(min = 1))]
    pub square_location_id: String,

    /// Webhook signature key from the Square developer dashboard.
    /// When unset, inbound webhook signatures are not verified.
    #[serde(default)]
    pub square_webhook_secret: Option<String>,

    /// Notification URL the webhook subscription was registered with;
    /// part of the signed payload when verifying signatures.
    #[serde(default)]
    pub square_webhook_notification_url: Option<String>,

    /// Memberstack admin API secret
    #[validate(length(min = 1))]
    pub memberstack_secret: String,

    /// Memberstack admin API base URL
    #[serde(default = "default_memberstack_base_url")]
    pub memberstack_base_url: String,

    /// URL of the promo-code table (a sheet values endpoint returning JSON rows)
    #[validate(url)]
    pub promo_table_url: String,

    /// Base URL the buyer is sent to after a completed checkout
    #[validate(url)]
    pub checkout_redirect_url: String,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// Timeout applied to every outbound HTTP call (seconds)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_square_base_url() -> String {
    DEFAULT_SQUARE_BASE_URL.to_string()
}

fn default_memberstack_base_url() -> String {
    DEFAULT_MEMBERSTACK_BASE_URL.to_string()
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
            || self.environment.eq_ignore_ascii_case("dev")
    }

    /// Permissive CORS is only acceptable in development or with an explicit override.
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    /// Signature verification signs the notification URL together with the
    /// body, so a secret without a URL would reject every inbound webhook.
    /// Catch that at boot instead of serving 401s.
    pub fn validate_webhook_signing(&self) -> Result<(), AppConfigError> {
        if self.square_webhook_secret.is_some() && self.square_webhook_notification_url.is_none() {
            return Err(AppConfigError::Invalid(
                "square_webhook_notification_url must be set when square_webhook_secret is configured"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Load application configuration from files and environment.
///
/// Sources, later entries overriding earlier ones:
/// 1. Built-in defaults
/// 2. `config/default` and `config/<env>` files (optional)
/// 3. `APP__*` environment variables (e.g. `APP__SQUARE_ACCESS_TOKEN`)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // Secrets have no defaults - they MUST be provided via environment
    // variables or config files.
    let config = Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("square_base_url", DEFAULT_SQUARE_BASE_URL)?
        .set_default("memberstack_base_url", DEFAULT_MEMBERSTACK_BASE_URL)?
        .set_default("http_timeout_secs", DEFAULT_HTTP_TIMEOUT_SECS as i64)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    for key in ["square_access_token", "memberstack_secret"] {
        if config.get_string(key).is_err() {
            error!(
                "{} is not configured. Set APP__{} in the environment.",
                key,
                key.to_uppercase()
            );
        }
    }

    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate()?;
    app_config.validate_webhook_signing()?;

    if app_config.square_webhook_secret.is_none() {
        info!("Square webhook signature verification disabled (no secret configured)");
    }

    Ok(app_config)
}

/// Initialize the tracing subscriber honoring `RUST_LOG` when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("membersync_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            host: "0.0.0.0".into(),
            port: 8080,
            environment: "development".into(),
            log_level: "info".into(),
            log_json: false,
            square_access_token: "sandbox-token".into(),
            square_base_url: DEFAULT_SQUARE_BASE_URL.into(),
            square_location_id: "L3PDBG0452N3H".into(),
            square_webhook_secret: None,
            square_webhook_notification_url: None,
            memberstack_secret: "sk_sb_test".into(),
            memberstack_base_url: DEFAULT_MEMBERSTACK_BASE_URL.into(),
            promo_table_url: "https://sheets.example.com/v4/promos/values/A:D".into(),
            checkout_redirect_url: "https://shop.example.com/thanks".into(),
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            http_timeout_secs: 30,
        }
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn empty_secret_fails_validation() {
        let mut cfg = base_config();
        cfg.memberstack_secret = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn webhook_secret_without_notification_url_is_rejected() {
        let mut cfg = base_config();
        cfg.square_webhook_secret = Some("wh_secret".into());
        assert!(matches!(
            cfg.validate_webhook_signing(),
            Err(AppConfigError::Invalid(_))
        ));

        cfg.square_webhook_notification_url = Some("https://api.example.com/webhook".into());
        assert!(cfg.validate_webhook_signing().is_ok());

        let unsigned = base_config();
        assert!(unsigned.validate_webhook_signing().is_ok());
    }

    #[test]
    fn permissive_cors_allowed_in_development() {
        let cfg = base_config();
        assert!(cfg.should_allow_permissive_cors());

        let mut prod = base_config();
        prod.environment = "production".into();
        assert!(!prod.should_allow_permissive_cors());

        prod.cors_allow_any_origin = true;
        assert!(prod.should_allow_permissive_cors());
    }
}
