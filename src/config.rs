//! Configuration: TOML file, defaults and `DAILY_*` environment overrides.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::HeaderName;

use crate::error::{Error, Result};

/// Default user agent.
pub const USER_AGENT: &str = concat!("daily-gateway/", env!("CARGO_PKG_VERSION"));

/// Default connection timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Refresh endpoint.
pub const DEFAULT_REFRESH_PATH: &str = "/api/oauth/refresh";

/// Login page path used when navigation falls back to a hard redirect.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Default auth header.
pub const DEFAULT_HEADER_NAME: &str = "Authorization";

/// Business code for success.
pub const DEFAULT_SUCCESS_CODE: i64 = 200;

/// Business code for an invalid/absent session.
pub const DEFAULT_UNAUTHENTICATED_CODE: i64 = 401;

/// Business code for a stale-but-refreshable access token.
pub const DEFAULT_SESSION_EXPIRED_CODE: i64 = 410;

/// Identical notifications inside this window are shown once.
pub const DEFAULT_NOTIFY_COOLDOWN: Duration = Duration::from_secs(3);

/// Sweep the notification cache once it holds more entries than this.
pub const DEFAULT_NOTIFY_SWEEP_THRESHOLD: usize = 64;

// ---------------------------------------------------------------------------
// Environment override tracking
// ---------------------------------------------------------------------------

/// Tracks which settings were overridden by environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    overrides: HashMap<String, String>,
}

impl EnvOverrides {
    /// Whether a setting key (e.g. "api.base_url") is overridden by an env var.
    pub fn is_overridden(&self, key: &str) -> bool {
        self.overrides.contains_key(key)
    }

    /// The env var that overrides the given setting key.
    pub fn env_var_for(&self, key: &str) -> Option<&str> {
        self.overrides.get(key).map(String::as_str)
    }

    /// All overrides as a map of setting key -> env var name.
    pub fn all(&self) -> &HashMap<String, String> {
        &self.overrides
    }

    fn record(&mut self, key: &str, env_var: &str) {
        self.overrides.insert(key.to_string(), env_var.to_string());
    }
}

// ---------------------------------------------------------------------------
// Main configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub codes: StatusCodes,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Env var overrides are not serialized to TOML.
    #[serde(skip)]
    pub env_overrides: EnvOverrides,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Header carrying `Bearer <token>` on every call, refresh included.
    #[serde(default = "default_header_name")]
    pub header_name: String,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header_name: default_header_name(),
            refresh_path: default_refresh_path(),
            login_path: default_login_path(),
        }
    }
}

impl AuthConfig {
    /// The configured header as a validated [`HeaderName`].
    pub fn header(&self) -> Result<HeaderName> {
        HeaderName::from_bytes(self.header_name.as_bytes()).map_err(|e| {
            Error::Config(format!("Invalid auth header name '{}': {}", self.header_name, e))
        })
    }
}

/// Business codes of the `{code, message, data}` envelope.
///
/// These differ between deployments, so none of them is hardcoded in the
/// gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatusCodes {
    #[serde(default = "default_success_code")]
    pub success: i64,
    #[serde(default = "default_unauthenticated_code")]
    pub unauthenticated: i64,
    #[serde(default = "default_session_expired_code")]
    pub session_expired: i64,
}

impl Default for StatusCodes {
    fn default() -> Self {
        Self {
            success: DEFAULT_SUCCESS_CODE,
            unauthenticated: DEFAULT_UNAUTHENTICATED_CODE,
            session_expired: DEFAULT_SESSION_EXPIRED_CODE,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default = "default_sweep_threshold")]
    pub sweep_threshold: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            sweep_threshold: default_sweep_threshold(),
        }
    }
}

impl NotificationConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Storage file; the platform data directory is used when unset.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_user_agent() -> String {
    USER_AGENT.to_string()
}
const fn default_connect_timeout_secs() -> u64 {
    CONNECT_TIMEOUT.as_secs()
}
const fn default_request_timeout_secs() -> u64 {
    REQUEST_TIMEOUT.as_secs()
}
fn default_header_name() -> String {
    DEFAULT_HEADER_NAME.to_string()
}
fn default_refresh_path() -> String {
    DEFAULT_REFRESH_PATH.to_string()
}
fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}
const fn default_success_code() -> i64 {
    DEFAULT_SUCCESS_CODE
}
const fn default_unauthenticated_code() -> i64 {
    DEFAULT_UNAUTHENTICATED_CODE
}
const fn default_session_expired_code() -> i64 {
    DEFAULT_SESSION_EXPIRED_CODE
}
fn default_cooldown_ms() -> u64 {
    DEFAULT_NOTIFY_COOLDOWN.as_millis() as u64
}
const fn default_sweep_threshold() -> usize {
    DEFAULT_NOTIFY_SWEEP_THRESHOLD
}
fn default_log_level() -> String {
    "info".to_string()
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a TOML file, then apply `DAILY_*` env overrides.
    ///
    /// A missing file is not an error: defaults are used.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Save the file-level configuration (without env overrides) as TOML.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the gateway cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.auth.header()?;
        if !self.auth.refresh_path.starts_with('/') {
            return Err(Error::Config(format!(
                "auth.refresh_path must start with '/': '{}'",
                self.auth.refresh_path
            )));
        }
        let codes = self.codes;
        if codes.success == codes.unauthenticated
            || codes.success == codes.session_expired
            || codes.unauthenticated == codes.session_expired
        {
            return Err(Error::Config(format!(
                "business codes must be distinct: success={}, unauthenticated={}, session_expired={}",
                codes.success, codes.unauthenticated, codes.session_expired
            )));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides using `lookup` to read variables.
    ///
    /// Every supported setting has a `DAILY_*` variable. When set, the value
    /// replaces the file/default value and the key is recorded in
    /// `env_overrides`. Unparseable numbers are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let mut ov = EnvOverrides::default();

        macro_rules! env_str {
            ($key:expr, $env:expr, $field:expr) => {
                if let Some(val) = lookup($env) {
                    $field = val;
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_bool {
            ($key:expr, $env:expr, $field:expr) => {
                if let Some(val) = lookup($env) {
                    $field = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_parse {
            ($key:expr, $env:expr, $field:expr) => {
                if let Some(val) = lookup($env) {
                    if let Ok(parsed) = val.trim().parse() {
                        $field = parsed;
                        ov.record($key, $env);
                    }
                }
            };
        }

        // -- API --
        env_str!("api.base_url", "DAILY_API_BASE", self.api.base_url);
        env_str!("api.user_agent", "DAILY_API_USER_AGENT", self.api.user_agent);
        env_parse!("api.connect_timeout_secs", "DAILY_API_CONNECT_TIMEOUT", self.api.connect_timeout_secs);
        env_parse!("api.request_timeout_secs", "DAILY_API_REQUEST_TIMEOUT", self.api.request_timeout_secs);

        // -- Auth --
        env_str!("auth.header_name", "DAILY_AUTH_HEADER", self.auth.header_name);
        env_str!("auth.refresh_path", "DAILY_AUTH_REFRESH_PATH", self.auth.refresh_path);
        env_str!("auth.login_path", "DAILY_AUTH_LOGIN_PATH", self.auth.login_path);

        // -- Codes --
        env_parse!("codes.success", "DAILY_CODE_SUCCESS", self.codes.success);
        env_parse!("codes.unauthenticated", "DAILY_CODE_UNAUTHENTICATED", self.codes.unauthenticated);
        env_parse!("codes.session_expired", "DAILY_CODE_SESSION_EXPIRED", self.codes.session_expired);

        // -- Notifications --
        env_parse!("notifications.cooldown_ms", "DAILY_NOTIFY_COOLDOWN_MS", self.notifications.cooldown_ms);
        env_parse!(
            "notifications.sweep_threshold",
            "DAILY_NOTIFY_SWEEP_THRESHOLD",
            self.notifications.sweep_threshold
        );

        // -- Storage --
        if let Some(val) = lookup("DAILY_STORAGE_PATH") {
            self.storage.path = if val.is_empty() { None } else { Some(PathBuf::from(val)) };
            ov.record("storage.path", "DAILY_STORAGE_PATH");
        }

        // -- Logging --
        env_str!("logging.level", "DAILY_LOG_LEVEL", self.logging.level);
        env_bool!("logging.json", "DAILY_LOG_JSON", self.logging.json);

        self.env_overrides = ov;
    }
}
