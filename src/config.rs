use serde::{Deserialize, Serialize};

use crate::error::{EntitlementError, Result};
use crate::utils::{get_env_with_prefix, parse_env_with_prefix};

/// Top-level configuration for the entitlement engine
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub enforcement: EnforcementConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

/// Thresholds used by the status and upgrade-advisory views.
///
/// Decisions from `check_action_allowed` do not depend on any of these;
/// quota denials always happen at `current >= limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnforcementConfig {
    /// Usage percentage at which a `warning` is raised.
    #[serde(default = "default_usage_warning_percent")]
    pub usage_warning_percent: u32,
    /// Usage percentage at which the warning becomes `critical`.
    #[serde(default = "default_usage_critical_percent")]
    pub usage_critical_percent: u32,
    /// Days before the subscription end date at which a `warning` is raised.
    #[serde(default = "default_expiry_warning_days")]
    pub expiry_warning_days: i64,
    /// Days before the subscription end date at which the warning becomes `critical`.
    #[serde(default = "default_expiry_critical_days")]
    pub expiry_critical_days: i64,
    /// Usage percentage at which an upgrade is suggested.
    #[serde(default = "default_suggestion_percent")]
    pub suggestion_percent: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            usage_warning_percent: default_usage_warning_percent(),
            usage_critical_percent: default_usage_critical_percent(),
            expiry_warning_days: default_expiry_warning_days(),
            expiry_critical_days: default_expiry_critical_days(),
            suggestion_percent: default_suggestion_percent(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

fn default_usage_warning_percent() -> u32 {
    80
}

fn default_usage_critical_percent() -> u32 {
    95
}

fn default_expiry_warning_days() -> i64 {
    7
}

fn default_expiry_critical_days() -> i64 {
    3
}

fn default_suggestion_percent() -> u32 {
    80
}

impl EnforcementConfig {
    /// Load thresholds from `UMRAH_*` environment variables, keeping defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = parse_env_with_prefix("USAGE_WARNING_PERCENT") {
            config.usage_warning_percent = v;
        }
        if let Some(v) = parse_env_with_prefix("USAGE_CRITICAL_PERCENT") {
            config.usage_critical_percent = v;
        }
        if let Some(v) = parse_env_with_prefix("EXPIRY_WARNING_DAYS") {
            config.expiry_warning_days = v;
        }
        if let Some(v) = parse_env_with_prefix("EXPIRY_CRITICAL_DAYS") {
            config.expiry_critical_days = v;
        }
        if let Some(v) = parse_env_with_prefix("SUGGESTION_PERCENT") {
            config.suggestion_percent = v;
        }
        config
    }

    fn validate(&self) -> Result<()> {
        if self.usage_warning_percent == 0 || self.usage_warning_percent > 100 {
            return Err(EntitlementError::bad_request(format!(
                "Usage warning percent must be between 1 and 100, got {}",
                self.usage_warning_percent
            )));
        }

        if self.usage_critical_percent > 100
            || self.usage_critical_percent < self.usage_warning_percent
        {
            return Err(EntitlementError::bad_request(format!(
                "Usage critical percent must be between {} and 100, got {}",
                self.usage_warning_percent, self.usage_critical_percent
            )));
        }

        if self.expiry_critical_days < 0 || self.expiry_warning_days < self.expiry_critical_days {
            return Err(EntitlementError::bad_request(format!(
                "Expiry thresholds must satisfy 0 <= critical ({}) <= warning ({})",
                self.expiry_critical_days, self.expiry_warning_days
            )));
        }

        if self.suggestion_percent == 0 || self.suggestion_percent > 100 {
            return Err(EntitlementError::bad_request(format!(
                "Suggestion percent must be between 1 and 100, got {}",
                self.suggestion_percent
            )));
        }

        Ok(())
    }
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_enforcement(mut self, enforcement: EnforcementConfig) -> Self {
        self.config.enforcement = enforcement;
        self
    }

    pub fn with_usage_thresholds(mut self, warning_percent: u32, critical_percent: u32) -> Self {
        self.config.enforcement.usage_warning_percent = warning_percent;
        self.config.enforcement.usage_critical_percent = critical_percent;
        self
    }

    pub fn with_expiry_thresholds(mut self, warning_days: i64, critical_days: i64) -> Self {
        self.config.enforcement.expiry_warning_days = warning_days;
        self.config.enforcement.expiry_critical_days = critical_days;
        self
    }

    pub fn with_suggestion_percent(mut self, percent: u32) -> Self {
        self.config.enforcement.suggestion_percent = percent;
        self
    }

    /// Load configuration from environment variables with UMRAH_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }

        self.config.enforcement = EnforcementConfig::from_env();

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns an error if the log level is unknown or the thresholds are
    /// out of range or inverted.
    pub fn build(self) -> Result<Config> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(EntitlementError::bad_request(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        self.config.enforcement.validate()?;

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
