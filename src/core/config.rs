//! Logger configuration

use serde::{Deserialize, Serialize};

use super::error::{LoggerError, Result};
use super::log_level::Level;

/// Field-name tokens that always trigger masking, regardless of caller
/// additions. Matching is a case-insensitive substring test against the key.
pub const DEFAULT_MASK_FIELDS: [&str; 8] = [
    "password",
    "secret",
    "token",
    "authorization",
    "cookie",
    "apiKey",
    "apiSecret",
    "apiPass",
];

/// Configuration for a [`Logger`](crate::Logger).
///
/// Immutable once the logger is built; reconfiguration means building a new
/// logger.
///
/// # Example
///
/// ```
/// use entrylog::{Level, LoggerConfig};
///
/// let config = LoggerConfig {
///     level: Level::Log,
///     is_development: false,
///     mask_fields: vec!["sessionKey".to_string()],
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Minimum level that is emitted
    pub level: Level,

    /// Selects the output formatter
    ///
    /// - `true`: colorized JSON for terminal reading
    /// - `false`: plain compact JSON for log shippers
    pub is_development: bool,

    /// Extra field-name tokens to mask, unioned with [`DEFAULT_MASK_FIELDS`]
    pub mask_fields: Vec<String>,

    /// Arrays longer than this are truncated with a summary entry
    pub max_array_length: usize,

    /// Records whose ambient context carries one of these `event` values are
    /// dropped before any processing
    pub filter_events: Vec<String>,

    /// Application name, part of `appId`
    pub name: Option<String>,

    /// Application version, part of `appId`
    pub version: Option<String>,

    /// Deployment environment, part of `appId`
    ///
    /// `appId` is emitted as `"{name}-{version}-{env}"` only when all three
    /// identity fields are set.
    pub env: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Level::Debug,
            is_development: true,
            mask_fields: Vec::new(),
            max_array_length: 100,
            filter_events: Vec::new(),
            name: None,
            version: None,
            env: None,
        }
    }
}

impl LoggerConfig {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Check the configuration for values that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.mask_fields.iter().any(|token| token.trim().is_empty()) {
            return Err(LoggerError::config(
                "mask_fields",
                "mask tokens must be non-empty",
            ));
        }
        if self.filter_events.iter().any(|event| event.is_empty()) {
            return Err(LoggerError::config(
                "filter_events",
                "filtered event names must be non-empty",
            ));
        }
        Ok(())
    }

    /// The baseline mask tokens unioned with the caller's additions, first
    /// occurrence wins on duplicates.
    pub fn merged_mask_fields(&self) -> Vec<String> {
        let mut merged: Vec<String> = DEFAULT_MASK_FIELDS.iter().map(|s| s.to_string()).collect();
        for token in &self.mask_fields {
            if !merged.iter().any(|existing| existing == token) {
                merged.push(token.clone());
            }
        }
        merged
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_development(mut self, is_development: bool) -> Self {
        self.is_development = is_development;
        self
    }

    #[must_use]
    pub fn with_mask_fields(mut self, fields: Vec<String>) -> Self {
        self.mask_fields = fields;
        self
    }

    #[must_use]
    pub fn with_max_array_length(mut self, max: usize) -> Self {
        self.max_array_length = max;
        self
    }

    #[must_use]
    pub fn with_filter_events(mut self, events: Vec<String>) -> Self {
        self.filter_events = events;
        self
    }

    /// Set all three identity fields at once.
    #[must_use]
    pub fn with_identity(
        mut self,
        name: impl Into<String>,
        version: impl Into<String>,
        env: impl Into<String>,
    ) -> Self {
        self.name = Some(name.into());
        self.version = Some(version.into());
        self.env = Some(env.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, Level::Debug);
        assert!(config.is_development);
        assert_eq!(config.max_array_length, 100);
        assert!(config.mask_fields.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merged_mask_fields_unions_without_duplicates() {
        let config = LoggerConfig::default()
            .with_mask_fields(vec!["sessionKey".to_string(), "token".to_string()]);
        let merged = config.merged_mask_fields();
        assert_eq!(merged.len(), DEFAULT_MASK_FIELDS.len() + 1);
        assert!(merged.contains(&"sessionKey".to_string()));
        assert_eq!(
            merged.iter().filter(|t| t.as_str() == "token").count(),
            1
        );
    }

    #[test]
    fn test_validate_rejects_blank_mask_token() {
        let config = LoggerConfig::default().with_mask_fields(vec!["  ".to_string()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_filter_event() {
        let config = LoggerConfig::default().with_filter_events(vec![String::new()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = LoggerConfig::new(Level::Warn).with_identity("svc", "1.2.3", "prod");
        let json = serde_json::to_string(&config).unwrap();
        let back: LoggerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.level, Level::Warn);
        assert_eq!(back.name.as_deref(), Some("svc"));
    }
}
