//! Core logger implementation
//!
//! `Logger` drives the whole pipeline for one call: level filter, message
//! normalization, argument extraction, record assembly, sanitization, and
//! formatting. Emission is one line on stdout; `render` exposes the same
//! pipeline as a pure function for callers that route output themselves.

use chrono::{SecondsFormat, Utc};
use std::io::Write;
use std::rc::Rc;

use super::config::LoggerConfig;
use super::context::ContextStore;
use super::error::Result;
use super::format::{format_colored_json, render_plain};
use super::log_level::Level;
use super::message::{extract_error_and_extra, prepare_message, NormalizedMessage};
use super::sanitize::{sanitize_entry, SanitizeOptions};
use super::value::{LogError, LogValue, ValueMap};

/// Structured JSON logger.
///
/// Configuration is fixed at construction. A logging call can never panic or
/// return an error; inputs that cannot be represented degrade to descriptive
/// placeholder text inside the record.
///
/// # Example
///
/// ```
/// use entrylog::{Level, Logger};
///
/// let logger = Logger::builder()
///     .level(Level::Log)
///     .development(false)
///     .build()
///     .unwrap();
/// logger.log("service started");
/// ```
#[derive(Debug, Clone)]
pub struct Logger {
    level: Level,
    is_development: bool,
    mask_fields: Vec<String>,
    max_array_length: usize,
    filter_events: Vec<String>,
    context: Option<ContextStore>,
    app_name: Option<String>,
    app_version: Option<String>,
    app_env: Option<String>,
}

impl Logger {
    /// Build a logger from a validated configuration, without an ambient
    /// context store.
    pub fn new(config: LoggerConfig) -> Result<Self> {
        Self::with_context(config, None)
    }

    /// Build a logger that snapshots ambient context from `context` on every
    /// call.
    pub fn with_context(config: LoggerConfig, context: Option<ContextStore>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            level: config.level,
            is_development: config.is_development,
            mask_fields: config.merged_mask_fields(),
            max_array_length: config.max_array_length,
            filter_events: config.filter_events,
            context,
            app_name: config.name,
            app_version: config.version,
            app_env: config.env,
        })
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// The configured minimum level.
    pub fn level(&self) -> Level {
        self.level
    }

    /// `"{name}-{version}-{env}"` when all three identity fields are
    /// configured, `None` otherwise.
    pub fn app_id(&self) -> Option<String> {
        match (&self.app_name, &self.app_version, &self.app_env) {
            (Some(name), Some(version), Some(env)) => Some(format!("{name}-{version}-{env}")),
            _ => None,
        }
    }

    pub fn verbose(&self, message: impl Into<LogValue>) {
        self.emit(Level::Verbose, message, Vec::new());
    }

    pub fn verbose_with(&self, message: impl Into<LogValue>, params: Vec<LogValue>) {
        self.emit(Level::Verbose, message, params);
    }

    pub fn debug(&self, message: impl Into<LogValue>) {
        self.emit(Level::Debug, message, Vec::new());
    }

    pub fn debug_with(&self, message: impl Into<LogValue>, params: Vec<LogValue>) {
        self.emit(Level::Debug, message, params);
    }

    pub fn log(&self, message: impl Into<LogValue>) {
        self.emit(Level::Log, message, Vec::new());
    }

    pub fn log_with(&self, message: impl Into<LogValue>, params: Vec<LogValue>) {
        self.emit(Level::Log, message, params);
    }

    pub fn warn(&self, message: impl Into<LogValue>) {
        self.emit(Level::Warn, message, Vec::new());
    }

    pub fn warn_with(&self, message: impl Into<LogValue>, params: Vec<LogValue>) {
        self.emit(Level::Warn, message, params);
    }

    pub fn error(&self, message: impl Into<LogValue>) {
        self.emit(Level::Error, message, Vec::new());
    }

    pub fn error_with(&self, message: impl Into<LogValue>, params: Vec<LogValue>) {
        self.emit(Level::Error, message, params);
    }

    pub fn fatal(&self, message: impl Into<LogValue>) {
        self.emit(Level::Fatal, message, Vec::new());
    }

    pub fn fatal_with(&self, message: impl Into<LogValue>, params: Vec<LogValue>) {
        self.emit(Level::Fatal, message, params);
    }

    /// Run the full pipeline and write one line to stdout. Suppressed calls
    /// and write failures are silent.
    pub fn emit(&self, level: Level, message: impl Into<LogValue>, params: Vec<LogValue>) {
        if let Some(line) = self.render(level, &message.into(), &params) {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            let _ = writeln!(handle, "{line}");
        }
    }

    /// Run the full pipeline and return the formatted line, or `None` when
    /// the call is suppressed by the level filter or an event filter.
    pub fn render(&self, level: Level, message: &LogValue, params: &[LogValue]) -> Option<String> {
        if !self.should_log(level) {
            return None;
        }

        let normalized = prepare_message(message);
        let (param_error, param_extra) = extract_error_and_extra(params, level);
        let error = param_error.or_else(|| normalized.error.clone());

        let record = self.assemble(level, &normalized, &param_extra, error);
        let sanitized = sanitize_entry(
            &record,
            &SanitizeOptions {
                mask_fields: &self.mask_fields,
                max_array_length: self.max_array_length,
            },
        );

        Some(if self.is_development {
            format_colored_json(&sanitized, level)
        } else {
            render_plain(&sanitized)
        })
    }

    fn should_log(&self, level: Level) -> bool {
        if level < self.level {
            return false;
        }
        if let Some(context) = &self.context {
            if let Some(serde_json::Value::String(event)) = context.get_context().get("event") {
                if self.filter_events.iter().any(|filtered| filtered == event) {
                    return false;
                }
            }
        }
        true
    }

    /// Assemble the raw record. Later sources override earlier ones on key
    /// collision, keeping the first occurrence's position.
    fn assemble(
        &self,
        level: Level,
        normalized: &NormalizedMessage,
        param_extra: &ValueMap,
        error: Option<Rc<LogError>>,
    ) -> ValueMap {
        let mut record = ValueMap::new();
        record.insert("level", level.as_str());
        record.insert(
            "timestamp",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        record.insert("pid", i64::from(std::process::id()));
        record.insert("message", normalized.message.clone());

        if let Some(app_id) = self.app_id() {
            record.insert("appId", app_id);
        }

        if let Some(context) = &self.context {
            for (key, value) in context.get_context() {
                record.insert(key, LogValue::from(value));
            }
        }

        if let Some(extra) = &normalized.extra {
            record.merge_from(&extra.borrow());
        }
        record.merge_from(param_extra);

        if let Some(invalid) = &normalized.invalid {
            record.insert("invalidMessageWarning", invalid.warning);
            if let Some(callstack) = &invalid.callstack {
                record.insert("invalidMessageCallstack", callstack.clone());
            }
            record.insert("originalMessageType", invalid.original_type);
            record.insert("originalMessage", invalid.original_message.clone());
        }

        if let Some(error) = error {
            record.insert("error", LogValue::Error(error));
        }

        record
    }
}

/// Step-by-step construction of a [`Logger`].
///
/// # Example
///
/// ```
/// use entrylog::{ContextStore, Level, Logger};
///
/// let logger = Logger::builder()
///     .level(Level::Verbose)
///     .development(true)
///     .mask_field("sessionKey")
///     .filter_event("/health")
///     .identity("svc", "1.0.0", "prod")
///     .context(ContextStore::new())
///     .build()
///     .unwrap();
/// assert_eq!(logger.app_id().as_deref(), Some("svc-1.0.0-prod"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LoggerBuilder {
    config: LoggerConfig,
    context: Option<ContextStore>,
}

impl LoggerBuilder {
    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.config.level = level;
        self
    }

    /// Parse and set the minimum level from its wire name.
    pub fn level_str(mut self, level: &str) -> Result<Self> {
        self.config.level = level.parse()?;
        Ok(self)
    }

    #[must_use]
    pub fn development(mut self, is_development: bool) -> Self {
        self.config.is_development = is_development;
        self
    }

    #[must_use]
    pub fn mask_field(mut self, token: impl Into<String>) -> Self {
        self.config.mask_fields.push(token.into());
        self
    }

    #[must_use]
    pub fn filter_event(mut self, event: impl Into<String>) -> Self {
        self.config.filter_events.push(event.into());
        self
    }

    #[must_use]
    pub fn max_array_length(mut self, max: usize) -> Self {
        self.config.max_array_length = max;
        self
    }

    #[must_use]
    pub fn identity(
        mut self,
        name: impl Into<String>,
        version: impl Into<String>,
        env: impl Into<String>,
    ) -> Self {
        self.config = self.config.with_identity(name, version, env);
        self
    }

    #[must_use]
    pub fn context(mut self, context: ContextStore) -> Self {
        self.context = Some(context);
        self
    }

    pub fn build(self) -> Result<Logger> {
        Logger::with_context(self.config, self.context)
    }
}
