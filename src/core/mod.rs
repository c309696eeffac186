//! Core logging pipeline types

pub mod config;
pub mod context;
pub mod error;
pub mod format;
pub mod log_level;
pub mod logger;
pub mod message;
pub mod sanitize;
pub mod value;

pub use config::{LoggerConfig, DEFAULT_MASK_FIELDS};
pub use context::{ContextMap, ContextScope, ContextStore};
pub use error::{LoggerError, Result};
pub use format::{format_colored_json, render_plain, safe_stringify, strip_ansi};
pub use log_level::Level;
pub use logger::{Logger, LoggerBuilder};
pub use message::{
    extract_error_and_extra, prepare_message, InvalidMessageInfo, NormalizedMessage,
};
pub use sanitize::{find_nested_error, sanitize_entry, SanitizeOptions, Visited};
pub use value::{ArrayRef, FormData, FormField, LogError, LogValue, ObjectRef, ValueMap};
