//! # entrylog
//!
//! A structured JSON logger that turns arbitrary call arguments into one
//! sanitized, single-line JSON record per call.
//!
//! ## Features
//!
//! - **Never Fails**: a logging call cannot panic or error; unrepresentable
//!   inputs degrade to descriptive placeholder text
//! - **Sanitized Output**: sensitive fields masked by key name, oversized
//!   arrays truncated, cyclic values cut with a marker
//! - **Error Aware**: errors are pulled out of messages, parameters, and
//!   nested objects into a uniform `error` field
//! - **Ambient Context**: scoped request context merged into every record
//! - **Two Formats**: plain compact JSON for shippers, colorized JSON for
//!   terminals
//!
//! ## Example
//!
//! ```
//! use entrylog::{Level, Logger};
//!
//! let logger = Logger::builder()
//!     .level(Level::Debug)
//!     .development(false)
//!     .identity("orders", "1.4.0", "prod")
//!     .build()
//!     .unwrap();
//!
//! logger.log("order received");
//! ```

pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        ContextMap, ContextScope, ContextStore, FormData, FormField, Level, LogError, LogValue,
        Logger, LoggerBuilder, LoggerConfig, LoggerError, Result, ValueMap, DEFAULT_MASK_FIELDS,
    };
}

pub use crate::core::{
    extract_error_and_extra, find_nested_error, format_colored_json, prepare_message, render_plain,
    safe_stringify,
    sanitize_entry, strip_ansi, ArrayRef, ContextMap, ContextScope, ContextStore, FormData,
    FormField, InvalidMessageInfo, Level, LogError, LogValue, Logger, LoggerBuilder, LoggerConfig,
    LoggerError, NormalizedMessage, ObjectRef, Result, SanitizeOptions, ValueMap, Visited,
    DEFAULT_MASK_FIELDS,
};
