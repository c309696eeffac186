//! Logging macros for ergonomic call sites.
//!
//! These macros forward a message plus any number of optional parameters to a
//! logger, converting each parameter through [`LogValue::from`](crate::LogValue).
//!
//! # Examples
//!
//! ```
//! use entrylog::prelude::*;
//! use entrylog::{error, warn};
//!
//! let logger = Logger::builder().development(false).build().unwrap();
//!
//! warn!(logger, "queue backlog growing");
//! error!(logger, "request failed", LogError::new("upstream timeout"));
//! ```

/// Log a message with optional parameters at an explicit level.
///
/// # Examples
///
/// ```
/// # use entrylog::prelude::*;
/// # let logger = Logger::builder().development(false).build().unwrap();
/// use entrylog::log;
/// log!(logger, Level::Log, "order shipped");
/// log!(logger, Level::Log, "order shipped", serde_json::json!({"orderId": "o-7"}));
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $message:expr $(,)?) => {
        $logger.emit($level, $message, ::std::vec::Vec::new())
    };
    ($logger:expr, $level:expr, $message:expr, $($param:expr),+ $(,)?) => {
        $logger.emit($level, $message, vec![$($crate::LogValue::from($param)),+])
    };
}

/// Log a verbose-level message.
#[macro_export]
macro_rules! verbose {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Verbose, $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use entrylog::prelude::*;
/// # let logger = Logger::builder().development(false).build().unwrap();
/// use entrylog::debug;
/// debug!(logger, "cache warmed");
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Log a warn-level message. String parameters become synthetic errors at
/// this level.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use entrylog::prelude::*;
/// # let logger = Logger::builder().development(false).build().unwrap();
/// use entrylog::error;
/// error!(logger, "payment declined", LogError::new("card expired"));
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Fatal, $($arg)+)
    };
}
