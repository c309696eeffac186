//! Log level definitions

use super::error::LoggerError;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The six log severities, ordered `Verbose < Debug < Log < Warn < Error < Fatal`.
///
/// The ordinal position drives level filtering; the wire representation is the
/// lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Verbose = 0,
    #[default]
    Debug = 1,
    Log = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Verbose => "verbose",
            Level::Debug => "debug",
            Level::Log => "log",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }

    /// Levels at which a bare string argument is promoted to a synthetic error.
    pub fn is_error_like(&self) -> bool {
        matches!(self, Level::Warn | Level::Error | Level::Fatal)
    }

    /// Wrap `text` in this level's severity color.
    pub fn colorize(&self, text: &str) -> String {
        match self {
            Level::Verbose => text.dimmed().to_string(),
            Level::Debug => text.blue().to_string(),
            Level::Log => text.black().on_green().to_string(),
            Level::Warn => text.yellow().to_string(),
            Level::Error => text.red().to_string(),
            Level::Fatal => text.white().on_red().to_string(),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Level {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verbose" => Ok(Level::Verbose),
            "debug" => Ok(Level::Debug),
            "log" => Ok(Level::Log),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            _ => Err(LoggerError::InvalidLevel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Verbose < Level::Debug);
        assert!(Level::Debug < Level::Log);
        assert!(Level::Log < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("warn".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("WARNING".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("Fatal".parse::<Level>().unwrap(), Level::Fatal);
        assert!("loud".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_display_matches_wire_format() {
        assert_eq!(Level::Verbose.to_string(), "verbose");
        assert_eq!(Level::Fatal.to_string(), "fatal");
    }

    #[test]
    fn test_error_like_levels() {
        assert!(!Level::Verbose.is_error_like());
        assert!(!Level::Debug.is_error_like());
        assert!(!Level::Log.is_error_like());
        assert!(Level::Warn.is_error_like());
        assert!(Level::Error.is_error_like());
        assert!(Level::Fatal.is_error_like());
    }
}
