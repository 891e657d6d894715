#![warn(unused_extern_crates)]
#![allow(non_snake_case)]
use std::fmt;
use std::str::FromStr;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Deserialize;
use tracing_forest::printer::TestCapturePrinter;
use tracing_forest::tag::NoTag;
use tracing_forest::util::*;
use tracing_subscriber::prelude::*;

pub mod macros;
pub mod pipeline;

pub use {tracing, tracing_forest, tracing_subscriber};

/// Start up the logging for test mode.
pub fn test_init() {
    let filter = EnvFilter::from_default_env().add_directive(LevelFilter::TRACE.into());

    // start the logging!
    let _ = tracing_subscriber::Registry::default()
        .with(ForestLayer::new(TestCapturePrinter::new(), NoTag).with_filter(filter))
        .try_init();
}

#[derive(Debug, Clone, Copy, IntoPrimitive, TryFromPrimitive)]
#[repr(u64)]
pub enum EventTag {
    AdminDebug,
    AdminError,
    AdminWarn,
    AdminInfo,
    SchemaError,
    SchemaWarn,
    SchemaInfo,
    CacheDebug,
    CacheTrace,
    CallbackError,
    CallbackWarn,
}

impl EventTag {
    pub fn pretty(self) -> &'static str {
        match self {
            EventTag::AdminDebug => "admin.debug",
            EventTag::AdminError => "admin.error",
            EventTag::AdminWarn => "admin.warn",
            EventTag::AdminInfo => "admin.info",
            EventTag::SchemaError => "schema.error",
            EventTag::SchemaWarn => "schema.warn",
            EventTag::SchemaInfo => "schema.info",
            EventTag::CacheDebug => "cache.debug",
            EventTag::CacheTrace => "cache.trace",
            EventTag::CallbackError => "callback.error",
            EventTag::CallbackWarn => "callback.warn",
        }
    }

    pub fn emoji(self) -> &'static str {
        use EventTag::*;
        match self {
            AdminDebug | CacheDebug => "🐛",
            AdminError | SchemaError | CallbackError => "🚨",
            AdminWarn | SchemaWarn | CallbackWarn => "⚠️",
            AdminInfo | SchemaInfo => "ℹ️",
            CacheTrace => "📍",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err("Must be one of info, debug, trace"),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    }
}

impl From<LogLevel> for EnvFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Info => EnvFilter::new("info"),
            LogLevel::Debug => EnvFilter::new("debug"),
            LogLevel::Trace => EnvFilter::new("trace"),
        }
    }
}

impl From<LogLevel> for tracing_subscriber::filter::Directive {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Info => LevelFilter::INFO.into(),
            LogLevel::Debug => LevelFilter::DEBUG.into(),
            LogLevel::Trace => LevelFilter::TRACE.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eventtag_round_trip() {
        let id: u64 = EventTag::CacheTrace.into();
        let tag = EventTag::try_from(id).expect("tag id should map back");
        assert_eq!(tag.pretty(), "cache.trace");
    }

    #[test]
    fn test_loglevel_parse() {
        assert_eq!(LogLevel::from_str("debug"), Ok(LogLevel::Debug));
        assert!(LogLevel::from_str("loud").is_err());
        assert_eq!(LogLevel::Trace.to_string(), "trace");
    }
}
