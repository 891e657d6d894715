//! Internal protocol elements. Items defined in this module *may* change
//! between releases without notice.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod error;

pub use self::error::*;

/// Which cache an administrative flush is aimed at.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CacheEntryType {
    Account,
    Config,
    Cos,
    Domain,
    Server,
}

impl FromStr for CacheEntryType {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "account" => Ok(CacheEntryType::Account),
            "config" => Ok(CacheEntryType::Config),
            "cos" => Ok(CacheEntryType::Cos),
            "domain" => Ok(CacheEntryType::Domain),
            "server" => Ok(CacheEntryType::Server),
            _ => Err(OperationError::InvalidRequest(format!(
                "invalid cache type {}",
                s
            ))),
        }
    }
}

impl fmt::Display for CacheEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CacheEntryType::Account => "account",
            CacheEntryType::Config => "config",
            CacheEntryType::Cos => "cos",
            CacheEntryType::Domain => "domain",
            CacheEntryType::Server => "server",
        })
    }
}

/// How a flush selector identifies its entry.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CacheEntryBy {
    Id,
    Name,
}

/// One entry to invalidate in a flush request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CacheEntrySelector {
    pub by: CacheEntryBy,
    pub key: String,
}

impl CacheEntrySelector {
    pub fn by_id(key: &str) -> Self {
        CacheEntrySelector {
            by: CacheEntryBy::Id,
            key: key.to_string(),
        }
    }

    pub fn by_name(key: &str) -> Self {
        CacheEntrySelector {
            by: CacheEntryBy::Name,
            key: key.to_string(),
        }
    }
}
