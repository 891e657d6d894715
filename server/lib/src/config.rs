//! Cache sizing and expiry, loaded from TOML. Every field is optional:
//!
//! ```toml
//! account_maxsize = 20000
//! account_maxage = 900
//! domain_nx_enabled = true
//! require_uuid_ids = false
//! log_level = "debug"
//! ```
//!
//! Ages are in seconds and `0` means entries never expire. Sizes bound each key
//! index of a cache and must be non-zero.

use std::fs::File;
use std::io::Read;
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use sketching::LogLevel;

use crate::prelude::*;
use crate::schema::ValidationPolicy;

fn default_account_maxsize() -> usize {
    DEFAULT_ACCOUNT_CACHE_MAXSIZE
}

fn default_domain_maxsize() -> usize {
    DEFAULT_DOMAIN_CACHE_MAXSIZE
}

fn default_domain_nx_maxsize() -> usize {
    DEFAULT_DOMAIN_NX_CACHE_MAXSIZE
}

fn default_cos_maxsize() -> usize {
    DEFAULT_COS_CACHE_MAXSIZE
}

fn default_server_maxsize() -> usize {
    DEFAULT_SERVER_CACHE_MAXSIZE
}

fn default_maxage() -> u64 {
    DEFAULT_CACHE_MAXAGE
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default = "default_account_maxsize")]
    pub account_maxsize: usize,
    #[serde(default = "default_maxage")]
    pub account_maxage: u64,
    #[serde(default = "default_domain_maxsize")]
    pub domain_maxsize: usize,
    #[serde(default = "default_maxage")]
    pub domain_maxage: u64,
    /// Remember domain lookups that found nothing.
    #[serde(default = "default_true")]
    pub domain_nx_enabled: bool,
    #[serde(default = "default_domain_nx_maxsize")]
    pub domain_nx_maxsize: usize,
    #[serde(default = "default_maxage")]
    pub domain_nx_maxage: u64,
    #[serde(default = "default_cos_maxsize")]
    pub cos_maxsize: usize,
    #[serde(default = "default_maxage")]
    pub cos_maxage: u64,
    #[serde(default = "default_server_maxsize")]
    pub server_maxsize: usize,
    #[serde(default = "default_maxage")]
    pub server_maxage: u64,
    /// Require `id` typed values to be canonical uuids.
    #[serde(default)]
    pub require_uuid_ids: bool,
    pub log_level: Option<LogLevel>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            account_maxsize: default_account_maxsize(),
            account_maxage: default_maxage(),
            domain_maxsize: default_domain_maxsize(),
            domain_maxage: default_maxage(),
            domain_nx_enabled: true,
            domain_nx_maxsize: default_domain_nx_maxsize(),
            domain_nx_maxage: default_maxage(),
            cos_maxsize: default_cos_maxsize(),
            cos_maxage: default_maxage(),
            server_maxsize: default_server_maxsize(),
            server_maxage: default_maxage(),
            require_uuid_ids: false,
            log_level: None,
        }
    }
}

impl CacheConfig {
    pub fn new<P: AsRef<Path>>(config_path: P) -> Result<Self, OperationError> {
        let config_path = config_path.as_ref();
        let mut f = File::open(config_path).map_err(|e| {
            admin_error!(?e, path = %config_path.display(), "unable to open config file");
            OperationError::FsError
        })?;

        let mut contents = String::new();
        f.read_to_string(&mut contents).map_err(|e| {
            admin_error!(?e, path = %config_path.display(), "unable to read config file");
            OperationError::FsError
        })?;

        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, OperationError> {
        let config: CacheConfig = toml::from_str(contents).map_err(|e| {
            admin_error!(?e, "unable to parse config");
            OperationError::SerdeTomlError
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the sizes are usable. Run by the loaders, and by
    /// [`ProvisioningCache::new`](crate::provisioning::ProvisioningCache::new).
    pub fn validate(&self) -> Result<(), OperationError> {
        for (field, value) in [
            ("account_maxsize", self.account_maxsize),
            ("domain_maxsize", self.domain_maxsize),
            ("domain_nx_maxsize", self.domain_nx_maxsize),
            ("cos_maxsize", self.cos_maxsize),
            ("server_maxsize", self.server_maxsize),
        ] {
            Self::capacity(field, value)?;
        }
        Ok(())
    }

    pub(crate) fn capacity(field: &str, value: usize) -> Result<NonZeroUsize, OperationError> {
        NonZeroUsize::new(value).ok_or_else(|| {
            admin_error!(%field, "cache size must not be zero");
            OperationError::InvalidConfiguration(format!("{} must be greater than zero", field))
        })
    }

    pub fn account_ttl(&self) -> Duration {
        Duration::from_secs(self.account_maxage)
    }

    pub fn domain_ttl(&self) -> Duration {
        Duration::from_secs(self.domain_maxage)
    }

    pub fn domain_nx_ttl(&self) -> Duration {
        Duration::from_secs(self.domain_nx_maxage)
    }

    pub fn cos_ttl(&self) -> Duration {
        Duration::from_secs(self.cos_maxage)
    }

    pub fn server_ttl(&self) -> Duration {
        Duration::from_secs(self.server_maxage)
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            require_uuid_ids: self.require_uuid_ids,
        }
    }

    /// Build the log subscriber for the configured `log_level`, `info` when unset.
    pub fn logging_pipeline(
        &self,
    ) -> Result<Box<dyn tracing::Subscriber + Send + Sync>, OperationError> {
        let level = self.log_level.unwrap_or_default();
        sketching::pipeline::start_logging_pipeline(level).map_err(|e| {
            admin_error!(%e, %level, "unable to start logging pipeline");
            OperationError::InvalidConfiguration(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_config_defaults() {
        let empty = CacheConfig::from_toml_str("").expect("failed to parse");
        assert_eq!(empty, CacheConfig::default());
        assert_eq!(empty.account_maxsize, 20000);
        assert_eq!(empty.domain_maxsize, 500);
        assert_eq!(empty.cos_maxsize, 100);
        assert_eq!(empty.account_ttl(), Duration::from_secs(900));
        assert!(empty.domain_nx_enabled);
        assert!(!empty.validation_policy().require_uuid_ids);
    }

    #[test]
    fn test_config_parse() {
        let c = CacheConfig::from_toml_str(
            r#"
            account_maxsize = 10
            domain_maxage = 0
            domain_nx_enabled = false
            require_uuid_ids = true
            log_level = "trace"
            "#,
        )
        .expect("failed to parse");
        assert_eq!(c.account_maxsize, 10);
        assert_eq!(c.domain_ttl(), Duration::ZERO);
        assert!(!c.domain_nx_enabled);
        assert!(c.validation_policy().require_uuid_ids);
        assert_eq!(c.log_level, Some(LogLevel::Trace));
    }

    #[test]
    fn test_config_log_level_drives_pipeline() {
        let debug = CacheConfig::from_toml_str(r#"log_level = "debug""#).expect("failed to parse");
        let subscriber = debug.logging_pipeline().expect("failed to build pipeline");
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(tracing::Level::DEBUG));
        });

        // Unset falls back to info.
        let subscriber = CacheConfig::default()
            .logging_pipeline()
            .expect("failed to build pipeline");
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(tracing::Level::INFO));
            assert!(!tracing::enabled!(tracing::Level::DEBUG));
        });
    }

    #[test]
    fn test_config_rejects_bad_input() {
        assert_eq!(
            CacheConfig::from_toml_str("cos_maxsize = 0"),
            Err(OperationError::InvalidConfiguration(String::new()))
        );
        assert_eq!(
            CacheConfig::from_toml_str("no_such_field = 1"),
            Err(OperationError::SerdeTomlError)
        );
        assert_eq!(
            CacheConfig::from_toml_str("account_maxage = -1"),
            Err(OperationError::SerdeTomlError)
        );
    }

    #[test]
    fn test_config_from_file() {
        let mut f = tempfile::NamedTempFile::new().expect("failed to create file");
        writeln!(f, "server_maxsize = 7").expect("failed to write");
        let c = CacheConfig::new(f.path()).expect("failed to load");
        assert_eq!(c.server_maxsize, 7);

        assert_eq!(
            CacheConfig::new("/nonexistent/dirprovd.toml"),
            Err(OperationError::FsError)
        );
    }
}
