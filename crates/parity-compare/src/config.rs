//! Run configuration
//!
//! Built once, then passed by reference to the resolver, the expander and
//! the dispatcher. Nothing reads configuration from global state.

use crate::remove::MismatchPolicy;
use parity_config::{ConfigError, ConfigResult, YamlLoader};
use parity_core::{AccountSelection, CaseExpander, InternalMarker, ParityError, ParityResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment token prefixes; values are kept out of `Debug` output
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct TokenPrefixes(BTreeMap<String, String>);

impl TokenPrefixes {
    pub fn get(&self, environment: &str) -> Option<&str> {
        self.0.get(environment).map(String::as_str)
    }

    pub fn insert(&mut self, environment: impl Into<String>, prefix: impl Into<String>) {
        self.0.insert(environment.into(), prefix.into());
    }
}

impl fmt::Debug for TokenPrefixes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.keys()).finish()
    }
}

/// Configuration of one parity run
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Environment selector, picks the token prefix
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub token_prefixes: TokenPrefixes,
    /// Base URL of the legacy system
    pub primary_url: String,
    /// Base URL of the replacement system
    pub secondary_url: String,
    /// Case catalogue workbook, relative to the config file
    pub catalogue: PathBuf,
    #[serde(default = "default_endpoint_sheet")]
    pub endpoint_sheet: String,
    #[serde(default = "default_account_sheet")]
    pub account_sheet: String,
    #[serde(default)]
    pub accounts: AccountSelection,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Cases in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Where per-case attachments are written, if anywhere
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
    #[serde(default)]
    pub mismatch_policy: MismatchPolicy,
    #[serde(default)]
    pub internal_marker: InternalMarker,
}

fn default_environment() -> String {
    "test".to_string()
}

fn default_endpoint_sheet() -> String {
    "endpoints".to_string()
}

fn default_account_sheet() -> String {
    "accounts".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_concurrency() -> usize {
    1
}

impl RunConfig {
    /// Load a config file, resolve relative paths against its directory,
    /// apply `PARITY_*` environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let config_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let file = path.file_name().ok_or_else(|| ConfigError::InvalidValue {
            key: "config".to_string(),
            reason: format!("{} is not a file path", path.display()),
        })?;

        let mut loader = YamlLoader::new(&config_dir)?;
        let mut config: RunConfig = loader.load_as(file)?;
        config.resolve_paths(&config_dir);
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        debug!(
            "Loaded run config: environment={}, primary={}, secondary={}",
            config.environment, config.primary_url, config.secondary_url
        );
        Ok(config)
    }

    fn resolve_paths(&mut self, config_dir: &Path) {
        if self.catalogue.is_relative() {
            self.catalogue = config_dir.join(&self.catalogue);
        }
        if let Some(dir) = &self.report_dir {
            if dir.is_relative() {
                self.report_dir = Some(config_dir.join(dir));
            }
        }
    }

    /// Apply overrides looked up through `var` (the process environment in
    /// [`RunConfig::load`])
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(env) = var("PARITY_ENV") {
            self.environment = env;
        }
        if let Some(url) = var("PARITY_PRIMARY_URL") {
            self.primary_url = url;
        }
        if let Some(url) = var("PARITY_SECONDARY_URL") {
            self.secondary_url = url;
        }
        if let Some(list) = var("PARITY_ACCOUNTS") {
            self.accounts.filter = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(max) = var("PARITY_MAX_ACCOUNTS") {
            self.accounts.max = Some(parse_number("PARITY_MAX_ACCOUNTS", &max)?);
        }
        if let Some(n) = var("PARITY_CONCURRENCY") {
            self.concurrency = parse_number("PARITY_CONCURRENCY", &n)?;
        }
        if let Some(dir) = var("PARITY_REPORT_DIR") {
            self.report_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.primary_url.trim().is_empty() || self.secondary_url.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                message: "both primary_url and secondary_url must be set".to_string(),
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ValidationFailed {
                message: "concurrency must be at least 1".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed {
                message: "timeout_secs must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Token prefix of the selected environment
    pub fn token_prefix(&self) -> ParityResult<&str> {
        self.token_prefixes.get(&self.environment).ok_or_else(|| {
            ParityError::configuration(format!(
                "no token prefix configured for environment '{}'",
                self.environment
            ))
        })
    }

    /// Case expander for the selected environment
    pub fn expander(&self) -> ParityResult<CaseExpander> {
        Ok(CaseExpander::new(self.token_prefix()?).with_marker(self.internal_marker.clone()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_number(key: &str, value: &str) -> ConfigResult<usize> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: format!("'{}' is not a non-negative integer", value),
    })
}
