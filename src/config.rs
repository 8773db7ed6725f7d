//! Configuration for the probe
//!
//! Tunable constants live at the top of this module. The run configuration is
//! read once from a JSON file before any database work starts and stays
//! immutable for the lifetime of the process.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

use crate::error::ProbeError;

// ============================================================================
// Connection Configuration
// ============================================================================

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(45);

pub const PING_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Write Configuration
// ============================================================================

/// Timeout for a single INSERT attempt
///
/// A statement that hangs past this bound counts as one failed attempt and is
/// retried like any other transient failure.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(180); // 3 minutes

// ============================================================================
// Run Configuration
// ============================================================================

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Database section of the config file
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub dsn: String,
}

/// Run configuration as it appears in `config.json`
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    pub database: DatabaseConfig,
    /// Records written per run
    #[serde(default)]
    pub test_run: u64,
    /// Target rate for the failover simulator
    #[serde(default)]
    pub rps: u32,
    /// Attempts per logical write before the run is aborted
    pub max_retry: u32,
    /// Backoff between attempts, in seconds
    #[serde(default)]
    pub delay_retry: u64,
}

impl ProbeConfig {
    /// Read, parse and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProbeError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ProbeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data, path)
    }

    fn from_json(data: &str, path: &Path) -> Result<Self, ProbeError> {
        let config: ProbeConfig =
            serde_json::from_str(data).map_err(|source| ProbeError::ConfigParse {
                path: PathBuf::from(path),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.database.dsn.trim().is_empty() {
            return Err(ProbeError::InvalidConfig(
                "database.dsn must not be empty".to_string(),
            ));
        }
        if self.max_retry == 0 {
            return Err(ProbeError::InvalidConfig(
                "max_retry must be at least 1".to_string(),
            ));
        }
        self.connect_options()?;
        Ok(())
    }

    /// Parsed connection options for the configured DSN
    pub fn connect_options(&self) -> Result<PgConnectOptions, ProbeError> {
        self.database
            .dsn
            .parse::<PgConnectOptions>()
            .map_err(|e| ProbeError::InvalidConfig(format!("invalid database.dsn: {e}")))
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.delay_retry)
    }

    /// DSN with any password replaced, safe to log
    pub fn redacted_dsn(&self) -> String {
        redact_dsn(&self.database.dsn)
    }
}

/// Replace the password part of a URL-style DSN with `***`
fn redact_dsn(dsn: &str) -> String {
    let Some(scheme_end) = dsn.find("://") else {
        return dsn.to_string();
    };
    let authority_start = scheme_end + 3;
    let rest = &dsn[authority_start..];
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let Some(at) = rest[..authority_end].rfind('@') else {
        return dsn.to_string();
    };
    let userinfo = &rest[..at];
    match userinfo.find(':') {
        Some(colon) => format!(
            "{}{}:***{}",
            &dsn[..authority_start],
            &userinfo[..colon],
            &rest[at..]
        ),
        None => dsn.to_string(),
    }
}
