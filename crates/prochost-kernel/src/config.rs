// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Kernel configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::error::KernelError;

/// Immutable configuration snapshot for one kernel run.
///
/// Built once at startup from `PROCHOST_*` environment variables and never
/// mutated afterwards. Numeric policy fields are stored as plain numbers so
/// [`validate`](Self::validate) can report out-of-range values instead of a
/// `Duration` constructor panicking on them; the `Duration` accessors below
/// are for use after validation.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Stable identifier for this kernel instance.
    pub instance_id: String,
    /// Reported kernel version.
    pub version: String,
    /// Deployment environment tag (free-form: development, staging, ...).
    pub environment: String,

    /// Engine base URL, e.g. `http://localhost:8080`. Required.
    pub engine_base_url: String,
    /// REST API root derived from the base URL.
    pub engine_api_root: String,

    /// Directory scanned for process definition files.
    pub definitions_dir: PathBuf,
    /// Marker file written once the engine first reports ready.
    pub readiness_file: PathBuf,
    /// Metrics snapshot written on graceful shutdown.
    pub metrics_snapshot_file: PathBuf,

    /// Seconds between health probes. Must be > 0.
    pub health_check_interval_secs: u64,
    /// Exponent base for failure backoff. Must be > 1.0.
    pub health_backoff_base: f64,
    /// Whether the monitoring loop performs probes at all.
    pub health_check_enabled: bool,

    /// Maximum readiness polling attempts. Must be > 0.
    pub readiness_max_attempts: u32,
    /// Base sleep between readiness attempts, in seconds. Must be > 0.
    pub readiness_base_sleep_secs: f64,
    /// Upper bound for the uniform jitter added to each readiness sleep.
    /// Must be >= 0.
    pub readiness_jitter_secs: f64,

    /// Deploy definition files during bootstrap.
    pub auto_deploy: bool,
    /// Process definition key of the root workflow.
    pub root_process_key: String,
}

impl KernelConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables fall back to defaults; unparseable values fail
    /// immediately with [`ConfigError::Invalid`]. A missing engine base URL
    /// is tolerated here so [`validate`](Self::validate) can report it
    /// together with every other violation in one pass.
    ///
    /// Variables:
    /// - `PROCHOST_INSTANCE_ID` (default: "prochost-dev-001")
    /// - `PROCHOST_VERSION` (default: crate version)
    /// - `PROCHOST_ENV` (default: "development")
    /// - `PROCHOST_ENGINE_BASE_URL` (required)
    /// - `PROCHOST_DEFINITIONS_DIR` (default: "./definitions")
    /// - `PROCHOST_READINESS_FILE` (default: "/tmp/prochost.ready")
    /// - `PROCHOST_METRICS_SNAPSHOT_FILE` (default: "logs/kernel/metrics.json")
    /// - `PROCHOST_HEALTH_CHECK_INTERVAL` (default: 30)
    /// - `PROCHOST_HEALTH_BACKOFF_BASE` (default: 1.5)
    /// - `PROCHOST_HEALTH_CHECK_ENABLED` (default: true)
    /// - `PROCHOST_READY_MAX_ATTEMPTS` (default: 30)
    /// - `PROCHOST_READY_BASE_SLEEP_SECONDS` (default: 2.0)
    /// - `PROCHOST_READY_JITTER_SECONDS` (default: 0.75)
    /// - `PROCHOST_AUTO_DEPLOY` (default: true)
    /// - `PROCHOST_ROOT_PROCESS_KEY` (default: "system_orchestrator")
    pub fn from_env() -> Result<Self, ConfigError> {
        let engine_base_url = std::env::var("PROCHOST_ENGINE_BASE_URL").unwrap_or_default();
        let engine_api_root = derive_api_root(&engine_base_url);

        Ok(Self {
            instance_id: env_or("PROCHOST_INSTANCE_ID", "prochost-dev-001"),
            version: env_or("PROCHOST_VERSION", env!("CARGO_PKG_VERSION")),
            environment: env_or("PROCHOST_ENV", "development"),
            engine_base_url,
            engine_api_root,
            definitions_dir: PathBuf::from(env_or("PROCHOST_DEFINITIONS_DIR", "./definitions")),
            readiness_file: PathBuf::from(env_or("PROCHOST_READINESS_FILE", "/tmp/prochost.ready")),
            metrics_snapshot_file: PathBuf::from(env_or(
                "PROCHOST_METRICS_SNAPSHOT_FILE",
                "logs/kernel/metrics.json",
            )),
            health_check_interval_secs: parse_env("PROCHOST_HEALTH_CHECK_INTERVAL", 30)?,
            health_backoff_base: parse_env("PROCHOST_HEALTH_BACKOFF_BASE", 1.5)?,
            health_check_enabled: parse_bool_env("PROCHOST_HEALTH_CHECK_ENABLED", true)?,
            readiness_max_attempts: parse_env("PROCHOST_READY_MAX_ATTEMPTS", 30)?,
            readiness_base_sleep_secs: parse_env("PROCHOST_READY_BASE_SLEEP_SECONDS", 2.0)?,
            readiness_jitter_secs: parse_env("PROCHOST_READY_JITTER_SECONDS", 0.75)?,
            auto_deploy: parse_bool_env("PROCHOST_AUTO_DEPLOY", true)?,
            root_process_key: env_or("PROCHOST_ROOT_PROCESS_KEY", "system_orchestrator"),
        })
    }

    /// Check every configuration constraint, accumulating all violations so
    /// a single run reports everything that needs fixing at once.
    ///
    /// Performs no I/O of any kind.
    pub fn validate(&self) -> Result<(), KernelError> {
        let mut violations = Vec::new();

        if self.engine_base_url.is_empty() {
            violations.push("PROCHOST_ENGINE_BASE_URL must be set".to_string());
        }
        if self.health_check_interval_secs == 0 {
            violations.push("PROCHOST_HEALTH_CHECK_INTERVAL must be > 0".to_string());
        }
        if self.health_backoff_base <= 1.0 {
            violations.push("PROCHOST_HEALTH_BACKOFF_BASE must be > 1.0".to_string());
        }
        if self.readiness_max_attempts == 0 {
            violations.push("PROCHOST_READY_MAX_ATTEMPTS must be > 0".to_string());
        }
        if self.readiness_base_sleep_secs <= 0.0 {
            violations.push("PROCHOST_READY_BASE_SLEEP_SECONDS must be > 0".to_string());
        }
        if self.readiness_jitter_secs < 0.0 {
            violations.push("PROCHOST_READY_JITTER_SECONDS must be >= 0".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(KernelError::InvalidConfig(violations))
        }
    }

    /// Create the definitions directory if it does not exist.
    pub fn ensure_definitions_dir(&self) -> std::io::Result<()> {
        if !self.definitions_dir.exists() {
            warn!(
                dir = %self.definitions_dir.display(),
                "Definitions directory missing, creating it"
            );
            std::fs::create_dir_all(&self.definitions_dir)?;
        }
        Ok(())
    }

    /// Interval between health probes.
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    /// Base sleep between readiness attempts.
    pub fn readiness_base_sleep(&self) -> Duration {
        Duration::from_secs_f64(self.readiness_base_sleep_secs.max(0.0))
    }
}

/// `<base>/engine-rest`, empty when the base URL is not configured.
fn derive_api_root(base_url: &str) -> String {
    if base_url.is_empty() {
        String::new()
    } else {
        format!("{}/engine-rest", base_url.trim_end_matches('/'))
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(key, "must be a number")),
        Err(_) => Ok(default),
    }
}

fn parse_bool_env(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid(key, "must be a boolean")),
        },
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
