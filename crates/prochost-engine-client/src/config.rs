// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the engine client.

use std::time::Duration;

/// Configuration for [`EngineClient`](crate::EngineClient).
///
/// The three timeouts bound the three kinds of traffic the kernel sends:
/// cheap status probes, definition uploads (file transfer, so slower), and
/// process starts.
#[derive(Debug, Clone)]
pub struct EngineClientConfig {
    /// Root of the engine's REST API, e.g. `http://localhost:8080/engine-rest`.
    pub api_root: String,
    /// Timeout for readiness and diagnostic probes.
    pub probe_timeout: Duration,
    /// Timeout for definition uploads.
    pub deploy_timeout: Duration,
    /// Timeout for process start requests.
    pub start_timeout: Duration,
}

impl EngineClientConfig {
    /// Create a configuration for the given API root with default timeouts.
    pub fn new(api_root: impl Into<String>) -> Self {
        Self {
            api_root: api_root.into(),
            probe_timeout: Duration::from_secs(5),
            deploy_timeout: Duration::from_secs(30),
            start_timeout: Duration::from_secs(10),
        }
    }

    /// Set the probe timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Set the deployment upload timeout.
    pub fn with_deploy_timeout(mut self, timeout: Duration) -> Self {
        self.deploy_timeout = timeout;
        self
    }

    /// Set the process start timeout.
    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let config = EngineClientConfig::new("http://localhost:8080/engine-rest");
        assert_eq!(config.api_root, "http://localhost:8080/engine-rest");
        assert_eq!(config.probe_timeout, Duration::from_secs(5));
        assert_eq!(config.deploy_timeout, Duration::from_secs(30));
        assert_eq!(config.start_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_methods() {
        let config = EngineClientConfig::new("http://engine:8080/engine-rest")
            .with_probe_timeout(Duration::from_millis(500))
            .with_deploy_timeout(Duration::from_secs(60))
            .with_start_timeout(Duration::from_secs(15));

        assert_eq!(config.probe_timeout, Duration::from_millis(500));
        assert_eq!(config.deploy_timeout, Duration::from_secs(60));
        assert_eq!(config.start_timeout, Duration::from_secs(15));
    }
}
