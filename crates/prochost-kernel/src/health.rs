// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Periodic engine health supervision with failure backoff.
//!
//! The monitor is a two-state machine: `Healthy` while probes pass,
//! `Degraded` with a consecutive-failure count while they do not. Degraded
//! is never terminal — a dead engine is retried with capped exponential
//! backoff until the process is told to stop or the engine recovers. The
//! kernel staying alive while its dependency is down is the point: the
//! readiness marker and counters tell supervisors which of the two is dead.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use prochost_engine_client::EngineClient;

use crate::config::KernelConfig;
use crate::metrics::{Counter, KernelMetrics};
use crate::readiness::write_readiness_marker;
use crate::run_state::RunState;

/// Backoff ceiling under sustained failure.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// How often the loop wakes to check the stop flag and the probe timer.
const TICK: Duration = Duration::from_secs(1);

/// Observable monitor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// The last probe passed.
    Healthy,
    /// One or more consecutive probes failed.
    Degraded { consecutive_failures: u32 },
}

impl HealthState {
    /// Consecutive failures behind this state (zero when healthy).
    pub fn consecutive_failures(&self) -> u32 {
        match self {
            HealthState::Healthy => 0,
            HealthState::Degraded {
                consecutive_failures,
            } => *consecutive_failures,
        }
    }
}

/// Backoff after `consecutive_failures` failed probes: `base ^ failures`
/// seconds, clamped to [`MAX_BACKOFF`].
pub fn backoff_delay(base: f64, consecutive_failures: u32) -> Duration {
    let raw = base.powi(consecutive_failures as i32);
    Duration::from_secs_f64(raw.min(MAX_BACKOFF.as_secs_f64()).max(0.0))
}

/// Supervises the engine until a stop is requested.
pub struct HealthMonitor {
    client: EngineClient,
    config: KernelConfig,
    metrics: Arc<KernelMetrics>,
    run_state: RunState,
    state: HealthState,
    last_check: Option<Instant>,
}

impl HealthMonitor {
    /// Create a monitor in the healthy state with no probe history.
    pub fn new(
        client: EngineClient,
        config: KernelConfig,
        metrics: Arc<KernelMetrics>,
        run_state: RunState,
    ) -> Self {
        Self {
            client,
            config,
            metrics,
            run_state,
            state: HealthState::Healthy,
            last_check: None,
        }
    }

    /// Current state, for diagnostics and tests.
    pub fn state(&self) -> HealthState {
        self.state
    }

    /// Run until the stop flag is set.
    ///
    /// The flag is re-checked every tick, so shutdown latency is bounded by
    /// one tick plus whatever probe or backoff sleep is currently in flight.
    pub async fn run(mut self) {
        info!(
            interval_secs = self.config.health_check_interval_secs,
            backoff_base = self.config.health_backoff_base,
            enabled = self.config.health_check_enabled,
            "Health monitor started"
        );

        while !self.run_state.is_stopping() {
            if self.config.health_check_enabled && self.due() {
                if let Some(backoff) = self.probe_and_update().await {
                    warn!(
                        consecutive_failures = self.state.consecutive_failures(),
                        backoff_secs = backoff.as_secs_f64(),
                        "Health check failed, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                }
                // The backoff sleep counts toward the next interval, so a
                // struggling engine sees probes spaced out, not hammered.
                self.last_check = Some(Instant::now());
            }
            tokio::time::sleep(TICK).await;
        }

        info!("Health monitor stopped");
    }

    /// Whether the probe interval has elapsed since the last check.
    fn due(&self) -> bool {
        match self.last_check {
            None => true,
            Some(at) => at.elapsed() >= self.config.health_check_interval(),
        }
    }

    /// Run one composite probe, update counters and state, and return the
    /// backoff to sleep when the probe failed.
    async fn probe_and_update(&mut self) -> Option<Duration> {
        if self.probe().await {
            self.metrics.increment(Counter::HealthChecksOk);
            self.state = HealthState::Healthy;
            if !self.config.readiness_file.exists() {
                write_readiness_marker(&self.config);
            }
            None
        } else {
            self.metrics.increment(Counter::HealthChecksFail);
            let failures = self.state.consecutive_failures() + 1;
            self.state = HealthState::Degraded {
                consecutive_failures: failures,
            };
            Some(backoff_delay(self.config.health_backoff_base, failures))
        }
    }

    /// One composite probe. Only the engine list decides the verdict; the
    /// remaining calls are diagnostics and never fail the check.
    async fn probe(&self) -> bool {
        let engines = match self.client.list_engines().await {
            Ok(engines) => engines,
            Err(e) => {
                warn!(error = %e, "Health check: engine endpoint unreachable");
                return false;
            }
        };

        let Some(engine) = engines.first() else {
            warn!("Health check: no engines reported");
            return false;
        };

        match self.client.version().await {
            Ok(info) => debug!(version = %info.version, "Engine version"),
            Err(e) => debug!(error = %e, "Version endpoint unavailable"),
        }

        match self.client.list_deployments().await {
            Ok(deployments) => debug!(deployments = deployments.len(), "Deployments listed"),
            Err(e) => debug!(error = %e, "Deployment list unavailable"),
        }

        match self.client.list_process_instances(1).await {
            Ok(_) => debug!("Process instance endpoint reachable"),
            Err(e) => debug!(error = %e, "Process instance endpoint unavailable"),
        }

        debug!(engine = %engine.name, "Health check passed");
        true
    }
}
