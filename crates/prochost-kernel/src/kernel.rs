// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The bootstrap sequencer.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use prochost_engine_client::{EngineClient, EngineClientConfig};

use crate::config::KernelConfig;
use crate::deploy;
use crate::error::Result;
use crate::health::HealthMonitor;
use crate::metrics::KernelMetrics;
use crate::readiness::{self, ReadinessOutcome};
use crate::root;
use crate::run_state::RunState;

/// The prochost kernel: owns the configuration snapshot, the engine client,
/// the counters, and the run-state flag.
pub struct Kernel {
    config: KernelConfig,
    client: EngineClient,
    metrics: Arc<KernelMetrics>,
    run_state: RunState,
}

impl Kernel {
    /// Build a kernel from a configuration snapshot.
    pub fn new(config: KernelConfig) -> Result<Self> {
        let client = EngineClient::new(EngineClientConfig::new(config.engine_api_root.clone()))?;
        Ok(Self {
            config,
            client,
            metrics: Arc::new(KernelMetrics::new()),
            run_state: RunState::new(),
        })
    }

    /// Run-state handle for signal listeners and tests.
    pub fn run_state(&self) -> RunState {
        self.run_state.clone()
    }

    /// Shared counters.
    pub fn metrics(&self) -> Arc<KernelMetrics> {
        self.metrics.clone()
    }

    /// The configuration this kernel runs with.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Run the bootstrap sequence:
    ///
    /// 1. validate the configuration and ensure the definitions directory
    /// 2. wait for the engine to report ready
    /// 3. publish definition files when auto-deploy is on
    /// 4. start the root process, best-effort
    /// 5. supervise engine health until a stop is requested
    ///
    /// Phases 1 and 2 are the only ones that can fail the sequence; their
    /// errors propagate and are fatal by definition. A stop requested during
    /// phase 2 returns `Ok` without completing the remaining phases. On the
    /// way out the metrics snapshot is flushed, best-effort.
    pub async fn bootstrap(&self) -> Result<()> {
        let started = Instant::now();
        info!(
            instance_id = %self.config.instance_id,
            version = %self.config.version,
            environment = %self.config.environment,
            "Kernel bootstrap starting"
        );

        // Phase 1: configuration validation
        self.config.validate()?;
        self.config.ensure_definitions_dir()?;
        info!("Configuration validated");

        // Phase 2: engine readiness
        let ready = readiness::await_engine_ready(
            &self.client,
            &self.config,
            &self.metrics,
            &self.run_state,
        )
        .await?;
        match ready {
            ReadinessOutcome::Interrupted => {
                info!("Stop requested before the engine became ready");
                return Ok(());
            }
            ReadinessOutcome::Ready { attempts } => {
                info!(attempts, "Engine ready");
            }
        }

        // Phase 3: definition deployment
        if self.config.auto_deploy {
            let summary =
                deploy::publish_definitions(&self.client, &self.config, &self.metrics).await;
            info!(
                deployed = summary.deployed,
                failed = summary.failed,
                "Definitions published"
            );
        } else {
            info!("Auto-deploy disabled, skipping definition publishing");
        }

        // Phase 4: root process, best-effort
        root::start_root_process(&self.client, &self.config).await;

        // Phase 5: monitoring until shutdown
        info!(
            instance_id = %self.config.instance_id,
            version = %self.config.version,
            environment = %self.config.environment,
            engine_url = %self.config.engine_base_url,
            api_root = %self.config.engine_api_root,
            startup_secs = started.elapsed().as_secs_f64(),
            "Kernel active, entering monitoring mode"
        );

        HealthMonitor::new(
            self.client.clone(),
            self.config.clone(),
            self.metrics.clone(),
            self.run_state.clone(),
        )
        .run()
        .await;

        self.flush_metrics();
        info!("Kernel stopping");
        Ok(())
    }

    /// Best-effort metrics snapshot on the way out.
    fn flush_metrics(&self) {
        let snapshot = self.metrics.snapshot();
        info!(
            health_checks_ok = snapshot.health_checks_ok,
            health_checks_fail = snapshot.health_checks_fail,
            readiness_wait_attempts = snapshot.readiness_wait_attempts,
            deployments_attempted = snapshot.deployments_attempted,
            deployments_succeeded = snapshot.deployments_succeeded,
            "Final metrics snapshot"
        );
        if let Err(e) = snapshot.write_to(&self.config.metrics_snapshot_file) {
            warn!(
                file = %self.config.metrics_snapshot_file.display(),
                error = %e,
                "Could not write metrics snapshot"
            );
        }
    }
}
