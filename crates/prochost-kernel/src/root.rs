// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Best-effort start of the root workflow.

use tracing::{info, warn};

use prochost_engine_client::EngineClient;
use prochost_engine_client::types::StartProcessRequest;

use crate::config::KernelConfig;

/// Start the configured root workflow once, passing the kernel's identity
/// as process variables.
///
/// Failure here is expected whenever the root definition has not been
/// deployed yet, so nothing can abort the bootstrap from this phase: every
/// outcome is logged and absorbed.
pub async fn start_root_process(client: &EngineClient, config: &KernelConfig) {
    let request = StartProcessRequest::new()
        .with_variable("kernel_instance_id", config.instance_id.clone())
        .with_variable("startup_time", chrono::Utc::now().timestamp())
        .with_variable("environment", config.environment.clone());

    match client.start_process(&config.root_process_key, &request).await {
        Ok(instance) => {
            info!(
                process_key = %config.root_process_key,
                instance_id = %instance.id,
                "Root process started"
            );
        }
        Err(e) => {
            warn!(
                process_key = %config.root_process_key,
                error = %e,
                "Root process not started; it can be started manually once its definition is deployed"
            );
        }
    }
}
