// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Prochost Kernel binary.
//!
//! Bootstraps the process-execution host: validates configuration, waits
//! for the workflow engine, publishes definitions, starts the root
//! workflow, then supervises engine health until SIGINT or SIGTERM.

use anyhow::Result;
use tracing::{error, info};

use prochost_kernel::config::KernelConfig;
use prochost_kernel::kernel::Kernel;
use prochost_kernel::shutdown;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (from the working directory or parents)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prochost_kernel=info".into()),
        )
        .init();

    info!("Starting Prochost Kernel");

    let config = KernelConfig::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    let kernel = Kernel::new(config).map_err(|e| {
        error!("Could not construct the kernel: {}", e);
        e
    })?;

    shutdown::spawn_signal_listener(kernel.run_state());

    kernel.bootstrap().await.map_err(|e| {
        error!(severity = ?e.severity(), "Kernel bootstrap failed: {}", e);
        e
    })?;

    info!("Prochost Kernel shut down");

    Ok(())
}
