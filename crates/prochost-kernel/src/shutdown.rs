// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Signal handling: termination signals flip the run-state flag.

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::run_state::RunState;

/// Spawn a task that waits for SIGINT or SIGTERM and requests a stop.
///
/// The signal path does no blocking work: it only flips the flag. Further
/// signals after the first are logged as no-ops; the looping components
/// observe the flag on their next iteration.
pub fn spawn_signal_listener(run_state: RunState) -> JoinHandle<()> {
    tokio::spawn(listen(run_state))
}

#[cfg(unix)]
async fn listen(run_state: RunState) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "Could not install SIGINT handler");
            return;
        }
    };
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "Could not install SIGTERM handler");
            return;
        }
    };

    loop {
        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        log_stop_request(&run_state, name);
    }
}

#[cfg(not(unix))]
async fn listen(run_state: RunState) {
    loop {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("Could not listen for interrupt signals");
            return;
        }
        log_stop_request(&run_state, "interrupt");
    }
}

fn log_stop_request(run_state: &RunState, signal: &str) {
    if run_state.request_stop() {
        info!(signal, "Termination signal received, initiating graceful shutdown");
    } else {
        info!(signal, "Termination signal received, shutdown already in progress");
    }
}
