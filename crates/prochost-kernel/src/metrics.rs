// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory kernel counters with a serializable snapshot.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// The closed set of kernel counters.
///
/// Adding a counter means adding a variant here and a field to both
/// [`KernelMetrics`] and [`MetricsSnapshot`]; an unknown counter name
/// cannot exist at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    /// Successful health probes.
    HealthChecksOk,
    /// Failed health probes.
    HealthChecksFail,
    /// Readiness polling attempts, successful or not.
    ReadinessWaitAttempts,
    /// Definition files submitted for deployment.
    DeploymentsAttempted,
    /// Definition files the engine accepted.
    DeploymentsSucceeded,
}

/// Process-wide counters, safe for concurrent increment.
///
/// Created once at startup and shared for the process lifetime. Increments
/// are atomic so a reader on another thread can never observe a torn value.
#[derive(Debug, Default)]
pub struct KernelMetrics {
    health_checks_ok: AtomicU64,
    health_checks_fail: AtomicU64,
    readiness_wait_attempts: AtomicU64,
    deployments_attempted: AtomicU64,
    deployments_succeeded: AtomicU64,
}

impl KernelMetrics {
    /// New metrics with every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically add one to a counter.
    pub fn increment(&self, counter: Counter) {
        self.cell(counter).fetch_add(1, Ordering::Relaxed);
    }

    /// Current value of one counter.
    pub fn get(&self, counter: Counter) -> u64 {
        self.cell(counter).load(Ordering::Relaxed)
    }

    fn cell(&self, counter: Counter) -> &AtomicU64 {
        match counter {
            Counter::HealthChecksOk => &self.health_checks_ok,
            Counter::HealthChecksFail => &self.health_checks_fail,
            Counter::ReadinessWaitAttempts => &self.readiness_wait_attempts,
            Counter::DeploymentsAttempted => &self.deployments_attempted,
            Counter::DeploymentsSucceeded => &self.deployments_succeeded,
        }
    }

    /// Point-in-time copy of every counter.
    ///
    /// Safe to take at any moment, including while other threads are still
    /// incrementing.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            health_checks_ok: self.health_checks_ok.load(Ordering::Relaxed),
            health_checks_fail: self.health_checks_fail.load(Ordering::Relaxed),
            readiness_wait_attempts: self.readiness_wait_attempts.load(Ordering::Relaxed),
            deployments_attempted: self.deployments_attempted.load(Ordering::Relaxed),
            deployments_succeeded: self.deployments_succeeded.load(Ordering::Relaxed),
        }
    }
}

/// Immutable copy of the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub health_checks_ok: u64,
    pub health_checks_fail: u64,
    pub readiness_wait_attempts: u64,
    pub deployments_attempted: u64,
    pub deployments_succeeded: u64,
}

impl MetricsSnapshot {
    /// Write the snapshot as pretty JSON, creating parent directories.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Read a snapshot back from disk.
    pub fn read_from(path: &Path) -> io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(io::Error::other)
    }
}
