// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for the prochost kernel.

use thiserror::Error;

use prochost_engine_client::EngineError;

/// Result type using KernelError.
pub type Result<T> = std::result::Result<T, KernelError>;

/// How an error must be treated by the bootstrap sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Abort the process with a non-zero exit status.
    Fatal,
    /// Log, count, and keep running.
    Recoverable,
}

/// Kernel errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KernelError {
    /// One or more configuration constraints were violated.
    #[error("configuration validation failed: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    /// A configuration value could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// The engine never became ready within the polling budget.
    #[error("engine unavailable after {attempts} readiness attempts")]
    EngineUnavailable { attempts: u32 },

    /// An engine call failed.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KernelError {
    /// Severity of this error for the bootstrap sequence.
    ///
    /// Configuration problems, a definitions directory that cannot be
    /// created, and readiness exhaustion abort the process. Individual
    /// engine call failures are absorbed by the phase that produced them
    /// (deployment outcomes, health counters) and never terminate the
    /// kernel on their own.
    pub fn severity(&self) -> Severity {
        match self {
            KernelError::InvalidConfig(_)
            | KernelError::Config(_)
            | KernelError::EngineUnavailable { .. }
            | KernelError::Io(_) => Severity::Fatal,
            KernelError::Engine(_) => Severity::Recoverable,
        }
    }
}
