// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for prochost-engine-client.

use thiserror::Error;

/// Result type using EngineError.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors returned by [`EngineClient`](crate::EngineClient) calls.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// Connection, timeout, or decoding failure before a usable response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The engine answered with a non-success status; the body is kept
    /// for the caller's logs.
    #[error("engine returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

impl EngineError {
    /// Whether this error was a request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, EngineError::Transport(e) if e.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_status_display() {
        let err = EngineError::UnexpectedStatus {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "engine returned status 502: bad gateway");
        assert!(!err.is_timeout());
    }
}
