// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Prochost Engine Client
//!
//! REST client for the workflow engine the prochost kernel bootstraps and
//! supervises. Every call carries an explicit timeout and maps non-success
//! responses to a typed error; the client itself holds no retry or backoff
//! policy — that lives in the kernel.
//!
//! # Example
//!
//! ```no_run
//! use prochost_engine_client::{EngineClient, EngineClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = EngineClient::new(EngineClientConfig::new(
//!     "http://localhost:8080/engine-rest",
//! ))?;
//!
//! // Readiness probe: the engine is up once it reports at least one engine
//! let engines = client.list_engines().await?;
//! println!("engines: {}", engines.len());
//!
//! // Publish one definition file
//! let deployment = client
//!     .create_deployment("prochost-ordering", "ordering.bpmn", b"<definitions/>".to_vec())
//!     .await?;
//! println!("deployment id: {}", deployment.id);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
pub mod types;

pub use client::EngineClient;
pub use config::EngineClientConfig;
pub use error::{EngineError, Result};
