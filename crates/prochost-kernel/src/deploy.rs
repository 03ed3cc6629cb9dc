// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Deployment publishing: upload definition files to the engine.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use prochost_engine_client::EngineClient;

use crate::config::KernelConfig;
use crate::metrics::{Counter, KernelMetrics};

/// File extension recognized as a process definition.
const DEFINITION_EXTENSION: &str = "bpmn";

/// Prefix for engine-side deployment names.
const DEPLOYMENT_NAME_PREFIX: &str = "prochost";

/// Result of uploading one definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentOutcome {
    /// File the outcome refers to.
    pub file_name: String,
    /// Whether the engine accepted the file.
    pub status: DeploymentStatus,
}

/// Terminal status of one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentStatus {
    /// The engine accepted the file and assigned a deployment id.
    Deployed { deployment_id: String },
    /// The upload failed; the error text is kept for the summary.
    Failed { error: String },
}

/// Aggregated result of one deployment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentSummary {
    /// Files the engine accepted.
    pub deployed: usize,
    /// Files that failed to upload or were rejected.
    pub failed: usize,
    /// Per-file outcomes in processing order.
    pub outcomes: Vec<DeploymentOutcome>,
}

impl DeploymentSummary {
    fn push(&mut self, outcome: DeploymentOutcome) {
        match outcome.status {
            DeploymentStatus::Deployed { .. } => self.deployed += 1,
            DeploymentStatus::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Upload every definition file in the configured directory.
///
/// Each file is an independent attempt: a rejected or unreadable file is
/// recorded in the summary and the remaining files are still processed. The
/// pass itself never fails; the caller decides what the summary means.
pub async fn publish_definitions(
    client: &EngineClient,
    config: &KernelConfig,
    metrics: &KernelMetrics,
) -> DeploymentSummary {
    let files = match definition_files(&config.definitions_dir) {
        Ok(files) => files,
        Err(e) => {
            warn!(
                dir = %config.definitions_dir.display(),
                error = %e,
                "Could not list definitions directory"
            );
            return DeploymentSummary::default();
        }
    };

    if files.is_empty() {
        warn!(
            dir = %config.definitions_dir.display(),
            "No definition files found for deployment"
        );
        return DeploymentSummary::default();
    }

    let mut summary = DeploymentSummary::default();
    for file in files {
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        metrics.increment(Counter::DeploymentsAttempted);
        let status = deploy_one(client, &file, &file_name).await;

        match &status {
            DeploymentStatus::Deployed { deployment_id } => {
                metrics.increment(Counter::DeploymentsSucceeded);
                info!(file = %file_name, deployment_id = %deployment_id, "Definition deployed");
            }
            DeploymentStatus::Failed { error } => {
                error!(file = %file_name, error = %error, "Definition deployment failed");
            }
        }

        summary.push(DeploymentOutcome { file_name, status });
    }

    info!(
        deployed = summary.deployed,
        failed = summary.failed,
        "Deployment pass complete"
    );
    summary
}

async fn deploy_one(client: &EngineClient, file: &Path, file_name: &str) -> DeploymentStatus {
    let content = match std::fs::read(file) {
        Ok(content) => content,
        Err(e) => {
            return DeploymentStatus::Failed {
                error: format!("read {}: {}", file.display(), e),
            };
        }
    };

    let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or(file_name);
    let deployment_name = format!("{DEPLOYMENT_NAME_PREFIX}-{stem}");

    match client
        .create_deployment(&deployment_name, file_name, content)
        .await
    {
        Ok(deployment) => DeploymentStatus::Deployed {
            deployment_id: deployment.id,
        },
        Err(e) => DeploymentStatus::Failed {
            error: e.to_string(),
        },
    }
}

/// Definition files in the directory, name-sorted for a stable order.
fn definition_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(DEFINITION_EXTENSION)
        })
        .collect();
    files.sort();
    Ok(files)
}
