// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! EngineClient: bounded-timeout calls against the engine's REST surface.

use reqwest::multipart;
use tracing::debug;

use crate::config::EngineClientConfig;
use crate::error::{EngineError, Result};
use crate::types::{
    DeploymentRef, EngineInfo, ProcessInstanceRef, StartProcessRequest, VersionInfo,
};

/// Source tag attached to every deployment upload.
const DEPLOYMENT_SOURCE: &str = "prochost kernel";

/// Tenant every kernel-managed deployment belongs to.
const TENANT_ID: &str = "prochost";

/// Stateless client for the engine's REST API.
///
/// Cheap to clone; every call carries an explicit timeout from
/// [`EngineClientConfig`]. The client performs no retries — retry and
/// backoff policy belongs to the kernel.
#[derive(Debug, Clone)]
pub struct EngineClient {
    http: reqwest::Client,
    config: EngineClientConfig,
}

impl EngineClient {
    /// Create a client for the given configuration.
    pub fn new(config: EngineClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }

    /// The client's configuration.
    pub fn config(&self) -> &EngineClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_root.trim_end_matches('/'), path)
    }

    /// Reject non-success responses, keeping the body for the caller's logs.
    async fn read_success(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_else(|_| String::new());
            Err(EngineError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            })
        }
    }

    // =========================================================================
    // Status & diagnostics
    // =========================================================================

    /// List the engines the installation hosts.
    ///
    /// This is the kernel's readiness and health probe: a reachable
    /// installation answers 200 with at least one engine.
    pub async fn list_engines(&self) -> Result<Vec<EngineInfo>> {
        debug!("Listing engines");

        let response = self
            .http
            .get(self.url("/engine"))
            .timeout(self.config.probe_timeout)
            .send()
            .await?;

        Ok(Self::read_success(response).await?.json().await?)
    }

    /// Engine build information.
    pub async fn version(&self) -> Result<VersionInfo> {
        debug!("Querying engine version");

        let response = self
            .http
            .get(self.url("/version"))
            .timeout(self.config.probe_timeout)
            .send()
            .await?;

        Ok(Self::read_success(response).await?.json().await?)
    }

    /// List deployments known to the engine.
    pub async fn list_deployments(&self) -> Result<Vec<DeploymentRef>> {
        debug!("Listing deployments");

        let response = self
            .http
            .get(self.url("/deployment"))
            .timeout(self.config.probe_timeout)
            .send()
            .await?;

        Ok(Self::read_success(response).await?.json().await?)
    }

    /// List up to `max_results` process instances.
    ///
    /// The engine answers 204 when it has nothing to report; that maps to
    /// an empty list rather than an error.
    pub async fn list_process_instances(&self, max_results: u32) -> Result<Vec<ProcessInstanceRef>> {
        debug!(max_results, "Listing process instances");

        let response = self
            .http
            .get(self.url("/process-instance"))
            .query(&[("maxResults", max_results)])
            .timeout(self.config.probe_timeout)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        Ok(Self::read_success(response).await?.json().await?)
    }

    // =========================================================================
    // Deployment & process start
    // =========================================================================

    /// Upload one definition file as a new deployment.
    ///
    /// The multipart form carries the kernel's fixed metadata alongside the
    /// file: duplicate filtering and changed-only redeploy are always on, so
    /// re-running the bootstrap against an unchanged file is a no-op on the
    /// engine side.
    pub async fn create_deployment(
        &self,
        deployment_name: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<DeploymentRef> {
        debug!(deployment_name, file_name, "Creating deployment");

        let file_part = multipart::Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")?;

        let form = multipart::Form::new()
            .text("deployment-name", deployment_name.to_string())
            .text("deployment-source", DEPLOYMENT_SOURCE)
            .text("tenant-id", TENANT_ID)
            .text("enable-duplicate-filtering", "true")
            .text("deploy-changed-only", "true")
            .part(file_name.to_string(), file_part);

        let response = self
            .http
            .post(self.url("/deployment/create"))
            .multipart(form)
            .timeout(self.config.deploy_timeout)
            .send()
            .await?;

        Ok(Self::read_success(response).await?.json().await?)
    }

    /// Start a process by definition key.
    pub async fn start_process(
        &self,
        key: &str,
        request: &StartProcessRequest,
    ) -> Result<ProcessInstanceRef> {
        debug!(key, "Starting process");

        let response = self
            .http
            .post(self.url(&format!("/process-definition/key/{key}/start")))
            .json(request)
            .timeout(self.config.start_timeout)
            .send()
            .await?;

        Ok(Self::read_success(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> EngineClient {
        EngineClient::new(EngineClientConfig::new(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_list_engines_parses_names() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/engine"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([{"name": "default"}])),
            )
            .mount(&server)
            .await;

        let engines = client_for(&server).list_engines().await.unwrap();
        assert_eq!(engines.len(), 1);
        assert_eq!(engines[0].name, "default");
    }

    #[tokio::test]
    async fn test_list_engines_maps_error_status_with_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/engine"))
            .respond_with(ResponseTemplate::new(503).set_body_string("starting up"))
            .mount(&server)
            .await;

        let err = client_for(&server).list_engines().await.unwrap_err();
        match err {
            EngineError::UnexpectedStatus { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "starting up");
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_version() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/version"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"version": "7.21.0"})),
            )
            .mount(&server)
            .await;

        let info = client_for(&server).version().await.unwrap();
        assert_eq!(info.version, "7.21.0");
    }

    #[tokio::test]
    async fn test_create_deployment_sends_metadata_and_file() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/deployment/create"))
            .and(body_string_contains("deployment-name"))
            .and(body_string_contains("prochost-ordering"))
            .and(body_string_contains("deployment-source"))
            .and(body_string_contains("tenant-id"))
            .and(body_string_contains("enable-duplicate-filtering"))
            .and(body_string_contains("deploy-changed-only"))
            .and(body_string_contains("<definitions/>"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "dep-42", "name": "prochost-ordering"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let deployment = client_for(&server)
            .create_deployment("prochost-ordering", "ordering.bpmn", b"<definitions/>".to_vec())
            .await
            .unwrap();

        assert_eq!(deployment.id, "dep-42");
        assert_eq!(deployment.name.as_deref(), Some("prochost-ordering"));
    }

    #[tokio::test]
    async fn test_create_deployment_rejection_keeps_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/deployment/create"))
            .respond_with(ResponseTemplate::new(400).set_body_string("ENGINE-09005 parse failure"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_deployment("prochost-broken", "broken.bpmn", b"not-xml".to_vec())
            .await
            .unwrap_err();

        match err {
            EngineError::UnexpectedStatus { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("ENGINE-09005"));
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_process_instances_no_content_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/process-instance"))
            .and(query_param("maxResults", "1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let instances = client_for(&server).list_process_instances(1).await.unwrap();
        assert!(instances.is_empty());
    }

    #[tokio::test]
    async fn test_start_process_sends_variables() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/process-definition/key/system_orchestrator/start"))
            .and(body_partial_json(serde_json::json!({
                "variables": {"environment": {"value": "development"}}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "pi-7", "ended": false})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = StartProcessRequest::new().with_variable("environment", "development");
        let instance = client_for(&server)
            .start_process("system_orchestrator", &request)
            .await
            .unwrap();

        assert_eq!(instance.id, "pi-7");
    }

    #[tokio::test]
    async fn test_probe_timeout_is_reported_as_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/engine"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"name": "default"}]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = EngineClient::new(
            EngineClientConfig::new(server.uri()).with_probe_timeout(Duration::from_millis(50)),
        )
        .unwrap();

        let err = client.list_engines().await.unwrap_err();
        assert!(err.is_timeout(), "expected a timeout, got {err:?}");
    }
}
