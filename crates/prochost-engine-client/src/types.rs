// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Wire types for the engine's REST API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One engine reported by `GET /engine`.
///
/// A stock installation reports a single engine named `default`.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineInfo {
    /// Engine name.
    pub name: String,
}

/// Engine build information from `GET /version`.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    /// Version string as reported by the engine.
    pub version: String,
}

/// A deployment known to the engine, returned by deployment create/list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRef {
    /// Engine-assigned deployment identifier.
    pub id: String,
    /// Deployment name, when the engine reports one.
    #[serde(default)]
    pub name: Option<String>,
    /// Tenant the deployment belongs to.
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// A process instance reference returned by start and list calls.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInstanceRef {
    /// Instance identifier.
    pub id: String,
    /// Definition the instance was started from.
    #[serde(default)]
    pub definition_id: Option<String>,
    /// Whether the instance has already ended.
    #[serde(default)]
    pub ended: Option<bool>,
}

/// A typed start variable; serialized as `{"value": ...}` on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct VariableValue {
    /// The variable's value.
    pub value: Value,
}

impl VariableValue {
    /// Wrap a value in the engine's variable envelope.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// JSON body of a process start request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StartProcessRequest {
    /// Input variables handed to the new instance.
    pub variables: HashMap<String, VariableValue>,
}

impl StartProcessRequest {
    /// Empty request with no variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one variable.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), VariableValue::new(value));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_request_serialization() {
        let request = StartProcessRequest::new()
            .with_variable("kernel_instance_id", "prochost-dev-001")
            .with_variable("startup_time", 1_700_000_000_i64);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json["variables"]["kernel_instance_id"]["value"],
            "prochost-dev-001"
        );
        assert_eq!(json["variables"]["startup_time"]["value"], 1_700_000_000_i64);
    }

    #[test]
    fn test_process_instance_deserialization() {
        let instance: ProcessInstanceRef = serde_json::from_str(
            r#"{"id": "pi-1", "definitionId": "def-1:1:abc", "ended": false}"#,
        )
        .unwrap();
        assert_eq!(instance.id, "pi-1");
        assert_eq!(instance.definition_id.as_deref(), Some("def-1:1:abc"));
        assert_eq!(instance.ended, Some(false));
    }

    #[test]
    fn test_deployment_ref_tolerates_missing_fields() {
        let deployment: DeploymentRef = serde_json::from_str(r#"{"id": "dep-9"}"#).unwrap();
        assert_eq!(deployment.id, "dep-9");
        assert!(deployment.name.is_none());
        assert!(deployment.tenant_id.is_none());
    }
}
