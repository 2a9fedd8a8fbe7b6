// src/model/connector.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::DeploymentInstance;

/// One pipeline step: a library component plus its configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Component name within the connector's runtime.
    pub component: String,

    /// Component-specific configuration, passed through untouched.
    #[serde(default)]
    pub config: serde_json::Value,
}

/// The ordered steps of a connector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorSteps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Step>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transformers: Vec<Step>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink: Option<Step>,
}

/// Full connector definition as stored by the control service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub connector_id: String,

    #[serde(default)]
    pub description: String,

    pub runtime_id: String,

    #[serde(default)]
    pub steps: ConnectorSteps,
}

/// Listing entry for a connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorSummary {
    pub connector_id: String,

    #[serde(default)]
    pub description: String,

    pub runtime_id: String,

    /// Instances currently running across all deployments.
    #[serde(default)]
    pub running_instances: u32,
}

/// Instance counts of a connector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorStatus {
    #[serde(default)]
    pub running: u32,

    #[serde(default)]
    pub stopped: u32,
}

/// How to start a connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartOptions {
    /// Pull the runtime image even if the agent already has it.
    #[serde(default)]
    pub pull: bool,

    /// Number of instances to run.
    pub replicas: u32,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env_vars: BTreeMap<String, String>,

    /// Only agents carrying all these tags are eligible.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placement_tags: Vec<String>,

    /// Service-side start timeout, as a duration string (e.g. `"30s"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            pull: false,
            replicas: 1,
            env_vars: BTreeMap::new(),
            placement_tags: Vec::new(),
            timeout: None,
        }
    }
}

/// Outcome of starting a connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedDeployment {
    pub deployment_id: String,
    pub instances: Vec<DeploymentInstance>,
}

// --- wire bodies

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct ListConnectorsRequest {}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ConnectorIdRequest {
    pub connector_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GetConnectorResponse {
    pub found: bool,
    #[serde(default)]
    pub connector: Option<Connector>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CreateConnectorRequest {
    pub connector_id: String,
    pub description: String,
    pub runtime_id: String,
    pub steps: ConnectorSteps,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ConnectorResponse {
    pub connector: Connector,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PatchConnectorRequest {
    pub connector_id: String,
    /// JSON merge patch document, as a string.
    pub patch: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GetConnectorStatusResponse {
    pub found: bool,
    #[serde(default)]
    pub status: Option<ConnectorStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StartConnectorRequest {
    pub connector_id: String,
    #[serde(flatten)]
    pub options: StartOptions,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StartConnectorResponse {
    pub deployment_id: String,
    #[serde(default)]
    pub instances: Vec<DeploymentInstance>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StopResponse {
    #[serde(default)]
    pub instances: Vec<DeploymentInstance>,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    #[test]
    fn test_start_request_flattens_options() {
        // ---
        let req = StartConnectorRequest {
            connector_id: "c1".into(),
            options: StartOptions {
                replicas: 2,
                placement_tags: vec!["edge".into()],
                ..StartOptions::default()
            },
        };

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "connector_id": "c1",
                "pull": false,
                "replicas": 2,
                "placement_tags": ["edge"],
            })
        );
    }

    #[test]
    fn test_not_found_response_decodes_without_connector() {
        // ---
        let resp: GetConnectorResponse = serde_json::from_str(r#"{"found":false}"#).unwrap();
        assert!(!resp.found);
        assert!(resp.connector.is_none());
    }
}
