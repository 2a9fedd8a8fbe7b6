// src/model/deployment.rs

use serde::{Deserialize, Serialize};

/// Lifecycle state of one running copy of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    Pending,
    Running,
    Stopped,
    Failed,
    #[serde(other)]
    Unknown,
}

/// One instance of a deployment, placed on an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentInstance {
    pub instance_id: String,

    #[serde(default)]
    pub agent_id: String,

    pub state: InstanceState,
}

/// A start of a connector: the set of instances created by one start call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub deployment_id: String,

    pub connector_id: String,

    #[serde(default)]
    pub instances: Vec<DeploymentInstance>,
}

impl Deployment {
    pub fn running_instances(&self) -> usize {
        self.instances
            .iter()
            .filter(|i| i.state == InstanceState::Running)
            .count()
    }
}

// --- wire bodies

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct ListDeploymentsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DeploymentIdRequest {
    pub deployment_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GetDeploymentResponse {
    pub found: bool,
    #[serde(default)]
    pub deployment: Option<Deployment>,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_unknown_state_does_not_fail_decoding() {
        // ---
        let instance: DeploymentInstance =
            serde_json::from_str(r#"{"instance_id":"i1","state":"draining"}"#).unwrap();
        assert_eq!(instance.state, InstanceState::Unknown);
        assert_eq!(instance.agent_id, "");
    }

    #[test]
    fn test_running_instances() {
        // ---
        let deployment: Deployment = serde_json::from_str(
            r#"{"deployment_id":"d1","connector_id":"c1","instances":[
                {"instance_id":"i1","state":"running"},
                {"instance_id":"i2","state":"failed"}]}"#,
        )
        .unwrap();
        assert_eq!(deployment.running_instances(), 1);
    }
}
