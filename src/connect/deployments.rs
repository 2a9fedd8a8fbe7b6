// src/connect/deployments.rs

use super::{found, ConnectClient};
use crate::model::{
    // ---
    Deployment,
    DeploymentIdRequest,
    DeploymentInstance,
    GetDeploymentResponse,
    ListDeploymentsRequest,
    StopResponse,
};
use crate::subjects::ops;
use crate::Result;

impl ConnectClient {
    // ---
    /// Deployments of the account, optionally only those of one connector.
    pub async fn list_deployments(&self, connector_id: Option<&str>) -> Result<Vec<Deployment>> {
        self.list(ops::DEPLOYMENTS_LIST, &list_request(connector_id))
            .await
    }

    pub async fn list_deployments_with<F>(
        &self,
        connector_id: Option<&str>,
        handler: F,
    ) -> Result<()>
    where
        F: FnMut(Option<Deployment>, bool) -> Result<()>,
    {
        self.list_with(ops::DEPLOYMENTS_LIST, &list_request(connector_id), handler)
            .await
    }

    /// Look up a deployment; `Ok(None)` if it does not exist.
    pub async fn get_deployment(&self, deployment_id: &str) -> Result<Option<Deployment>> {
        // ---
        let resp: GetDeploymentResponse = self
            .call(ops::DEPLOYMENTS_GET, &id_request(deployment_id))
            .await?;
        found(resp.found, resp.deployment, "deployment")
    }

    /// Stop one deployment; returns the affected instances.
    pub async fn stop_deployment(&self, deployment_id: &str) -> Result<Vec<DeploymentInstance>> {
        let resp: StopResponse = self
            .call(ops::DEPLOYMENTS_STOP, &id_request(deployment_id))
            .await?;
        Ok(resp.instances)
    }
}

fn list_request(connector_id: Option<&str>) -> ListDeploymentsRequest {
    ListDeploymentsRequest {
        connector_id: connector_id.map(str::to_string),
    }
}

fn id_request(deployment_id: &str) -> DeploymentIdRequest {
    DeploymentIdRequest {
        deployment_id: deployment_id.to_string(),
    }
}
