// src/connect/connectors.rs

use super::{found, ConnectClient};
use crate::model::{
    // ---
    Connector,
    ConnectorIdRequest,
    ConnectorResponse,
    ConnectorStatus,
    ConnectorSummary,
    CreateConnectorRequest,
    DeploymentInstance,
    Empty,
    GetConnectorResponse,
    GetConnectorStatusResponse,
    ListConnectorsRequest,
    PatchConnectorRequest,
    StartConnectorRequest,
    StartConnectorResponse,
    StartOptions,
    StartedDeployment,
    StopResponse,
};
use crate::subjects::ops;
use crate::Result;

impl ConnectClient {
    // ---
    /// All connectors of the account.
    pub async fn list_connectors(&self) -> Result<Vec<ConnectorSummary>> {
        self.list(ops::CONNECTORS_LIST, &ListConnectorsRequest::default())
            .await
    }

    /// Stream the connectors of the account through `handler`.
    ///
    /// `handler` is called once per reply and exactly once with
    /// `has_more == false`; an empty account yields a single `(None, false)`.
    pub async fn list_connectors_with<F>(&self, handler: F) -> Result<()>
    where
        F: FnMut(Option<ConnectorSummary>, bool) -> Result<()>,
    {
        let req = ListConnectorsRequest::default();
        self.list_with(ops::CONNECTORS_LIST, &req, handler).await
    }

    /// Look up a connector; `Ok(None)` if it does not exist.
    pub async fn get_connector(&self, connector_id: &str) -> Result<Option<Connector>> {
        // ---
        let resp: GetConnectorResponse = self
            .call(ops::CONNECTORS_GET, &id_request(connector_id))
            .await?;
        found(resp.found, resp.connector, "connector")
    }

    /// Create a connector from a full definition and return the stored one.
    pub async fn create_connector(&self, connector: &Connector) -> Result<Connector> {
        // ---
        let req = CreateConnectorRequest {
            connector_id: connector.connector_id.clone(),
            description: connector.description.clone(),
            runtime_id: connector.runtime_id.clone(),
            steps: connector.steps.clone(),
        };

        let resp: ConnectorResponse = self.call(ops::CONNECTORS_CREATE, &req).await?;
        Ok(resp.connector)
    }

    /// Apply a JSON merge patch to a connector and return the result.
    pub async fn patch_connector(
        &self,
        connector_id: &str,
        patch: &serde_json::Value,
    ) -> Result<Connector> {
        // ---
        let req = PatchConnectorRequest {
            connector_id: connector_id.to_string(),
            patch: patch.to_string(),
        };

        let resp: ConnectorResponse = self.call(ops::CONNECTORS_PATCH, &req).await?;
        Ok(resp.connector)
    }

    pub async fn delete_connector(&self, connector_id: &str) -> Result<()> {
        let _: Empty = self
            .call(ops::CONNECTORS_DELETE, &id_request(connector_id))
            .await?;
        Ok(())
    }

    /// Instance counts of a connector; `Ok(None)` if it does not exist.
    pub async fn get_connector_status(
        &self,
        connector_id: &str,
    ) -> Result<Option<ConnectorStatus>> {
        // ---
        let resp: GetConnectorStatusResponse = self
            .call(ops::CONNECTORS_STATUS, &id_request(connector_id))
            .await?;
        found(resp.found, resp.status, "status")
    }

    /// Start a connector; the service creates a new deployment for it.
    pub async fn start_connector(
        &self,
        connector_id: &str,
        options: &StartOptions,
    ) -> Result<StartedDeployment> {
        // ---
        let req = StartConnectorRequest {
            connector_id: connector_id.to_string(),
            options: options.clone(),
        };

        let resp: StartConnectorResponse = self.call(ops::CONNECTORS_START, &req).await?;
        Ok(StartedDeployment {
            deployment_id: resp.deployment_id,
            instances: resp.instances,
        })
    }

    /// Stop every deployment of a connector; returns the affected instances.
    pub async fn stop_connector(&self, connector_id: &str) -> Result<Vec<DeploymentInstance>> {
        let resp: StopResponse = self
            .call(ops::CONNECTORS_STOP, &id_request(connector_id))
            .await?;
        Ok(resp.instances)
    }
}

fn id_request(connector_id: &str) -> ConnectorIdRequest {
    ConnectorIdRequest {
        connector_id: connector_id.to_string(),
    }
}
