// src/connect/library.rs

use super::{found, ConnectClient};
use crate::model::{
    // ---
    Component,
    ComponentKind,
    ComponentSearchFilter,
    ComponentSummary,
    GetComponentRequest,
    GetComponentResponse,
    GetRuntimeRequest,
    GetRuntimeResponse,
    ListRuntimesRequest,
    Runtime,
    RuntimeSummary,
    SearchComponentsRequest,
};
use crate::subjects::ops;
use crate::Result;

impl ConnectClient {
    // ---
    pub async fn list_runtimes(&self) -> Result<Vec<RuntimeSummary>> {
        self.list(ops::RUNTIMES_LIST, &ListRuntimesRequest::default())
            .await
    }

    pub async fn list_runtimes_with<F>(&self, handler: F) -> Result<()>
    where
        F: FnMut(Option<RuntimeSummary>, bool) -> Result<()>,
    {
        let req = ListRuntimesRequest::default();
        self.list_with(ops::RUNTIMES_LIST, &req, handler).await
    }

    /// Look up a runtime; `Ok(None)` if it does not exist.
    pub async fn get_runtime(&self, runtime_id: &str) -> Result<Option<Runtime>> {
        // ---
        let req = GetRuntimeRequest {
            runtime_id: runtime_id.to_string(),
        };

        let resp: GetRuntimeResponse = self.call(ops::RUNTIMES_GET, &req).await?;
        found(resp.found, resp.runtime, "runtime")
    }

    /// Components matching `filter`, across all runtimes unless it names one.
    pub async fn search_components(
        &self,
        filter: &ComponentSearchFilter,
    ) -> Result<Vec<ComponentSummary>> {
        self.list(ops::COMPONENTS_SEARCH, &search_request(filter))
            .await
    }

    pub async fn search_components_with<F>(
        &self,
        filter: &ComponentSearchFilter,
        handler: F,
    ) -> Result<()>
    where
        F: FnMut(Option<ComponentSummary>, bool) -> Result<()>,
    {
        self.list_with(ops::COMPONENTS_SEARCH, &search_request(filter), handler)
            .await
    }

    /// Look up a component; `Ok(None)` if the runtime has no such component.
    pub async fn get_component(
        &self,
        runtime_id: &str,
        kind: ComponentKind,
        name: &str,
    ) -> Result<Option<Component>> {
        // ---
        let req = GetComponentRequest {
            runtime_id: runtime_id.to_string(),
            kind,
            name: name.to_string(),
        };

        let resp: GetComponentResponse = self.call(ops::COMPONENTS_GET, &req).await?;
        found(resp.found, resp.component, "component")
    }
}

fn search_request(filter: &ComponentSearchFilter) -> SearchComponentsRequest {
    SearchComponentsRequest {
        filter: filter.clone(),
    }
}
