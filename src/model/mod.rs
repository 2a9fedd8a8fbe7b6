// src/model/mod.rs

//! Typed request and response bodies.
//!
//! Field names are the wire names; every type here serializes to exactly the
//! JSON object the control service expects or returns on its subject.

mod capture;
mod connector;
mod deployment;
mod library;

pub use capture::{Captured, EventRecord, LogRecord, MetricsRecord};
pub use connector::{
    //
    Connector,
    ConnectorStatus,
    ConnectorSteps,
    ConnectorSummary,
    StartOptions,
    StartedDeployment,
    Step,
};
pub use deployment::{Deployment, DeploymentInstance, InstanceState};
pub use library::{
    //
    Component,
    ComponentKind,
    ComponentSearchFilter,
    ComponentSummary,
    Runtime,
    RuntimeSummary,
};

pub(crate) use connector::{
    //
    ConnectorIdRequest,
    ConnectorResponse,
    CreateConnectorRequest,
    GetConnectorResponse,
    GetConnectorStatusResponse,
    ListConnectorsRequest,
    PatchConnectorRequest,
    StartConnectorRequest,
    StartConnectorResponse,
    StopResponse,
};
pub(crate) use deployment::{DeploymentIdRequest, GetDeploymentResponse, ListDeploymentsRequest};
pub(crate) use library::{
    //
    GetComponentRequest,
    GetComponentResponse,
    GetRuntimeRequest,
    GetRuntimeResponse,
    ListRuntimesRequest,
    SearchComponentsRequest,
};

/// Empty JSON object, the response body of operations with no result.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct Empty {}
