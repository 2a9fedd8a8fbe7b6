// src/model/library.rs

use serde::{Deserialize, Serialize};

/// Role a component plays in a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Source,
    Transformer,
    Sink,
}

/// Listing entry for a runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSummary {
    pub runtime_id: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub description: String,
}

/// A runtime: the execution image connectors run in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runtime {
    pub runtime_id: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub description: String,

    pub image: String,

    #[serde(default)]
    pub author: Option<String>,
}

/// Listing entry for a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSummary {
    pub runtime_id: String,
    pub kind: ComponentKind,
    pub name: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub description: String,
}

/// Full component description, including its configuration schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub runtime_id: String,
    pub kind: ComponentKind,
    pub name: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub version: Option<String>,

    /// Field definitions as returned by the service.
    #[serde(default)]
    pub fields: serde_json::Value,
}

/// Criteria for a component search. Unset fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSearchFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ComponentKind>,

    /// Substring match on name and label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

// --- wire bodies

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct ListRuntimesRequest {}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GetRuntimeRequest {
    pub runtime_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GetRuntimeResponse {
    pub found: bool,
    #[serde(default)]
    pub runtime: Option<Runtime>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SearchComponentsRequest {
    pub filter: ComponentSearchFilter,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GetComponentRequest {
    pub runtime_id: String,
    pub kind: ComponentKind,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GetComponentResponse {
    pub found: bool,
    #[serde(default)]
    pub component: Option<Component>,
}
