// src/subjects.rs

//! Subject construction.
//!
//! Pure functions that turn an account plus an operation (or a capture
//! filter) into a bus subject. The grammar is:
//!
//! ```text
//! RPC:      $CONSVC.<account>.<RESOURCE>.<OPERATION>
//! Capture:  $CONNECT.<account>.<LOGS|EVENTS|METRICS>.CONNECTOR.<cid|*>.DEPLOYMENT.<did|*>.INSTANCE.<iid|*>
//! ```
//!
//! Account strings are not validated here; a malformed account simply
//! produces a subject nobody answers.

use crate::capture::{CaptureFilter, CaptureKind, CaptureSource};
use crate::Subject;

/// Service namespace of the control service's RPC endpoints.
pub const CONTROL_SERVICE: &str = "CONSVC";

/// Namespace of the capture streams.
pub const CAPTURE_SERVICE: &str = "CONNECT";

/// `$<SERVICE>.<account>.<op>`
pub fn service_subject(service: &str, account: &str, op: &str) -> Subject {
    Subject::from(format!("${service}.{account}.{op}"))
}

/// `$CONSVC.<account>.<op>`, where `op` is `<RESOURCE>.<OPERATION>`.
pub fn rpc_subject(account: &str, op: &str) -> Subject {
    service_subject(CONTROL_SERVICE, account, op)
}

/// Capture subject for `kind`, with `*` for every unset filter field.
pub fn capture_subject(kind: CaptureKind, account: &str, filter: &CaptureFilter) -> Subject {
    // ---
    let segment = |value: &Option<String>| match value.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => "*".to_string(),
    };

    Subject::from(format!(
        "${CAPTURE_SERVICE}.{account}.{kind}.CONNECTOR.{}.DEPLOYMENT.{}.INSTANCE.{}",
        segment(&filter.connector_id),
        segment(&filter.deployment_id),
        segment(&filter.instance_id),
    ))
}

/// Recover the emitting connector/deployment/instance from a concrete
/// capture subject. Returns `None` for anything that does not follow the
/// capture grammar.
pub fn parse_capture_subject(subject: &Subject) -> Option<CaptureSource> {
    // ---
    let tokens: Vec<&str> = subject.tokens().collect();

    match tokens.as_slice() {
        [service, _account, kind, "CONNECTOR", cid, "DEPLOYMENT", did, "INSTANCE", iid]
            if service.strip_prefix('$') == Some(CAPTURE_SERVICE)
                && CaptureKind::from_token(kind).is_some() =>
        {
            Some(CaptureSource {
                connector_id: cid.to_string(),
                deployment_id: did.to_string(),
                instance_id: iid.to_string(),
            })
        }
        _ => None,
    }
}

pub(crate) mod ops {
    // ---
    pub const CONNECTORS_LIST: &str = "CONNECTORS.LIST";
    pub const CONNECTORS_GET: &str = "CONNECTORS.GET";
    pub const CONNECTORS_CREATE: &str = "CONNECTORS.CREATE";
    pub const CONNECTORS_PATCH: &str = "CONNECTORS.PATCH";
    pub const CONNECTORS_DELETE: &str = "CONNECTORS.DELETE";
    pub const CONNECTORS_STATUS: &str = "CONNECTORS.STATUS";
    pub const CONNECTORS_START: &str = "CONNECTORS.START";
    pub const CONNECTORS_STOP: &str = "CONNECTORS.STOP";

    pub const DEPLOYMENTS_LIST: &str = "DEPLOYMENTS.LIST";
    pub const DEPLOYMENTS_GET: &str = "DEPLOYMENTS.GET";
    pub const DEPLOYMENTS_STOP: &str = "DEPLOYMENTS.STOP";

    pub const RUNTIMES_LIST: &str = "RUNTIMES.LIST";
    pub const RUNTIMES_GET: &str = "RUNTIMES.GET";

    pub const COMPONENTS_SEARCH: &str = "COMPONENTS.SEARCH";
    pub const COMPONENTS_GET: &str = "COMPONENTS.GET";
}
