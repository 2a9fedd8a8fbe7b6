// src/protocol/headers.rs

use crate::{ConnectError, Message};

/// Human-readable reason for a service rejection.
pub const SERVICE_ERROR_HEADER: &str = "Nats-Service-Error";

/// Machine code for a service rejection.
pub const SERVICE_ERROR_CODE_HEADER: &str = "Nats-Service-Error-Code";

/// Present on every streamed reply; only the literal `"true"` means more follow.
pub const HAS_MORE_HEADER: &str = "Connect-Has-More";

/// Event type of a captured event; the JSON body does not carry it.
pub const EVENT_TYPE_HEADER: &str = "Connect-Event-Type";

/// Bus status for "no subscriber on the request subject".
pub(crate) const NO_RESPONDERS_STATUS: u16 = 503;

/// The service-error carried by `msg`, if any.
///
/// A reply is an error exactly when the message header is present and
/// non-empty; the code header alone does not make it one.
pub(crate) fn service_error(msg: &Message) -> Option<ConnectError> {
    // ---
    match msg.header(SERVICE_ERROR_HEADER) {
        Some(message) if !message.is_empty() => {
            let code = msg.header(SERVICE_ERROR_CODE_HEADER);
            Some(ConnectError::service(message, code))
        }
        _ => None,
    }
}

/// Has-more flag of a streamed reply. Absent means `false`.
pub(crate) fn has_more(msg: &Message) -> bool {
    msg.header(HAS_MORE_HEADER) == Some("true")
}

/// True for the empty-slot sentinel of a streamed reply.
///
/// The defined sentinel is the literal JSON `null`; an empty body is treated
/// the same way.
pub(crate) fn is_null_payload(payload: &[u8]) -> bool {
    payload.is_empty() || payload == b"null"
}

/// True if the bus itself reported that nobody listens on the subject.
pub(crate) fn is_no_responders(msg: &Message) -> bool {
    msg.status == Some(NO_RESPONDERS_STATUS)
}
