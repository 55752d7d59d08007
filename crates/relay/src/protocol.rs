// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format for persistent connections, plus the naming conventions shared
//! by the binding handler and the dispatcher.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <value>}`. Relay
//! events additionally carry the trigger request's raw body under `body`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::Frame;

/// Prefix applied to an identity to form its room key.
pub const ROOM_PREFIX: &str = "user:";

/// Suffix appended to a channel id to form the outbound event name.
pub const UPDATE_SUFFIX: &str = "-update";

/// Inbound event that binds a connection to an identity.
pub const AUTHENTICATE: &str = "authenticate";

/// Outbound acknowledgement of a successful bind.
pub const AUTHENTICATED: &str = "authenticated";

/// Room key for an identity: `user:<identity>`.
pub fn room_key(identity: &str) -> String {
    format!("{ROOM_PREFIX}{identity}")
}

/// Outbound event name for a channel: `<channel>-update`.
pub fn update_event(channel: &str) -> String {
    format!("{channel}{UPDATE_SUFFIX}")
}

// -- Client -> Server ---------------------------------------------------------

/// Loosely-typed inbound frame; `data` is decoded per event.
#[derive(Debug, Clone, Deserialize)]
pub struct Inbound {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// Payload of an `authenticate` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatePayload {
    pub user_id: String,
    /// Logged at bind time only; not part of the room key.
    #[serde(default)]
    pub game_id: Option<String>,
}

// -- Server -> Client ---------------------------------------------------------

#[derive(Debug, Serialize)]
struct Outbound<'a, T> {
    event: &'a str,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a Value>,
}

/// Payload of a `<channel>-update` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayPayload {
    pub event_name: String,
    pub value_data: String,
    pub target_id: String,
}

#[derive(Debug, Serialize)]
struct AuthenticatedPayload<'a> {
    room: &'a str,
}

/// Encode a relay event once so it can be shared by every recipient.
pub fn encode_relay(
    event: &str,
    payload: &RelayPayload,
    body: &Value,
) -> Result<Frame, serde_json::Error> {
    let json = serde_json::to_string(&Outbound { event, data: payload, body: Some(body) })?;
    Ok(Arc::from(json))
}

/// Encode the bind acknowledgement for `room`.
pub fn encode_authenticated(room: &str) -> Result<Frame, serde_json::Error> {
    let json = serde_json::to_string(&Outbound {
        event: AUTHENTICATED,
        data: AuthenticatedPayload { room },
        body: None,
    })?;
    Ok(Arc::from(json))
}

/// Interpret a trigger request body by its `Content-Type`.
///
/// JSON media types (`application/json`, `*+json`) are parsed and forwarded
/// as JSON; a JSON body that fails to parse is forwarded as its text. Every
/// other type is forwarded as a string. An empty body is `null`.
pub fn decode_body(content_type: Option<&str>, raw: &[u8]) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if !content_type.is_some_and(is_json_media_type) {
        return Value::String(String::from_utf8_lossy(raw).into_owned());
    }
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(raw)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(raw).into_owned()))
}

fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
