// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns one trigger request into a room broadcast.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RelayError;
use crate::protocol::{self, RelayPayload};
use crate::registry::{ConnectionRegistry, Delivery};

/// A decoded trigger request. Field names match the route's path segments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TriggerRequest {
    pub target_id: String,
    pub game_id: String,
    pub event_name: String,
    pub value_data: String,
}

impl TriggerRequest {
    /// Reject requests with any empty field.
    pub fn validate(&self) -> Result<(), RelayError> {
        match self.missing_field() {
            Some(_) => Err(RelayError::BadRequest),
            None => Ok(()),
        }
    }

    /// Name of the first empty field, for error messages.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("targetId", self.target_id.is_empty()),
            ("gameId", self.game_id.is_empty()),
            ("eventName", self.event_name.is_empty()),
            ("valueData", self.value_data.is_empty()),
        ]
        .into_iter()
        .find_map(|(name, empty)| empty.then_some(name))
    }
}

/// Success body for a trigger request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub status: String,
    pub sent_to: usize,
}

impl TriggerResponse {
    pub fn success(sent_to: usize) -> Self {
        Self { status: "success".to_owned(), sent_to }
    }
}

/// What a single dispatch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub room: String,
    pub event: String,
    /// Room size observed before sending.
    pub recipients: usize,
    pub delivery: Delivery,
}

/// Resolves trigger requests against the registry and fans them out.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Broadcast `<game>-update` to every connection bound to the target.
    ///
    /// Zero recipients is a normal outcome. Per-connection failures are
    /// absorbed by the registry and only show up in the report.
    pub fn dispatch(
        &self,
        request: &TriggerRequest,
        body: &Value,
    ) -> Result<DispatchReport, RelayError> {
        request.validate()?;

        let room = protocol::room_key(&request.target_id);
        let event = protocol::update_event(&request.game_id);

        let recipients = self.registry.lookup(&room).len();
        if recipients == 0 {
            tracing::warn!(room = %room, "no active connections");
        }

        let payload = RelayPayload {
            event_name: request.event_name.clone(),
            value_data: request.value_data.clone(),
            target_id: request.target_id.clone(),
        };
        let frame = protocol::encode_relay(&event, &payload, body).map_err(|e| {
            tracing::error!(err = %e, "failed to encode relay event");
            RelayError::Internal
        })?;

        let delivery = self.registry.broadcast(&room, frame);
        if delivery.failed > 0 {
            tracing::warn!(
                room = %room,
                failed = delivery.failed,
                sent_to = delivery.sent_to,
                "some connections did not accept the event"
            );
        }

        tracing::info!(
            count = delivery.sent_to,
            target_id = %request.target_id,
            game = %request.game_id,
            event = %request.event_name,
            value = %request.value_data,
            "event sent"
        );

        Ok(DispatchReport { room, event, recipients, delivery })
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
