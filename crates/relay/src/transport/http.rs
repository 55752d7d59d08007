// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the relay.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::dispatch::{TriggerRequest, TriggerResponse};
use crate::error::{ApiError, RelayError};
use crate::protocol::decode_body;
use crate::state::RelayState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub ready: bool,
    pub rooms: usize,
    pub connections: usize,
}

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<RelayState>>) -> impl IntoResponse {
    let stats = s.stats();
    Json(HealthResponse {
        status: "running".to_owned(),
        ready: s.is_ready(),
        rooms: stats.rooms,
        connections: stats.connections,
    })
}

/// `POST /{target_id}/{game_id}/{event_name}/{value_data}` — relay one event
/// to every connection bound to the target.
pub async fn trigger(
    State(s): State<Arc<RelayState>>,
    Path(req): Path<TriggerRequest>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TriggerResponse>, ApiError> {
    let dispatcher = s.dispatcher().map_err(|code| {
        tracing::warn!(target_id = %req.target_id, "trigger refused: relay not ready");
        ApiError::from(code)
    })?;

    let content_type = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let body = decode_body(content_type, &body);

    let report = dispatcher.dispatch(&req, &body).map_err(|code| match code {
        RelayError::BadRequest => {
            let field = req.missing_field().unwrap_or("unknown");
            code.with_message(format!("missing path segment: {field}"))
        }
        other => ApiError::from(other),
    })?;
    Ok(Json(TriggerResponse::success(report.delivery.sent_to)))
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
