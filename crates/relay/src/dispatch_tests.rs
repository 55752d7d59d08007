// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::*;
use crate::registry::{ConnectionHandle, ConnectionId, Frame};

struct Client {
    _tx: mpsc::Sender<Frame>,
    rx: mpsc::Receiver<Frame>,
}

fn bind(registry: &ConnectionRegistry, user: &str) -> Client {
    let (tx, rx) = mpsc::channel(8);
    registry.bind(&protocol::room_key(user), ConnectionHandle::new(ConnectionId::new(), &tx));
    Client { _tx: tx, rx }
}

fn trigger(target: &str, game: &str, event: &str, value: &str) -> TriggerRequest {
    TriggerRequest {
        target_id: target.to_owned(),
        game_id: game.to_owned(),
        event_name: event.to_owned(),
        value_data: value.to_owned(),
    }
}

fn next_json(client: &mut Client) -> anyhow::Result<Value> {
    let frame = client.rx.try_recv()?;
    Ok(serde_json::from_str(&frame)?)
}

#[test]
fn single_connection_receives_update() -> anyhow::Result<()> {
    let registry = Arc::new(ConnectionRegistry::new());
    let mut c1 = bind(&registry, "userA");
    let dispatcher = Dispatcher::new(Arc::clone(&registry));

    let report =
        dispatcher.dispatch(&trigger("userA", "game1", "score", "42"), &json!({"x": 1}))?;

    assert_eq!(report.room, "user:userA");
    assert_eq!(report.event, "game1-update");
    assert_eq!(report.recipients, 1);
    assert_eq!(report.delivery.sent_to, 1);

    let msg = next_json(&mut c1)?;
    assert_eq!(msg["event"], "game1-update");
    assert_eq!(msg["data"], json!({"eventName": "score", "valueData": "42", "targetId": "userA"}));
    assert_eq!(msg["body"], json!({"x": 1}));
    Ok(())
}

#[test]
fn no_bindings_is_success_with_zero() -> anyhow::Result<()> {
    let registry = Arc::new(ConnectionRegistry::new());
    let mut other = bind(&registry, "userA");
    let dispatcher = Dispatcher::new(Arc::clone(&registry));

    let report = dispatcher.dispatch(&trigger("userB", "game1", "score", "1"), &Value::Null)?;

    assert_eq!(report.recipients, 0);
    assert_eq!(report.delivery.sent_to, 0);
    assert!(other.rx.try_recv().is_err());
    Ok(())
}

#[test]
fn every_device_of_a_user_receives_update() -> anyhow::Result<()> {
    let registry = Arc::new(ConnectionRegistry::new());
    let mut c1 = bind(&registry, "userC");
    let mut c2 = bind(&registry, "userC");
    let dispatcher = Dispatcher::new(Arc::clone(&registry));

    let report = dispatcher.dispatch(&trigger("userC", "g", "e", "v"), &Value::Null)?;

    assert_eq!(report.delivery.sent_to, 2);
    assert_eq!(next_json(&mut c1)?["event"], "g-update");
    assert_eq!(next_json(&mut c2)?["event"], "g-update");
    Ok(())
}

#[test]
fn dead_connection_still_counted_and_others_delivered() -> anyhow::Result<()> {
    let registry = Arc::new(ConnectionRegistry::new());
    let mut live = bind(&registry, "userD");
    let dead = bind(&registry, "userD");
    drop(dead);
    let dispatcher = Dispatcher::new(Arc::clone(&registry));

    let report = dispatcher.dispatch(&trigger("userD", "g", "e", "v"), &Value::Null)?;

    assert_eq!(report.delivery.sent_to, 2);
    assert_eq!(report.delivery.failed, 1);
    assert_eq!(next_json(&mut live)?["data"]["targetId"], "userD");
    Ok(())
}

// A user bound while playing one game still receives updates addressed to
// any other game id; only the user id selects the room.
#[test]
fn binding_is_not_scoped_by_game() -> anyhow::Result<()> {
    let registry = Arc::new(ConnectionRegistry::new());
    let mut c1 = bind(&registry, "userA");
    let dispatcher = Dispatcher::new(Arc::clone(&registry));

    let report = dispatcher.dispatch(&trigger("userA", "otherGame", "e", "v"), &Value::Null)?;

    assert_eq!(report.delivery.sent_to, 1);
    assert_eq!(next_json(&mut c1)?["event"], "otherGame-update");
    Ok(())
}

#[yare::parameterized(
    target = { "", "g", "e", "v", "targetId" },
    game = { "t", "", "e", "v", "gameId" },
    event = { "t", "g", "", "v", "eventName" },
    value = { "t", "g", "e", "", "valueData" },
)]
fn empty_field_is_rejected(target: &str, game: &str, event: &str, value: &str, field: &str) {
    let registry = Arc::new(ConnectionRegistry::new());
    let dispatcher = Dispatcher::new(registry);
    let request = trigger(target, game, event, value);

    assert_eq!(request.missing_field(), Some(field));
    assert_eq!(dispatcher.dispatch(&request, &Value::Null), Err(RelayError::BadRequest));
}

#[test]
fn response_serializes_camel_case() -> anyhow::Result<()> {
    let body = serde_json::to_value(TriggerResponse::success(3))?;
    assert_eq!(body, json!({"status": "success", "sentTo": 3}));
    Ok(())
}
