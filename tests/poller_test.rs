//! Live dashboard polling lifecycle.
//!
//! Run with: cargo test --test poller_test

use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;
use tokio_test::assert_ok;

use grow_monitor::backend::RecordId;
use grow_monitor::sync::PollHandle;
use grow_monitor::telemetry::{Target, ViewStatus};

use crate::common::{test_state, FakeBackend};

mod common;

const TOKEN: &str = "Bearer test-token";

fn with_sensor() -> std::sync::Arc<FakeBackend> {
    let backend = FakeBackend::new();
    backend.respond(
        "getsensors",
        200,
        json!({
            "success": true,
            "sensor": [{ "SerialNumber": "HUB-1", "location_id": 3 }]
        }),
    );
    backend.respond(
        "getsensorvalues",
        200,
        json!({
            "success": true,
            "sensorvalue": [{
                "SENSORDATAJSON": "{\"AirTemp\": 21.5}",
                "CreateDateTime": "2024-05-01 10:00:00"
            }]
        }),
    );
    backend
}

#[tokio::test]
async fn first_refresh_arrives_immediately() {
    let backend = with_sensor();
    let handle = PollHandle::start(
        test_state(backend.clone()),
        TOKEN.to_string(),
        Target::Location(RecordId::from("3")),
    );
    let mut rx = handle.subscribe();
    assert!(rx.borrow().is_none());

    timeout(Duration::from_secs(2), rx.changed())
        .await
        .expect("no refresh within 2s")
        .unwrap();

    let view = rx.borrow().clone().unwrap();
    assert_eq!(view.status, ViewStatus::Ready);
    assert_eq!(view.telemetry.current["air_temp"], 21.5);
    assert!(handle.is_running());
}

#[tokio::test]
async fn dropping_the_handle_stops_polling() {
    let backend = with_sensor();
    let handle = PollHandle::start(
        test_state(backend.clone()),
        TOKEN.to_string(),
        Target::Location(RecordId::from("3")),
    );
    let mut rx = handle.subscribe();

    timeout(Duration::from_secs(2), rx.changed())
        .await
        .unwrap()
        .unwrap();

    drop(handle);

    // The sender goes away with the aborted task
    let closed = timeout(Duration::from_secs(2), async {
        loop {
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
    .await;
    assert_ok!(closed);

    let calls = backend.calls().len();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(backend.calls().len(), calls);
}

#[tokio::test]
async fn failed_refresh_keeps_polling() {
    let backend = FakeBackend::new();
    backend.go_offline();

    let handle = PollHandle::start(
        test_state(backend.clone()),
        TOKEN.to_string(),
        Target::Plant(RecordId::from("12")),
    );
    let rx = handle.subscribe();

    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert!(rx.borrow().is_none());
    assert!(handle.is_running());
    assert!(backend.endpoints().len() >= 2);

    drop(handle);
}
