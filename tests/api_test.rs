//! End-to-end tests for the HTTP surface, backed by an in-memory backend.
//!
//! Run with: cargo test --test api_test

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use utoipa::OpenApi;

use grow_monitor::routes::{build_router, ApiDoc};

use crate::common::{test_state, FakeBackend};

mod common;

const TOKEN: &str = "Bearer test-token";

fn app(backend: &std::sync::Arc<FakeBackend>) -> Router {
    build_router(test_state(backend.clone())).unwrap()
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn sensors_fixture() -> Value {
    json!({
        "success": true,
        "sensor": [
            {
                "SerialNumber": "HUB-1",
                "location_id": "3",
                "in_plant_id": null,
                "AddonSerialNumber": "CLI-1",
                "SensorType": "CLIMATE"
            }
        ]
    })
}

fn values_fixture() -> Value {
    let reading = |at: &str, temp: f64| {
        json!({
            "SENSORDATAJSON": json!({ "AirTemp": temp, "AirHum": "55.0" }).to_string(),
            "CreateDateTime": at
        })
    };
    json!({
        "success": true,
        "sensorvalue": [
            reading("2024-05-01 10:00:00", 20.0),
            reading("2024-05-01 10:05:00", 25.0),
            reading("2024-05-01 10:10:00", 18.0)
        ]
    })
}

#[tokio::test]
async fn healthz_answers_without_backend() {
    let backend = FakeBackend::new();
    backend.go_offline();

    let response = app(&backend).oneshot(get("/healthz")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn proxy_relays_status_and_body_verbatim() {
    let backend = FakeBackend::new();
    backend.respond(
        "getplants",
        403,
        json!({ "success": false, "message": "Token expired" }),
    );

    let (status, body) = send(
        app(&backend),
        post_json("/api/proxy/getplants", json!({ "location_id": 3 }), Some(TOKEN)),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "success": false, "message": "Token expired" }));

    let calls = backend.calls_to("getplants");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].token.as_deref(), Some(TOKEN));
    assert_eq!(calls[0].body, json!({ "location_id": 3 }));
}

#[tokio::test]
async fn proxy_endpoint_names_are_case_insensitive() {
    let backend = FakeBackend::new();

    let (status, _) = send(
        app(&backend),
        post_json("/api/proxy/GetSensors", json!({}), Some(TOKEN)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(backend.endpoints(), vec!["getsensors"]);
}

#[tokio::test]
async fn proxy_rejects_unknown_endpoint() {
    let backend = FakeBackend::new();

    let (status, body) = send(
        app(&backend),
        post_json("/api/proxy/dropdatabase", json!({}), Some(TOKEN)),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn proxy_requires_token_except_for_login() {
    let backend = FakeBackend::new();

    let (status, body) = send(
        app(&backend),
        post_json("/api/proxy/getlocations", json!({}), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing auth token");

    let (status, _) = send(
        app(&backend),
        post_json(
            "/api/proxy/login",
            json!({ "email": "grower@example.com", "password": "secret" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(backend.endpoints(), vec!["login"]);
    assert_eq!(backend.calls()[0].token, None);
}

#[tokio::test]
async fn proxy_rejects_malformed_json() {
    let backend = FakeBackend::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/proxy/getsensors")
        .header(header::AUTHORIZATION, TOKEN)
        .body(Body::from("{not json"))
        .unwrap();

    let (status, _) = send(app(&backend), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn proxy_reports_unreachable_backend() {
    let backend = FakeBackend::new();
    backend.go_offline();

    let (status, body) = send(
        app(&backend),
        post_json("/api/proxy/getsensors", json!({}), Some(TOKEN)),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn dashboard_without_sensor_is_an_empty_state() {
    let backend = FakeBackend::new();
    backend.respond("getsensors", 200, sensors_fixture());

    let (status, body) = send(
        app(&backend),
        post_json("/api/dashboard", json!({ "location_id": 99 }), Some(TOKEN)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "no_sensor");
    assert_eq!(body["sensor"], Value::Null);
    assert_eq!(backend.endpoints(), vec!["getsensors"]);
}

#[tokio::test]
async fn dashboard_builds_latest_window_for_location() {
    let backend = FakeBackend::new();
    backend.respond("getsensors", 200, sensors_fixture());
    backend.respond("getsensorvalues", 200, values_fixture());

    let (status, body) = send(
        app(&backend),
        post_json("/api/dashboard", json!({ "location_id": 3 }), Some(TOKEN)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["profile"]["kind"], "climate");

    let telemetry = &body["telemetry"];
    assert_eq!(
        telemetry["series"]["labels"],
        json!(["01.05. 10:00", "01.05. 10:05", "01.05. 10:10"])
    );
    assert_eq!(
        telemetry["series"]["metrics"]["air_temp"],
        json!([20.0, 25.0, 18.0])
    );
    assert_eq!(telemetry["extremes"]["air_temp"]["min"], 18.0);
    assert_eq!(telemetry["extremes"]["air_temp"]["max"], 25.0);
    assert_eq!(telemetry["current"]["air_temp"], 18.0);
    assert_eq!(telemetry["current"]["air_humidity"], 55.0);

    // Readings are fetched for the addon, not the base station
    assert_eq!(
        backend.calls_to("getsensorvalues")[0].body,
        json!({ "SerialNumber": "CLI-1" })
    );
}

#[tokio::test]
async fn dashboard_range_outside_history_has_no_readings() {
    let backend = FakeBackend::new();
    backend.respond("getsensors", 200, sensors_fixture());
    backend.respond("getsensorvalues", 200, values_fixture());

    let (status, body) = send(
        app(&backend),
        post_json(
            "/api/dashboard",
            json!({ "location_id": "3", "start_date": "2024-06-01", "end_date": "2024-06-02" }),
            Some(TOKEN),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "no_readings");
    assert_eq!(body["telemetry"]["series"]["labels"], json!([]));
    // Extremes still describe the whole history
    assert_eq!(body["telemetry"]["extremes"]["air_temp"]["max"], 25.0);
}

#[tokio::test]
async fn dashboard_rejects_ambiguous_selection() {
    let backend = FakeBackend::new();

    let (status, _) = send(
        app(&backend),
        post_json(
            "/api/dashboard",
            json!({ "location_id": 3, "plant_id": 4 }),
            Some(TOKEN),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        app(&backend),
        post_json(
            "/api/dashboard",
            json!({ "location_id": 3, "start_date": "2024-05-02", "end_date": "2024-05-01" }),
            Some(TOKEN),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn provisioning_session_lifecycle() {
    let backend = FakeBackend::new();
    let app = app(&backend);

    let (status, created) = send(
        app.clone(),
        post_json("/api/provisioning", json!({}), None),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["step"], "awaiting_device_scan");
    assert_eq!(created["camera"], "active");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        app.clone(),
        post_json(
            &format!("/api/provisioning/{id}/events"),
            json!({
                "type": "scan_device",
                "payload": json!({ "ProductType": "GROWHUB", "SerialNumber": "HUB-1" }).to_string()
            }),
            Some(TOKEN),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "location_selection");
    assert_eq!(body["camera"], "released");

    let (status, body) = send(app.clone(), get(&format!("/api/provisioning/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["device_serial"], "HUB-1");

    let (status, body) = send(
        app.clone(),
        post_json(
            &format!("/api/provisioning/{id}/events"),
            json!({ "type": "cancel" }),
            Some(TOKEN),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "cancelled");

    let (status, _) = send(app, get(&format!("/api/provisioning/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn provisioning_scan_error_keeps_session() {
    let backend = FakeBackend::new();
    let app = app(&backend);

    let (_, created) = send(
        app.clone(),
        post_json("/api/provisioning", json!({}), None),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        app.clone(),
        post_json(
            &format!("/api/provisioning/{id}/events"),
            json!({ "type": "scan_device", "payload": "hello" }),
            Some(TOKEN),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);

    let (_, body) = send(app, get(&format!("/api/provisioning/{id}"))).await;
    assert_eq!(body["step"], "awaiting_device_scan");
    assert_eq!(body["camera"], "active");
}

#[tokio::test]
async fn provisioning_unknown_session_is_not_found() {
    let backend = FakeBackend::new();

    let (status, body) = send(
        app(&backend),
        get("/api/provisioning/7f1c3a52-98a4-4a57-a0a4-6d0f4f6f2c11"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn dashboard_survives_null_reading_and_null_lists() {
    let backend = FakeBackend::new();
    backend.respond("getsensors", 200, sensors_fixture());
    let mut values = values_fixture();
    values["sensorvalue"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "SENSORDATAJSON": null, "CreateDateTime": null }));
    backend.respond("getsensorvalues", 200, values);

    let (status, body) = send(
        app(&backend),
        post_json("/api/dashboard", json!({ "location_id": 3 }), Some(TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(
        body["telemetry"]["series"]["labels"].as_array().unwrap().len(),
        3
    );

    backend.respond(
        "getsensorvalues",
        200,
        json!({ "success": false, "sensorvalue": null }),
    );
    let (status, body) = send(
        app(&backend),
        post_json("/api/dashboard", json!({ "location_id": 3 }), Some(TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "no_readings");

    backend.respond(
        "getsensors",
        200,
        json!({ "success": false, "message": "No sensors", "sensor": null }),
    );
    let (status, body) = send(
        app(&backend),
        post_json("/api/dashboard", json!({ "location_id": 3 }), Some(TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "no_sensor");
}

#[tokio::test]
async fn dashboard_watch_streams_views() {
    let backend = FakeBackend::new();
    backend.respond("getsensors", 200, sensors_fixture());
    backend.respond("getsensorvalues", 200, values_fixture());

    let request = Request::builder()
        .uri("/api/dashboard/watch?location_id=3")
        .header(header::AUTHORIZATION, TOKEN)
        .body(Body::empty())
        .unwrap();
    let response = app(&backend).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    let mut frames = response.into_body().into_data_stream();
    let frame = tokio::time::timeout(std::time::Duration::from_secs(2), frames.next())
        .await
        .expect("no event within 2s")
        .unwrap()
        .unwrap();
    let text = String::from_utf8(frame.to_vec()).unwrap();

    assert!(text.starts_with("event: dashboard\n"));
    assert!(text.contains("\"status\":\"ready\""));
    assert!(text.contains("01.05. 10:10"));
}

#[tokio::test]
async fn dashboard_watch_requires_token_and_target() {
    let backend = FakeBackend::new();

    let (status, _) = send(app(&backend), get("/api/dashboard/watch?location_id=3")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .uri("/api/dashboard/watch")
        .header(header::AUTHORIZATION, TOKEN)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(&backend), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn docs_are_served() {
    let backend = FakeBackend::new();

    let response = app(&backend).oneshot(get("/docs")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(!bytes.is_empty());
}

#[test]
fn openapi_documents_every_route() {
    let doc = ApiDoc::openapi();
    let paths = &doc.paths.paths;

    for path in [
        "/healthz",
        "/api/proxy/{endpoint}",
        "/api/dashboard",
        "/api/dashboard/watch",
        "/api/provisioning",
        "/api/provisioning/{session_id}",
        "/api/provisioning/{session_id}/events",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }

    let proxy = paths["/api/proxy/{endpoint}"].post.as_ref().unwrap();
    assert!(proxy.request_body.is_some());
}
