#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use grow_monitor::backend::{Backend, Forwarded, ProxyRoute, RawReading};
use grow_monitor::common::AppState;
use grow_monitor::config::Config;
use grow_monitor::error::{AppError, AppResult};

/// One request the fake backend received.
#[derive(Debug, Clone)]
pub struct Call {
    pub endpoint: String,
    pub token: Option<String>,
    pub body: Value,
}

/// In-memory stand-in for the LeafAI backend.
///
/// Unknown endpoints answer `{"success": true}`.
#[derive(Default)]
pub struct FakeBackend {
    responses: Mutex<HashMap<String, Forwarded>>,
    calls: Mutex<Vec<Call>>,
    offline: Mutex<bool>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, endpoint: &str, status: u16, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), Forwarded { status, body });
    }

    pub fn go_offline(&self) {
        *self.offline.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.endpoint).collect()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.endpoint == endpoint)
            .collect()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn forward(
        &self,
        route: &ProxyRoute,
        token: Option<&str>,
        body: Value,
    ) -> AppResult<Forwarded> {
        self.calls.lock().unwrap().push(Call {
            endpoint: route.endpoint.to_string(),
            token: token.map(str::to_string),
            body,
        });

        if *self.offline.lock().unwrap() {
            return Err(AppError::Upstream("connection refused".to_string()));
        }

        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(route.endpoint)
            .cloned()
            .unwrap_or(Forwarded {
                status: 200,
                body: json!({ "success": true }),
            }))
    }
}

pub fn test_config() -> Config {
    Config {
        disable_rate_limiting: true,
        poll_interval_seconds: 1,
        ..Config::default()
    }
}

pub fn test_state(backend: Arc<FakeBackend>) -> AppState {
    AppState::new(test_config(), backend)
}

/// A raw reading carrying `payload` captured at `at`.
pub fn raw(payload: Value, at: &str) -> RawReading {
    RawReading {
        payload: payload.to_string(),
        captured_at: at.to_string(),
    }
}
