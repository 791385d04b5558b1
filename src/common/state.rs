use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::backend::Backend;
use crate::config::Config;
use crate::provisioning::ProvisioningSession;

/// Open provisioning wizards, keyed by session id.
/// Entries expire after sitting idle for the configured TTL.
pub type SessionStore = Cache<Uuid, ProvisioningSession>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backend: Arc<dyn Backend>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn Backend>) -> Self {
        let sessions: SessionStore = Cache::builder()
            .max_capacity(config.session_max_entries)
            .time_to_idle(Duration::from_secs(config.session_ttl_seconds))
            .build();

        Self {
            config: Arc::new(config),
            backend,
            sessions,
        }
    }
}
