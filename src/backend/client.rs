use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use std::time::Duration;

use crate::backend::{Backend, Forwarded, ProxyRoute, Upstream};
use crate::config::Config;
use crate::error::{AppError, AppResult};

pub struct LeafClient {
    http_client: Client,
    base_url: String,
    legacy_base_url: String,
}

impl LeafClient {
    /// Build a client for both LeafAI deployments.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the TLS backend cannot be initialized.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.leaf_api_base_url.clone(),
            legacy_base_url: config.leaf_legacy_api_base_url.clone(),
        })
    }

    fn url_for(&self, route: &ProxyRoute) -> String {
        let base = match route.upstream {
            Upstream::Primary => &self.base_url,
            Upstream::Legacy => &self.legacy_base_url,
        };
        format!("{base}{}", route.path)
    }
}

#[async_trait]
impl Backend for LeafClient {
    async fn forward(
        &self,
        route: &ProxyRoute,
        token: Option<&str>,
        body: Value,
    ) -> AppResult<Forwarded> {
        let url = self.url_for(route);

        let mut request = self.http_client.post(&url).json(&body);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, token);
        }

        let response = request.send().await.map_err(|e| {
            AppError::Upstream(format!("{} request failed: {e}", route.endpoint))
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            AppError::Upstream(format!("Failed to read {} response: {e}", route.endpoint))
        })?;

        let body = serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                endpoint = route.endpoint,
                status,
                error = %e,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Backend returned a non-JSON body"
            );
            AppError::Upstream(format!("Failed to parse {} response: {e}", route.endpoint))
        })?;

        tracing::debug!(endpoint = route.endpoint, status, "backend_forwarded");
        Ok(Forwarded { status, body })
    }
}
