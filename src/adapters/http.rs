use crate::domain::model::{LocationData, LocationResponse};
use crate::domain::ports::{ConfigProvider, LocationReporter};
use crate::utils::error::{BridgeError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const LOCATION_PATH: &str = "/api/location/set";

/// Reports the applied coordinates to the backend.
#[derive(Debug, Clone)]
pub struct HttpLocationReporter {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpLocationReporter {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let endpoint = config
            .backend_endpoint()
            .ok_or_else(|| BridgeError::MissingConfigError {
                field: "backend.endpoint".to_string(),
            })?;
        Self::new(
            endpoint,
            config.api_token().map(str::to_string),
            Duration::from_secs(config.request_timeout_seconds()),
        )
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, LOCATION_PATH)
    }
}

#[async_trait]
impl LocationReporter for HttpLocationReporter {
    async fn report(&self, location: &LocationData) -> Result<LocationResponse> {
        let url = self.url();
        tracing::debug!("Making API request to: {}", url);

        let mut request = self.client.post(&url).json(location);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::ApiStatusError {
                status: status.as_u16(),
                body,
            });
        }

        let body: LocationResponse = response.json().await?;
        if body.success {
            tracing::info!("📤 Location reported to backend");
        } else {
            tracing::warn!(
                "⚠️ Backend did not accept location: {}",
                body.message.as_deref().unwrap_or("no message")
            );
        }
        Ok(body)
    }
}
