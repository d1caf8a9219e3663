use crate::domain::model::{
    LocationData, LocationResponse, MockFix, NotificationChannel, ProviderProperties,
    StatusNotification,
};
use crate::utils::error::{PlatformResult, Result};
use async_trait::async_trait;

/// `LocationManager` test-provider API.
///
/// Every call is a single-shot request with no timeout. Implementations
/// report OS exceptions as `PlatformError` carrying the OS message.
#[async_trait]
pub trait TestProviderPlatform: Send + Sync {
    async fn add_test_provider(
        &self,
        provider: &str,
        properties: &ProviderProperties,
    ) -> PlatformResult<()>;

    async fn remove_test_provider(&self, provider: &str) -> PlatformResult<()>;

    async fn set_test_provider_enabled(&self, provider: &str, enabled: bool)
        -> PlatformResult<()>;

    async fn set_test_provider_location(&self, provider: &str, fix: &MockFix)
        -> PlatformResult<()>;
}

/// Notification channel and foreground-service API.
#[async_trait]
pub trait ForegroundPlatform: Send + Sync {
    async fn create_channel(&self, channel: &NotificationChannel) -> PlatformResult<()>;

    async fn start_foreground(&self, notification: &StatusNotification) -> PlatformResult<()>;

    async fn stop_self(&self) -> PlatformResult<()>;
}

#[async_trait]
pub trait LocationReporter: Send + Sync {
    async fn report(&self, location: &LocationData) -> Result<LocationResponse>;
}

pub trait ConfigProvider: Send + Sync {
    fn adb_path(&self) -> &str;
    fn device_serial(&self) -> Option<&str>;
    fn provider_name(&self) -> &str;
    fn service_component(&self) -> &str;
    fn notification_channel(&self) -> NotificationChannel;
    fn backend_endpoint(&self) -> Option<&str>;
    fn api_token(&self) -> Option<&str>;
    fn request_timeout_seconds(&self) -> u64;
}
