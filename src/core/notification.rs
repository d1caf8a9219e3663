use crate::core::{ForegroundPlatform, NotificationChannel, ServiceState, StatusNotification};
use crate::utils::error::NotificationError;

/// Foreground status service shown while a mock location is active.
pub struct StatusNotifier<F: ForegroundPlatform> {
    platform: F,
    channel: NotificationChannel,
    state: ServiceState,
}

impl<F: ForegroundPlatform> StatusNotifier<F> {
    pub fn new(platform: F) -> Self {
        Self::with_channel(platform, NotificationChannel::default())
    }

    pub fn with_channel(platform: F, channel: NotificationChannel) -> Self {
        Self {
            platform,
            channel,
            state: ServiceState::NotStarted,
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Publishes the ongoing notification for `(latitude, longitude)` and
    /// enters the foreground state. One-shot: call again when the
    /// coordinates change.
    pub async fn start_status_notification(
        &mut self,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), NotificationError> {
        tracing::debug!("Starting status notification lat={} lng={}", latitude, longitude);

        if let Err(e) = self.platform.create_channel(&self.channel).await {
            tracing::error!("❌ Notification channel setup failed: {}", e);
            return Err(NotificationError::Channel { message: e.message });
        }

        let notification = StatusNotification::for_coordinates(&self.channel, latitude, longitude);

        if let Err(e) = self.platform.start_foreground(&notification).await {
            tracing::error!("❌ startForeground failed: {}", e);
            // 沒有降級模式：無法前景化就直接停止服務
            if let Err(stop_err) = self.platform.stop_self().await {
                tracing::warn!("⚠️ stopSelf after failed start also failed: {}", stop_err);
            }
            self.state = ServiceState::NotStarted;
            return Err(NotificationError::ForegroundDenied { message: e.message });
        }

        self.state = ServiceState::Started;
        tracing::info!("🔔 Status notification showing: {}", notification.text);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), NotificationError> {
        self.platform
            .stop_self()
            .await
            .map_err(|e| NotificationError::Stop { message: e.message })?;
        self.state = ServiceState::NotStarted;
        tracing::info!("🔕 Status service stopped");
        Ok(())
    }
}
