use crate::core::notification::StatusNotifier;
use crate::core::provider::MockLocationProvider;
use crate::core::{ForegroundPlatform, MockFix, ProviderState, ServiceState, TestProviderPlatform};
use crate::utils::error::{MockLocationError, NotificationError};

/// Results of `apply`, one per entry point.
#[derive(Debug)]
pub struct ApplyOutcome {
    pub notification: Result<(), NotificationError>,
    pub location: Result<MockFix, MockLocationError>,
}

impl ApplyOutcome {
    pub fn location_applied(&self) -> bool {
        self.location.is_ok()
    }
}

/// Inbound boundary used by the application layer.
///
/// `set_mock_location` and `start_status_notification` are independent:
/// neither inspects the other's result.
pub struct MockLocationBridge<P: TestProviderPlatform, F: ForegroundPlatform> {
    provider: MockLocationProvider<P>,
    notifier: StatusNotifier<F>,
}

impl<P: TestProviderPlatform, F: ForegroundPlatform> MockLocationBridge<P, F> {
    pub fn new(provider: MockLocationProvider<P>, notifier: StatusNotifier<F>) -> Self {
        Self { provider, notifier }
    }

    pub async fn set_mock_location(
        &mut self,
        latitude: f64,
        longitude: f64,
    ) -> Result<MockFix, MockLocationError> {
        self.provider.set_mock_location(latitude, longitude).await
    }

    pub async fn start_status_notification(
        &mut self,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), NotificationError> {
        self.notifier
            .start_status_notification(latitude, longitude)
            .await
    }

    /// Starts the status notification, then sets the location. A failed
    /// notification is recorded and never stops the location write.
    pub async fn apply(&mut self, latitude: f64, longitude: f64) -> ApplyOutcome {
        let notification = self.start_status_notification(latitude, longitude).await;
        if let Err(e) = &notification {
            tracing::warn!("⚠️ Status notification failed, continuing: {}", e);
        }

        let location = self.set_mock_location(latitude, longitude).await;

        ApplyOutcome {
            notification,
            location,
        }
    }

    /// Removes the test provider and stops the status service. Both steps
    /// run even if the first one fails; the first error is returned.
    pub async fn clear(&mut self) -> crate::utils::error::Result<()> {
        let removed = self.provider.remove().await;
        let stopped = self.notifier.stop().await;
        removed?;
        stopped?;
        Ok(())
    }

    pub fn provider_state(&self) -> ProviderState {
        self.provider.state()
    }

    pub fn service_state(&self) -> ServiceState {
        self.notifier.state()
    }
}
