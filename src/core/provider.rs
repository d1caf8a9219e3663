use crate::core::{MockFix, ProviderProperties, ProviderState, TestProviderPlatform};
use crate::utils::error::{MockLocationError, PlatformError, ProviderStage};

/// Owned handle over one test location provider.
///
/// The handle is the only writer of its `ProviderState`. Operations take
/// `&mut self`, so calls against one provider name are serialised.
pub struct MockLocationProvider<P: TestProviderPlatform> {
    platform: P,
    name: String,
    properties: ProviderProperties,
    state: ProviderState,
}

impl<P: TestProviderPlatform> MockLocationProvider<P> {
    pub fn new(platform: P, name: impl Into<String>) -> Self {
        Self {
            platform,
            name: name.into(),
            properties: ProviderProperties::default(),
            state: ProviderState::Unregistered,
        }
    }

    pub fn state(&self) -> ProviderState {
        self.state
    }

    pub fn provider_name(&self) -> &str {
        &self.name
    }

    /// Registers and enables the test provider, then pushes a fix with
    /// accuracy 5 and the current time.
    ///
    /// Coordinates are passed through as given; range checks belong to the
    /// caller (see `utils::validation::validate_coordinates`).
    pub async fn set_mock_location(
        &mut self,
        latitude: f64,
        longitude: f64,
    ) -> Result<MockFix, MockLocationError> {
        tracing::debug!(
            "set_mock_location lat={} lng={} provider={}",
            latitude,
            longitude,
            self.name
        );

        self.register()
            .await
            .map_err(|e| MockLocationError::unavailable(ProviderStage::Register, e))?;

        if let Err(e) = self
            .platform
            .set_test_provider_enabled(&self.name, true)
            .await
        {
            tracing::error!("❌ setTestProviderEnabled failed: {}", e);
            return Err(MockLocationError::unavailable(ProviderStage::Enable, e));
        }
        self.state = ProviderState::RegisteredEnabled;
        tracing::debug!("Test provider '{}' enabled", self.name);

        let fix = MockFix::now(latitude, longitude);
        if let Err(e) = self
            .platform
            .set_test_provider_location(&self.name, &fix)
            .await
        {
            tracing::error!("❌ setTestProviderLocation failed: {}", e);
            return Err(MockLocationError::unavailable(
                ProviderStage::PushLocation,
                e,
            ));
        }

        tracing::info!(
            "📍 Mock location applied: {}, {} (accuracy {})",
            fix.latitude,
            fix.longitude,
            fix.accuracy
        );
        Ok(fix)
    }

    /// Removes the test provider and resets the handle to `Unregistered`.
    ///
    /// Idempotent: when the handle never registered anything, a platform
    /// refusal (usually "unknown provider") is logged and treated as done.
    pub async fn remove(&mut self) -> Result<(), MockLocationError> {
        if let Err(e) = self.platform.remove_test_provider(&self.name).await {
            if self.state == ProviderState::Unregistered {
                tracing::debug!("removeTestProvider on unregistered handle ignored: {}", e);
                return Ok(());
            }
            tracing::error!("❌ removeTestProvider failed: {}", e);
            return Err(MockLocationError::unavailable(ProviderStage::Remove, e));
        }
        self.state = ProviderState::Unregistered;
        tracing::info!("🧹 Test provider '{}' removed", self.name);
        Ok(())
    }

    // 註冊失敗時最多只做一次「移除後重試」
    async fn register(&mut self) -> Result<(), PlatformError> {
        match self
            .platform
            .add_test_provider(&self.name, &self.properties)
            .await
        {
            Ok(()) => {
                self.state = ProviderState::RegisteredDisabled;
                tracing::debug!("Test provider '{}' added", self.name);
                return Ok(());
            }
            Err(e) => {
                tracing::debug!("addTestProvider first attempt failed: {}", e);
            }
        }

        // 移除失敗不影響重試，僅記錄
        match self.platform.remove_test_provider(&self.name).await {
            Ok(()) => {
                self.state = ProviderState::Unregistered;
                tracing::debug!("Existing test provider '{}' removed", self.name);
            }
            Err(e) => {
                // 移除失敗時 OS 可能仍持有 provider，但不能再宣稱已啟用
                if self.state == ProviderState::RegisteredEnabled {
                    self.state = ProviderState::RegisteredDisabled;
                }
                tracing::debug!("removeTestProvider ignored: {}", e);
            }
        }

        match self
            .platform
            .add_test_provider(&self.name, &self.properties)
            .await
        {
            Ok(()) => {
                self.state = ProviderState::RegisteredDisabled;
                tracing::debug!("Test provider '{}' added after reset", self.name);
                Ok(())
            }
            Err(e) => {
                tracing::error!("❌ addTestProvider second attempt failed: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{Fault, SimulatedLocationManager};
    use crate::domain::model::GPS_PROVIDER;

    #[tokio::test]
    async fn test_first_call_enables_provider() {
        let manager = SimulatedLocationManager::new();
        let mut provider = MockLocationProvider::new(manager.clone(), GPS_PROVIDER);

        let fix = provider.set_mock_location(37.7749, -122.4194).await.unwrap();

        assert_eq!(provider.state(), ProviderState::RegisteredEnabled);
        assert_eq!(fix.accuracy, 5.0);
        let stored = manager.current_fix(GPS_PROVIDER).unwrap();
        assert_eq!(stored.latitude, 37.7749);
        assert_eq!(stored.longitude, -122.4194);
        assert_eq!(stored.accuracy, 5.0);
    }

    #[tokio::test]
    async fn test_second_call_goes_through_recovery() {
        let manager = SimulatedLocationManager::new();
        let mut provider = MockLocationProvider::new(manager.clone(), GPS_PROVIDER);

        provider.set_mock_location(10.0, 20.0).await.unwrap();
        provider.set_mock_location(11.0, 21.0).await.unwrap();

        assert_eq!(provider.state(), ProviderState::RegisteredEnabled);
        assert_eq!(manager.current_fix(GPS_PROVIDER).unwrap().latitude, 11.0);
        assert_eq!(manager.calls_named("remove_test_provider"), 1);
        assert_eq!(manager.calls_named("add_test_provider"), 3);
    }

    #[tokio::test]
    async fn test_remove_failure_during_recovery_is_ignored() {
        let manager = SimulatedLocationManager::new();
        manager.inject(Fault::AddTestProvider { times: 1 });
        manager.inject(Fault::RemoveTestProvider { times: 1 });
        let mut provider = MockLocationProvider::new(manager.clone(), GPS_PROVIDER);

        provider.set_mock_location(1.0, 2.0).await.unwrap();

        assert_eq!(provider.state(), ProviderState::RegisteredEnabled);
    }

    #[tokio::test]
    async fn test_double_registration_failure() {
        let manager = SimulatedLocationManager::new();
        manager.inject(Fault::AddTestProvider { times: 2 });
        let mut provider = MockLocationProvider::new(manager.clone(), GPS_PROVIDER);

        let err = provider.set_mock_location(1.0, 2.0).await.unwrap_err();

        assert_eq!(err.stage(), ProviderStage::Register);
        assert_ne!(provider.state(), ProviderState::RegisteredEnabled);
        assert_eq!(manager.calls_named("add_test_provider"), 2);
        assert_eq!(manager.calls_named("set_test_provider_enabled"), 0);
    }

    #[tokio::test]
    async fn test_enable_failure_pushes_nothing() {
        let manager = SimulatedLocationManager::new();
        manager.inject(Fault::SetTestProviderEnabled { times: 1 });
        let mut provider = MockLocationProvider::new(manager.clone(), GPS_PROVIDER);

        let err = provider.set_mock_location(1.0, 2.0).await.unwrap_err();

        assert_eq!(err.stage(), ProviderStage::Enable);
        assert_eq!(provider.state(), ProviderState::RegisteredDisabled);
        assert_eq!(manager.calls_named("set_test_provider_location"), 0);
        assert!(manager.current_fix(GPS_PROVIDER).is_none());
    }

    #[tokio::test]
    async fn test_push_failure_is_reported() {
        let manager = SimulatedLocationManager::new();
        manager.inject(Fault::SetTestProviderLocation { times: 1 });
        let mut provider = MockLocationProvider::new(manager.clone(), GPS_PROVIDER);

        let err = provider.set_mock_location(1.0, 2.0).await.unwrap_err();

        assert_eq!(err.stage(), ProviderStage::PushLocation);
        assert_eq!(provider.state(), ProviderState::RegisteredEnabled);
        assert!(manager.is_enabled(GPS_PROVIDER));
        assert!(manager.current_fix(GPS_PROVIDER).is_none());
    }

    #[tokio::test]
    async fn test_failed_recovery_removal_keeps_provider_state() {
        let manager = SimulatedLocationManager::new();
        let mut provider = MockLocationProvider::new(manager.clone(), GPS_PROVIDER);
        provider.set_mock_location(1.0, 2.0).await.unwrap();

        // 既有 provider 無法移除，第二次註冊也會失敗
        manager.inject(Fault::RemoveTestProvider { times: 1 });
        let err = provider.set_mock_location(3.0, 4.0).await.unwrap_err();

        assert_eq!(err.stage(), ProviderStage::Register);
        assert_eq!(provider.state(), ProviderState::RegisteredDisabled);
        assert!(manager.is_registered(GPS_PROVIDER));
    }

    #[tokio::test]
    async fn test_remove_on_fresh_handle_is_noop() {
        let manager = SimulatedLocationManager::new();
        let mut provider = MockLocationProvider::new(manager.clone(), GPS_PROVIDER);

        provider.remove().await.unwrap();

        assert_eq!(provider.state(), ProviderState::Unregistered);
        assert_eq!(manager.calls_named("remove_test_provider"), 1);
    }

    #[tokio::test]
    async fn test_remove_failure_after_registration_is_reported() {
        let manager = SimulatedLocationManager::new();
        let mut provider = MockLocationProvider::new(manager.clone(), GPS_PROVIDER);
        provider.set_mock_location(1.0, 2.0).await.unwrap();
        manager.inject(Fault::RemoveTestProvider { times: 1 });

        let err = provider.remove().await.unwrap_err();

        assert_eq!(err.stage(), ProviderStage::Remove);
        assert_eq!(provider.state(), ProviderState::RegisteredEnabled);
    }

    #[tokio::test]
    async fn test_remove_resets_state() {
        let manager = SimulatedLocationManager::new();
        let mut provider = MockLocationProvider::new(manager.clone(), GPS_PROVIDER);

        provider.set_mock_location(1.0, 2.0).await.unwrap();
        provider.remove().await.unwrap();

        assert_eq!(provider.state(), ProviderState::Unregistered);
        assert!(!manager.is_registered(GPS_PROVIDER));
    }
}
