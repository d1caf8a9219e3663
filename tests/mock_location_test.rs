use mock_location_bridge::adapters::memory::Fault;
use mock_location_bridge::app::commands;
use mock_location_bridge::domain::model::{ProviderState, ServiceState, GPS_PROVIDER};
use mock_location_bridge::utils::error::ProviderStage;
use mock_location_bridge::{
    BridgeError, MockLocationBridge, MockLocationError, MockLocationProvider,
    SimulatedLocationManager, SimulatedNotificationManager, StatusNotifier,
};

type SimulatedBridge = MockLocationBridge<SimulatedLocationManager, SimulatedNotificationManager>;

fn simulated_bridge() -> (
    SimulatedBridge,
    SimulatedLocationManager,
    SimulatedNotificationManager,
) {
    let locations = SimulatedLocationManager::new();
    let notifications = SimulatedNotificationManager::new();
    let bridge = MockLocationBridge::new(
        MockLocationProvider::new(locations.clone(), GPS_PROVIDER),
        StatusNotifier::new(notifications.clone()),
    );
    (bridge, locations, notifications)
}

#[tokio::test]
async fn test_san_francisco_fix_reads_back() {
    let (mut bridge, locations, _) = simulated_bridge();

    bridge.set_mock_location(37.7749, -122.4194).await.unwrap();

    let fix = locations.current_fix(GPS_PROVIDER).unwrap();
    assert_eq!(fix.latitude, 37.7749);
    assert_eq!(fix.longitude, -122.4194);
    assert_eq!(fix.accuracy, 5.0);
    assert_eq!(bridge.provider_state(), ProviderState::RegisteredEnabled);
    assert!(locations.is_enabled(GPS_PROVIDER));
}

#[tokio::test]
async fn test_repeated_calls_succeed_without_restart() {
    let (mut bridge, locations, _) = simulated_bridge();

    for (lat, lng) in [(22.5726, 88.3639), (51.5074, -0.1278), (-33.8688, 151.2093)] {
        bridge.set_mock_location(lat, lng).await.unwrap();
        let fix = locations.current_fix(GPS_PROVIDER).unwrap();
        assert_eq!((fix.latitude, fix.longitude), (lat, lng));
    }

    // 第一次直接註冊，其後每次都走「移除後重試」
    assert_eq!(locations.calls_named("remove_test_provider"), 2);
    assert_eq!(bridge.provider_state(), ProviderState::RegisteredEnabled);
}

#[tokio::test]
async fn test_registration_failing_twice_is_unavailable() {
    let (mut bridge, locations, _) = simulated_bridge();
    locations.inject(Fault::AddTestProvider { times: 2 });

    let err = bridge.set_mock_location(1.0, 1.0).await.unwrap_err();

    let MockLocationError::ProviderUnavailable { stage, message } = err;
    assert_eq!(stage, ProviderStage::Register);
    assert!(message.contains("simulated failure"));
    assert_ne!(bridge.provider_state(), ProviderState::RegisteredEnabled);
    assert!(!locations.is_enabled(GPS_PROVIDER));
    assert_eq!(locations.calls_named("add_test_provider"), 2);
}

#[tokio::test]
async fn test_enable_failure_skips_push() {
    let (mut bridge, locations, _) = simulated_bridge();
    locations.inject(Fault::SetTestProviderEnabled { times: 1 });

    let err = bridge.set_mock_location(1.0, 1.0).await.unwrap_err();

    assert_eq!(err.stage(), ProviderStage::Enable);
    assert_eq!(bridge.provider_state(), ProviderState::RegisteredDisabled);
    assert_eq!(
        locations.calls(),
        vec!["add_test_provider", "set_test_provider_enabled"]
    );
}

#[tokio::test]
async fn test_enable_failure_then_recovery_on_next_call() {
    let (mut bridge, locations, _) = simulated_bridge();
    locations.inject(Fault::SetTestProviderEnabled { times: 1 });

    assert!(bridge.set_mock_location(1.0, 1.0).await.is_err());
    bridge.set_mock_location(2.0, 2.0).await.unwrap();

    assert_eq!(locations.current_fix(GPS_PROVIDER).unwrap().latitude, 2.0);
}

#[tokio::test]
async fn test_notification_failure_leaves_location_untouched() {
    let (mut bridge, locations, notifications) = simulated_bridge();
    notifications.deny_foreground(true);

    let notified = bridge.start_status_notification(37.7749, -122.4194).await;
    let state_before = bridge.provider_state();
    let set = bridge.set_mock_location(37.7749, -122.4194).await;

    assert!(notified.is_err());
    assert_eq!(state_before, ProviderState::Unregistered);
    assert!(set.is_ok());
    assert_eq!(bridge.provider_state(), ProviderState::RegisteredEnabled);
    assert_eq!(bridge.service_state(), ServiceState::NotStarted);
    assert_eq!(locations.current_fix(GPS_PROVIDER).unwrap().latitude, 37.7749);
}

#[tokio::test]
async fn test_same_result_with_and_without_notification_failure() {
    let (mut ok_bridge, _, _) = simulated_bridge();
    let (mut denied_bridge, _, denied) = simulated_bridge();
    denied.deny_foreground(true);

    let ok = ok_bridge.apply(48.8566, 2.3522).await;
    let degraded = denied_bridge.apply(48.8566, 2.3522).await;

    assert!(ok.notification.is_ok());
    assert!(degraded.notification.is_err());
    assert_eq!(ok.location_applied(), degraded.location_applied());
    assert_eq!(ok_bridge.provider_state(), denied_bridge.provider_state());
}

#[tokio::test]
async fn test_set_command_reports_notification_separately() {
    let (mut bridge, _, notifications) = simulated_bridge();
    notifications.fail_channel(true);

    let outcome = commands::run_set(&mut bridge, 10.0, 20.0, true).await.unwrap();

    assert_eq!(outcome.fix.latitude, 10.0);
    assert!(matches!(outcome.notification, Some(Err(_))));
}

#[tokio::test]
async fn test_set_command_rejects_out_of_range() {
    let (mut bridge, locations, notifications) = simulated_bridge();

    let err = commands::run_set(&mut bridge, 999.0, 0.0, true)
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::ValidationError { .. }));
    assert!(locations.calls().is_empty());
    assert_eq!(notifications.create_channel_calls(), 0);
}

#[tokio::test]
async fn test_device_error_maps_to_category() {
    let (mut bridge, locations, _) = simulated_bridge();
    locations.inject(Fault::SetTestProviderLocation { times: 1 });

    let err = commands::run_set(&mut bridge, 1.0, 2.0, false)
        .await
        .unwrap_err();

    assert_eq!(
        err.category(),
        mock_location_bridge::utils::error::ErrorCategory::Device
    );
    assert!(err.user_friendly_message().contains("Mock location not set properly"));
}
