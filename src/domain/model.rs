use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accuracy attached to every injected fix, in metres.
pub const MOCK_ACCURACY: f32 = 5.0;

/// Provider name used by `LocationManager.GPS_PROVIDER`.
pub const GPS_PROVIDER: &str = "gps";

/// A single location value pushed through the test provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f32,
    pub timestamp: DateTime<Utc>,
}

impl MockFix {
    pub fn now(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: MOCK_ACCURACY,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderState {
    Unregistered,
    RegisteredDisabled,
    RegisteredEnabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerRequirement {
    NoRequirement = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderAccuracy {
    Fine = 1,
    Coarse = 2,
}

/// Capability flags passed to `addTestProvider`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProperties {
    pub requires_network: bool,
    pub requires_satellite: bool,
    pub requires_cell: bool,
    pub has_monetary_cost: bool,
    pub supports_altitude: bool,
    pub supports_speed: bool,
    pub supports_bearing: bool,
    pub power_requirement: PowerRequirement,
    pub accuracy: ProviderAccuracy,
}

impl Default for ProviderProperties {
    fn default() -> Self {
        Self {
            requires_network: false,
            requires_satellite: false,
            requires_cell: false,
            has_monetary_cost: false,
            supports_altitude: true,
            supports_speed: true,
            supports_bearing: true,
            power_requirement: PowerRequirement::NoRequirement,
            accuracy: ProviderAccuracy::Fine,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceState {
    NotStarted,
    Started,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self {
            id: "mock_location_channel".to_string(),
            name: "Mock Location Service".to_string(),
        }
    }
}

/// The ongoing notification shown while the foreground service runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusNotification {
    pub id: i32,
    pub channel_id: String,
    pub title: String,
    pub text: String,
    pub latitude: f64,
    pub longitude: f64,
    pub ongoing: bool,
    pub only_alert_once: bool,
    pub auto_cancel: bool,
}

impl StatusNotification {
    pub const DEFAULT_ID: i32 = 1001;
    /// `Notification.CATEGORY_SERVICE`
    pub const CATEGORY: &'static str = "service";

    pub fn for_coordinates(channel: &NotificationChannel, latitude: f64, longitude: f64) -> Self {
        Self {
            id: Self::DEFAULT_ID,
            channel_id: channel.id.clone(),
            title: "MockLocationApp Running".to_string(),
            text: format!("Coordinates: {}, {}", latitude, longitude),
            latitude,
            longitude,
            ongoing: true,
            only_alert_once: true,
            auto_cancel: false,
        }
    }
}

/// Intent extras the host side sends to the on-device status service.
/// Missing keys fall back to `StatusNotification::for_coordinates`.
pub mod extra {
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const NOTIFICATION_ID: &str = "notification_id";
    pub const CHANNEL_ID: &str = "channel_id";
    pub const TITLE: &str = "title";
    pub const TEXT: &str = "text";
    pub const ONGOING: &str = "ongoing";
    pub const ONLY_ALERT_ONCE: &str = "only_alert_once";
    pub const AUTO_CANCEL: &str = "auto_cancel";
}

/// Body of `POST /api/location/set`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_text_contains_coordinates() {
        let channel = NotificationChannel::default();
        let notification = StatusNotification::for_coordinates(&channel, 22.5726, 88.3639);

        assert_eq!(notification.title, "MockLocationApp Running");
        assert_eq!(notification.text, "Coordinates: 22.5726, 88.3639");
        assert_eq!(notification.channel_id, "mock_location_channel");
        assert!(notification.ongoing);
        assert!(!notification.auto_cancel);
    }

    #[test]
    fn test_location_response_without_message() {
        let response: LocationResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(response.success);
        assert_eq!(response.message, None);
    }
}
