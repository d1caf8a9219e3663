pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::adb::{AdbDevice, AdbForegroundService, AdbTestProvider};
pub use adapters::http::HttpLocationReporter;
pub use adapters::memory::{SimulatedLocationManager, SimulatedNotificationManager};
pub use config::BridgeConfig;
pub use crate::core::{
    bridge::{ApplyOutcome, MockLocationBridge},
    notification::StatusNotifier,
    provider::MockLocationProvider,
};
pub use utils::error::{BridgeError, MockLocationError, NotificationError, Result};
