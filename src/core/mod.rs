pub mod bridge;
pub mod notification;
pub mod provider;

pub use crate::domain::model::{
    MockFix, NotificationChannel, ProviderProperties, ProviderState, ServiceState,
    StatusNotification,
};
pub use crate::domain::ports::{ForegroundPlatform, TestProviderPlatform};
pub use crate::utils::error::Result;
