use std::fmt;
use thiserror::Error;

/// 平台呼叫失敗（adb、JNI 或模擬器回報的錯誤）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed: {message}")]
pub struct PlatformError {
    pub operation: String,
    pub message: String,
}

impl PlatformError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// Step of `set_mock_location` that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStage {
    Register,
    Enable,
    PushLocation,
    Remove,
}

impl fmt::Display for ProviderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderStage::Register => "register",
            ProviderStage::Enable => "enable",
            ProviderStage::PushLocation => "push location",
            ProviderStage::Remove => "remove",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MockLocationError {
    #[error("Test provider unavailable at {stage} step: {message}")]
    ProviderUnavailable {
        stage: ProviderStage,
        message: String,
    },
}

impl MockLocationError {
    pub(crate) fn unavailable(stage: ProviderStage, source: PlatformError) -> Self {
        MockLocationError::ProviderUnavailable {
            stage,
            message: source.message,
        }
    }

    pub fn stage(&self) -> ProviderStage {
        match self {
            MockLocationError::ProviderUnavailable { stage, .. } => *stage,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Notification channel setup failed: {message}")]
    Channel { message: String },

    #[error("Foreground service was not granted: {message}")]
    ForegroundDenied { message: String },

    #[error("Status service could not be stopped: {message}")]
    Stop { message: String },
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error(transparent)]
    MockLocation(#[from] MockLocationError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    ApiStatusError { status: u16, body: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Device,
    Notification,
    Network,
    Configuration,
    Input,
    System,
}

impl BridgeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BridgeError::MockLocation(_) | BridgeError::Platform(_) => ErrorCategory::Device,
            BridgeError::Notification(_) => ErrorCategory::Notification,
            BridgeError::ApiError(_) | BridgeError::ApiStatusError { .. } => {
                ErrorCategory::Network
            }
            BridgeError::ConfigError { .. }
            | BridgeError::InvalidConfigValueError { .. }
            | BridgeError::MissingConfigError { .. } => ErrorCategory::Configuration,
            BridgeError::ValidationError { .. } => ErrorCategory::Input,
            BridgeError::IoError(_) | BridgeError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BridgeError::MockLocation(_) => {
                "Select this app as the mock location app in Developer options and try again"
            }
            BridgeError::Notification(_) => {
                "Grant the notification permission; the location itself was still applied"
            }
            BridgeError::Platform(_) => "Check that the device is connected (`adb devices`)",
            BridgeError::ApiError(_) | BridgeError::ApiStatusError { .. } => {
                "Check the backend endpoint and API token"
            }
            BridgeError::ConfigError { .. }
            | BridgeError::InvalidConfigValueError { .. }
            | BridgeError::MissingConfigError { .. } => "Fix the configuration file or CLI flags",
            BridgeError::ValidationError { .. } => {
                "Latitude must be within [-90, 90] and longitude within [-180, 180]"
            }
            BridgeError::IoError(_) | BridgeError::SerializationError(_) => {
                "Check file permissions and that `adb` is on PATH"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BridgeError::MockLocation(MockLocationError::ProviderUnavailable { .. }) => {
                format!("Mock location not set properly. {}", self)
            }
            BridgeError::Notification(_) => format!("Status notification unavailable. {}", self),
            BridgeError::ApiStatusError { status, .. } => {
                format!("Backend rejected the location report (HTTP {})", status)
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_keeps_platform_message() {
        let err = MockLocationError::unavailable(
            ProviderStage::Enable,
            PlatformError::new("setTestProviderEnabled", "not allowed to mock"),
        );

        assert_eq!(err.stage(), ProviderStage::Enable);
        assert!(err.to_string().contains("not allowed to mock"));
        assert!(err.to_string().contains("enable"));
    }

    #[test]
    fn test_categories() {
        let err: BridgeError = NotificationError::Channel {
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Notification);

        let err = BridgeError::ValidationError {
            message: "latitude".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
    }
}
