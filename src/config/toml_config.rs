use crate::domain::model::{NotificationChannel, GPS_PROVIDER};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{BridgeError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SERVICE_COMPONENT: &str =
    "com.example.mocklocation/.LocationForegroundService";

/// Environment variable consulted when no token is configured.
pub const API_TOKEN_ENV: &str = "MOCKLOC_API_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub device: DeviceConfig,
    pub provider: ProviderConfig,
    pub notification: NotificationConfig,
    pub backend: Option<BackendConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub adb_path: String,
    pub serial: Option<String>,
    pub service_component: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adb_path: "adb".to_string(),
            serial: None,
            service_component: DEFAULT_SERVICE_COMPONENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: GPS_PROVIDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub channel_id: String,
    pub channel_name: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        let channel = NotificationChannel::default();
        Self {
            channel_id: channel.id,
            channel_name: channel.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl BridgeConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BridgeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BridgeError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MOCKLOC_API_TOKEN})；未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BridgeError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Falls back to `MOCKLOC_API_TOKEN` when the file has no usable token.
    pub fn resolve_token_from_env(&mut self) {
        if let Some(backend) = self.backend.as_mut() {
            let unresolved = backend
                .token
                .as_deref()
                .map(|t| t.trim().is_empty() || t.starts_with("${"))
                .unwrap_or(true);
            if unresolved {
                backend.token = std::env::var(API_TOKEN_ENV).ok();
            }
        }
    }
}

impl ConfigProvider for BridgeConfig {
    fn adb_path(&self) -> &str {
        &self.device.adb_path
    }

    fn device_serial(&self) -> Option<&str> {
        self.device.serial.as_deref()
    }

    fn provider_name(&self) -> &str {
        &self.provider.name
    }

    fn service_component(&self) -> &str {
        &self.device.service_component
    }

    fn notification_channel(&self) -> NotificationChannel {
        NotificationChannel {
            id: self.notification.channel_id.clone(),
            name: self.notification.channel_name.clone(),
        }
    }

    fn backend_endpoint(&self) -> Option<&str> {
        self.backend.as_ref().map(|b| b.endpoint.as_str())
    }

    fn api_token(&self) -> Option<&str> {
        self.backend
            .as_ref()
            .and_then(|b| b.token.as_deref())
            .filter(|t| !t.trim().is_empty())
    }

    fn request_timeout_seconds(&self) -> u64 {
        self.backend
            .as_ref()
            .and_then(|b| b.timeout_seconds)
            .unwrap_or(10)
    }
}

impl Validate for BridgeConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("device.adb_path", &self.device.adb_path)?;
        validation::validate_component_name(
            "device.service_component",
            &self.device.service_component,
        )?;
        validation::validate_non_empty_string("provider.name", &self.provider.name)?;
        validation::validate_non_empty_string(
            "notification.channel_id",
            &self.notification.channel_id,
        )?;

        if let Some(backend) = &self.backend {
            validation::validate_url("backend.endpoint", &backend.endpoint)?;
            if let Some(timeout) = backend.timeout_seconds {
                validation::validate_positive_number("backend.timeout_seconds", timeout, 1)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = BridgeConfig::from_toml_str("").unwrap();

        assert_eq!(config.adb_path(), "adb");
        assert_eq!(config.provider_name(), "gps");
        assert_eq!(config.notification_channel().id, "mock_location_channel");
        assert_eq!(config.backend_endpoint(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[device]
adb_path = "/opt/android/platform-tools/adb"
serial = "emulator-5554"
service_component = "com.acme.mock/.StatusService"

[provider]
name = "gps"

[notification]
channel_id = "status"
channel_name = "Status"

[backend]
endpoint = "https://api.example.com"
token = "abc123"
timeout_seconds = 5
"#;

        let config = BridgeConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.device_serial(), Some("emulator-5554"));
        assert_eq!(config.service_component(), "com.acme.mock/.StatusService");
        assert_eq!(config.backend_endpoint(), Some("https://api.example.com"));
        assert_eq!(config.api_token(), Some("abc123"));
        assert_eq!(config.request_timeout_seconds(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MOCKLOC_TEST_SERIAL", "R58M123ABC");

        let toml_content = r#"
[device]
serial = "${MOCKLOC_TEST_SERIAL}"
"#;

        let config = BridgeConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.device_serial(), Some("R58M123ABC"));

        std::env::remove_var("MOCKLOC_TEST_SERIAL");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[backend]
endpoint = "invalid-url"
"#;

        let config = BridgeConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let toml_content = r#"
[device]
service_component = "no-slash"
"#;
        let config = BridgeConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[provider]
name = "gps"

[backend]
endpoint = "http://localhost:8080"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = BridgeConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.backend_endpoint(), Some("http://localhost:8080"));
        assert_eq!(config.request_timeout_seconds(), 10);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(BridgeConfig::from_toml_str("[device\nserial = 1").is_err());
    }
}
