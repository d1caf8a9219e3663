//! Device backend over `adb shell`.
//!
//! Test-provider calls map onto `cmd location providers ...` (Android 12+).
//! The status service is an on-device `Service` started with
//! `am start-foreground-service`; it owns its notification channel and
//! builds the notification from the `model::extra` intent extras (see the
//! `LocationForegroundService` entry points in `adapters::android`).

use crate::domain::model::{
    extra, MockFix, NotificationChannel, ProviderProperties, StatusNotification,
};
use crate::domain::ports::{ConfigProvider, ForegroundPlatform, TestProviderPlatform};
use crate::utils::error::{PlatformError, PlatformResult};
use async_trait::async_trait;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct AdbDevice {
    adb_path: String,
    serial: Option<String>,
}

impl AdbDevice {
    pub fn new(adb_path: impl Into<String>, serial: Option<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
            serial,
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(
            config.adb_path(),
            config.device_serial().map(str::to_string),
        )
    }

    fn command_args(&self, remote: &[String]) -> Vec<String> {
        let mut args = Vec::with_capacity(remote.len() + 3);
        if let Some(serial) = &self.serial {
            args.push("-s".to_string());
            args.push(serial.clone());
        }
        args.push("shell".to_string());
        args.extend(remote.iter().cloned());
        args
    }

    /// Runs one remote command and returns its stdout.
    pub async fn shell(&self, operation: &str, remote: &[String]) -> PlatformResult<String> {
        let args = self.command_args(remote);
        tracing::debug!("{} {}", self.adb_path, args.join(" "));

        let output = Command::new(&self.adb_path)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                PlatformError::new(operation, format!("failed to run {}: {}", self.adb_path, e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        check_output(operation, output.status.success(), &stdout, &stderr)?;
        Ok(stdout)
    }
}

/// `cmd` and `am` sometimes exit 0 while printing an exception, so the
/// output is inspected as well as the exit status.
fn check_output(operation: &str, success: bool, stdout: &str, stderr: &str) -> PlatformResult<()> {
    let reported = stdout
        .lines()
        .chain(stderr.lines())
        .map(str::trim)
        .find(|line| line.starts_with("Error") || line.contains("Exception"));

    match (success, reported) {
        (true, None) => Ok(()),
        (_, Some(line)) => Err(PlatformError::new(operation, line)),
        (false, None) => {
            let message = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            Err(PlatformError::new(operation, message))
        }
    }
}

// adb shell 會把參數以空白串接後交給遠端 shell，需要自行加引號
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn location_cmd(args: &[&str]) -> Vec<String> {
    ["cmd", "location", "providers"]
        .iter()
        .chain(args.iter())
        .map(|s| s.to_string())
        .collect()
}

fn add_provider_args(provider: &str, properties: &ProviderProperties) -> Vec<String> {
    let mut args = location_cmd(&["add-test-provider", &shell_quote(provider)]);
    let flags = [
        (properties.requires_network, "--requiresNetwork"),
        (properties.requires_satellite, "--requiresSatellite"),
        (properties.requires_cell, "--requiresCell"),
        (properties.has_monetary_cost, "--hasMonetaryCost"),
        (properties.supports_altitude, "--supportsAltitude"),
        (properties.supports_speed, "--supportsSpeed"),
        (properties.supports_bearing, "--supportsBearing"),
    ];
    args.extend(
        flags
            .iter()
            .filter(|(enabled, _)| *enabled)
            .map(|(_, flag)| flag.to_string()),
    );
    args.push("--powerRequirement".to_string());
    args.push((properties.power_requirement as i32).to_string());
    args
}

fn set_location_args(provider: &str, fix: &MockFix) -> Vec<String> {
    let mut args = location_cmd(&["set-test-provider-location", &shell_quote(provider)]);
    args.extend([
        "--location".to_string(),
        format!("{},{}", fix.latitude, fix.longitude),
        "--accuracy".to_string(),
        fix.accuracy.to_string(),
        "--time".to_string(),
        fix.timestamp.timestamp_millis().to_string(),
    ]);
    args
}

/// `LocationManager` test-provider calls through `adb`.
#[derive(Debug, Clone)]
pub struct AdbTestProvider {
    device: AdbDevice,
}

impl AdbTestProvider {
    pub fn new(device: AdbDevice) -> Self {
        Self { device }
    }
}

#[async_trait]
impl TestProviderPlatform for AdbTestProvider {
    async fn add_test_provider(
        &self,
        provider: &str,
        properties: &ProviderProperties,
    ) -> PlatformResult<()> {
        self.device
            .shell("addTestProvider", &add_provider_args(provider, properties))
            .await
            .map(|_| ())
    }

    async fn remove_test_provider(&self, provider: &str) -> PlatformResult<()> {
        self.device
            .shell(
                "removeTestProvider",
                &location_cmd(&["remove-test-provider", &shell_quote(provider)]),
            )
            .await
            .map(|_| ())
    }

    async fn set_test_provider_enabled(
        &self,
        provider: &str,
        enabled: bool,
    ) -> PlatformResult<()> {
        let enabled = if enabled { "true" } else { "false" };
        self.device
            .shell(
                "setTestProviderEnabled",
                &location_cmd(&["set-test-provider-enabled", &shell_quote(provider), enabled]),
            )
            .await
            .map(|_| ())
    }

    async fn set_test_provider_location(
        &self,
        provider: &str,
        fix: &MockFix,
    ) -> PlatformResult<()> {
        self.device
            .shell("setTestProviderLocation", &set_location_args(provider, fix))
            .await
            .map(|_| ())
    }
}

/// Starts and stops the on-device status service.
#[derive(Debug, Clone)]
pub struct AdbForegroundService {
    device: AdbDevice,
    component: String,
}

impl AdbForegroundService {
    pub fn new(device: AdbDevice, component: impl Into<String>) -> Self {
        Self {
            device,
            component: component.into(),
        }
    }

    fn start_args(&self, notification: &StatusNotification) -> Vec<String> {
        let mut args = vec![
            "am".to_string(),
            "start-foreground-service".to_string(),
            "-n".to_string(),
            self.component.clone(),
        ];
        let extras = [
            ("--ed", extra::LATITUDE, notification.latitude.to_string()),
            ("--ed", extra::LONGITUDE, notification.longitude.to_string()),
            ("--ei", extra::NOTIFICATION_ID, notification.id.to_string()),
            ("--es", extra::CHANNEL_ID, shell_quote(&notification.channel_id)),
            ("--es", extra::TITLE, shell_quote(&notification.title)),
            ("--es", extra::TEXT, shell_quote(&notification.text)),
            ("--ez", extra::ONGOING, notification.ongoing.to_string()),
            ("--ez", extra::ONLY_ALERT_ONCE, notification.only_alert_once.to_string()),
            ("--ez", extra::AUTO_CANCEL, notification.auto_cancel.to_string()),
        ];
        for (kind, key, value) in extras {
            args.push(kind.to_string());
            args.push(key.to_string());
            args.push(value);
        }
        args
    }
}

#[async_trait]
impl ForegroundPlatform for AdbForegroundService {
    async fn create_channel(&self, channel: &NotificationChannel) -> PlatformResult<()> {
        // 頻道由裝置端服務在 onCreate 建立
        tracing::debug!("Channel '{}' is created by {}", channel.id, self.component);
        Ok(())
    }

    async fn start_foreground(&self, notification: &StatusNotification) -> PlatformResult<()> {
        self.device
            .shell("startForegroundService", &self.start_args(notification))
            .await
            .map(|_| ())
    }

    async fn stop_self(&self) -> PlatformResult<()> {
        let args = vec![
            "am".to_string(),
            "stopservice".to_string(),
            "-n".to_string(),
            self.component.clone(),
        ];
        self.device.shell("stopService", &args).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_is_passed_before_shell() {
        let device = AdbDevice::new("adb", Some("emulator-5554".to_string()));
        let args = device.command_args(&["id".to_string()]);
        assert_eq!(args, vec!["-s", "emulator-5554", "shell", "id"]);
    }

    #[test]
    fn test_add_provider_flags() {
        let args = add_provider_args("gps", &ProviderProperties::default());
        assert_eq!(
            args,
            vec![
                "cmd",
                "location",
                "providers",
                "add-test-provider",
                "'gps'",
                "--supportsAltitude",
                "--supportsSpeed",
                "--supportsBearing",
                "--powerRequirement",
                "0",
            ]
        );
    }

    #[test]
    fn test_set_location_args() {
        let fix = MockFix::now(37.7749, -122.4194);
        let args = set_location_args("gps", &fix);
        assert_eq!(args[4], "'gps'");
        assert_eq!(args[5], "--location");
        assert_eq!(args[6], "37.7749,-122.4194");
        assert_eq!(args[8], "5");
    }

    #[test]
    fn test_start_args_carry_notification_flags() {
        let service = AdbForegroundService::new(
            AdbDevice::new("adb", None),
            "com.example.mocklocation/.LocationForegroundService",
        );
        let notification =
            StatusNotification::for_coordinates(&NotificationChannel::default(), 1.5, 2.5);

        let args = service.start_args(&notification);
        let joined = args.join(" ");

        assert_eq!(args[1], "start-foreground-service");
        assert!(joined.contains("--ed latitude 1.5"));
        assert!(joined.contains("--ei notification_id 1001"));
        assert!(joined.contains("--es title 'MockLocationApp Running'"));
        assert!(joined.contains("--ez ongoing true"));
        assert!(joined.contains("--ez only_alert_once true"));
        assert!(joined.contains("--ez auto_cancel false"));
    }

    #[test]
    fn test_check_output() {
        assert!(check_output("op", true, "", "").is_ok());

        let err = check_output(
            "op",
            true,
            "Exception occurred while executing 'add-test-provider':\njava.lang.SecurityException: not allowed",
            "",
        )
        .unwrap_err();
        assert!(err.message.contains("Exception"));

        let err = check_output("op", false, "", "error: no devices/emulators found").unwrap_err();
        assert_eq!(err.message, "error: no devices/emulators found");
    }

    #[test]
    fn test_provider_name_with_spaces_is_quoted() {
        let args = add_provider_args("test gps", &ProviderProperties::default());
        assert_eq!(args[4], "'test gps'");

        let fix = MockFix::now(1.0, 2.0);
        let args = set_location_args("it's gps", &fix);
        assert_eq!(args[4], r"'it'\''s gps'");
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("Coordinates: 1, 2"), "'Coordinates: 1, 2'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }
}
