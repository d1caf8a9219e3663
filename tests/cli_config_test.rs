#![cfg(feature = "cli")]

use clap::Parser;
use mock_location_bridge::config::Command;
use mock_location_bridge::domain::ports::ConfigProvider;
use mock_location_bridge::{BridgeError, CliConfig};
use std::io::Write;
use tempfile::NamedTempFile;

fn config_file(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file
}

#[test]
fn test_cli_flags_override_file() {
    let file = config_file(
        r#"
[device]
adb_path = "/opt/adb"
serial = "from-file"
service_component = "com.acme.mock/.StatusService"

[notification]
channel_id = "acme_status"
channel_name = "Acme status"
"#,
    );
    let path = file.path().to_str().unwrap();

    let cli = CliConfig::try_parse_from([
        "mockloc", "--config", path, "--serial", "from-cli", "notify", "--lat", "1", "--lng",
        "-2",
    ])
    .unwrap();
    let config = cli.load_config().unwrap();

    assert_eq!(config.device_serial(), Some("from-cli"));
    assert_eq!(config.adb_path(), "/opt/adb");
    assert_eq!(config.service_component(), "com.acme.mock/.StatusService");
    assert_eq!(config.notification_channel().id, "acme_status");
    assert!(matches!(cli.command, Command::Notify { .. }));
}

#[test]
fn test_invalid_file_is_rejected() {
    let file = config_file(
        r#"
[backend]
endpoint = "ftp://example.com"
"#,
    );
    let path = file.path().to_str().unwrap();

    let cli = CliConfig::try_parse_from(["mockloc", "-c", path, "clear"]).unwrap();
    let err = cli.load_config().unwrap_err();

    assert!(matches!(err, BridgeError::InvalidConfigValueError { .. }));
}

#[test]
fn test_missing_file_is_io_error() {
    let cli = CliConfig::try_parse_from([
        "mockloc",
        "--config",
        "/nonexistent/mockloc.toml",
        "clear",
    ])
    .unwrap();

    assert!(matches!(cli.load_config(), Err(BridgeError::IoError(_))));
}

#[test]
fn test_set_requires_both_coordinates() {
    assert!(CliConfig::try_parse_from(["mockloc", "set", "--lat", "1.0"]).is_err());
}
