use crate::config::toml_config::BridgeConfig;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "mockloc")]
#[command(about = "Set an Android device's mock GPS location")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Device serial passed to `adb -s`
    #[arg(long, global = true)]
    pub serial: Option<String>,

    /// Path to the adb binary
    #[arg(long, global = true)]
    pub adb: Option<String>,

    /// Run against an in-process simulated device instead of adb
    #[arg(long, global = true)]
    pub simulate: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct CoordinateArgs {
    /// Latitude in degrees, -90 to 90
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in degrees, -180 to 180
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Push a mock location through the test provider
    Set {
        #[command(flatten)]
        coordinates: CoordinateArgs,

        /// Skip the foreground status notification
        #[arg(long)]
        no_notify: bool,

        /// Also report the coordinates to the backend
        #[arg(long)]
        report: bool,
    },
    /// Start or refresh the status notification only
    Notify {
        #[command(flatten)]
        coordinates: CoordinateArgs,
    },
    /// Remove the test provider and stop the status service
    Clear,
    /// Report coordinates to the backend without touching the device
    Report {
        #[command(flatten)]
        coordinates: CoordinateArgs,
    },
}

impl CliConfig {
    /// Loads the config file (or defaults), then applies CLI overrides.
    pub fn load_config(&self) -> Result<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                BridgeConfig::from_file(path)?
            }
            None => BridgeConfig::default(),
        };

        // 命令列參數優先於設定檔
        if let Some(serial) = &self.serial {
            config.device.serial = Some(serial.clone());
        }
        if let Some(adb) = &self.adb {
            config.device.adb_path = adb.clone();
        }
        config.resolve_token_from_env();

        config.validate()?;
        Ok(config)
    }
}
