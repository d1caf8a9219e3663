use clap::Parser;
use mock_location_bridge::app::commands;
use mock_location_bridge::config::Command;
use mock_location_bridge::core::{ForegroundPlatform, TestProviderPlatform};
use mock_location_bridge::domain::ports::ConfigProvider;
use mock_location_bridge::utils::error::ErrorCategory;
use mock_location_bridge::utils::logger;
use mock_location_bridge::{
    AdbDevice, AdbForegroundService, AdbTestProvider, BridgeConfig, BridgeError, CliConfig,
    HttpLocationReporter, MockLocationBridge, MockLocationProvider, SimulatedLocationManager,
    SimulatedNotificationManager, StatusNotifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    let result = if cli.simulate {
        tracing::info!("🧪 Using simulated device");
        let bridge = build_bridge(
            SimulatedLocationManager::new(),
            SimulatedNotificationManager::new(),
            &config,
        );
        dispatch(&cli, &config, bridge).await
    } else {
        let device = AdbDevice::from_config(&config);
        let bridge = build_bridge(
            AdbTestProvider::new(device.clone()),
            AdbForegroundService::new(device, config.service_component()),
            &config,
        );
        dispatch(&cli, &config, bridge).await
    };

    if let Err(e) = result {
        exit_with(&e);
    }
    Ok(())
}

fn build_bridge<P, F>(platform: P, foreground: F, config: &BridgeConfig) -> MockLocationBridge<P, F>
where
    P: TestProviderPlatform,
    F: ForegroundPlatform,
{
    MockLocationBridge::new(
        MockLocationProvider::new(platform, config.provider_name()),
        StatusNotifier::with_channel(foreground, config.notification_channel()),
    )
}

async fn dispatch<P, F>(
    cli: &CliConfig,
    config: &BridgeConfig,
    mut bridge: MockLocationBridge<P, F>,
) -> mock_location_bridge::Result<()>
where
    P: TestProviderPlatform,
    F: ForegroundPlatform,
{
    match &cli.command {
        Command::Set {
            coordinates,
            no_notify,
            report,
        } => {
            let outcome =
                commands::run_set(&mut bridge, coordinates.lat, coordinates.lng, !no_notify)
                    .await?;
            println!(
                "✅ Mock location set: {}, {} (accuracy {})",
                outcome.fix.latitude, outcome.fix.longitude, outcome.fix.accuracy
            );
            if let Some(Err(e)) = &outcome.notification {
                eprintln!("⚠️ Status notification unavailable: {}", e);
            }

            if *report {
                let reporter = HttpLocationReporter::from_config(config)?;
                let response =
                    commands::run_report(&reporter, coordinates.lat, coordinates.lng).await?;
                print_report(response.success, response.message.as_deref());
            }
        }
        Command::Notify { coordinates } => {
            commands::run_notify(&mut bridge, coordinates.lat, coordinates.lng).await?;
            println!("🔔 Status notification updated");
        }
        Command::Clear => {
            commands::run_clear(&mut bridge).await?;
            println!("🧹 Mock location cleared");
        }
        Command::Report { coordinates } => {
            let reporter = HttpLocationReporter::from_config(config)?;
            let response =
                commands::run_report(&reporter, coordinates.lat, coordinates.lng).await?;
            print_report(response.success, response.message.as_deref());
        }
    }
    Ok(())
}

fn print_report(success: bool, message: Option<&str>) {
    match (success, message) {
        (true, _) => println!("📤 Location sent!"),
        (false, Some(message)) => eprintln!("⚠️ Backend did not accept location: {}", message),
        (false, None) => eprintln!("⚠️ Backend did not accept location"),
    }
}

fn exit_with(e: &BridgeError) -> ! {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 依錯誤類別決定退出碼
    let exit_code = match e.category() {
        ErrorCategory::Input | ErrorCategory::Configuration => 2,
        ErrorCategory::Device => 3,
        ErrorCategory::Notification => 4,
        ErrorCategory::Network => 5,
        ErrorCategory::System => 1,
    };
    std::process::exit(exit_code);
}
