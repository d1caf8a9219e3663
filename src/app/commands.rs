use crate::core::bridge::MockLocationBridge;
use crate::core::{ForegroundPlatform, MockFix, TestProviderPlatform};
use crate::domain::model::{LocationData, LocationResponse};
use crate::domain::ports::LocationReporter;
use crate::utils::error::{NotificationError, Result};
use crate::utils::validation::validate_coordinates;

#[derive(Debug)]
pub struct SetOutcome {
    pub fix: MockFix,
    /// `None` when the notification was skipped.
    pub notification: Option<std::result::Result<(), NotificationError>>,
}

/// Validates the coordinates, then sets the location (and, unless `notify`
/// is false, the status notification alongside it).
pub async fn run_set<P, F>(
    bridge: &mut MockLocationBridge<P, F>,
    latitude: f64,
    longitude: f64,
    notify: bool,
) -> Result<SetOutcome>
where
    P: TestProviderPlatform,
    F: ForegroundPlatform,
{
    validate_coordinates(latitude, longitude)?;

    if !notify {
        let fix = bridge.set_mock_location(latitude, longitude).await?;
        return Ok(SetOutcome {
            fix,
            notification: None,
        });
    }

    let outcome = bridge.apply(latitude, longitude).await;
    let fix = outcome.location?;
    Ok(SetOutcome {
        fix,
        notification: Some(outcome.notification),
    })
}

pub async fn run_notify<P, F>(
    bridge: &mut MockLocationBridge<P, F>,
    latitude: f64,
    longitude: f64,
) -> Result<()>
where
    P: TestProviderPlatform,
    F: ForegroundPlatform,
{
    validate_coordinates(latitude, longitude)?;
    bridge
        .start_status_notification(latitude, longitude)
        .await?;
    Ok(())
}

pub async fn run_clear<P, F>(bridge: &mut MockLocationBridge<P, F>) -> Result<()>
where
    P: TestProviderPlatform,
    F: ForegroundPlatform,
{
    bridge.clear().await
}

pub async fn run_report<R: LocationReporter>(
    reporter: &R,
    latitude: f64,
    longitude: f64,
) -> Result<LocationResponse> {
    validate_coordinates(latitude, longitude)?;
    reporter
        .report(&LocationData {
            latitude,
            longitude,
        })
        .await
}
