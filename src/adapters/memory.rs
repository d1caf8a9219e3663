//! In-process stand-ins for the Android location and notification managers.
//!
//! They follow the platform's observable behaviour closely enough to drive
//! the core logic without a device: registering a provider that already
//! exists fails, removing an unknown provider fails, and only an enabled
//! provider serves its last fix. Faults can be injected per operation.
//! Used by the test suite and by `mockloc --simulate`.

use crate::domain::model::{MockFix, NotificationChannel, ProviderProperties, StatusNotification};
use crate::domain::ports::{ForegroundPlatform, TestProviderPlatform};
use crate::utils::error::{PlatformError, PlatformResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Forces the next `times` calls of one operation to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    AddTestProvider { times: u32 },
    RemoveTestProvider { times: u32 },
    SetTestProviderEnabled { times: u32 },
    SetTestProviderLocation { times: u32 },
}

impl Fault {
    fn split(self) -> (&'static str, u32) {
        match self {
            Fault::AddTestProvider { times } => ("add_test_provider", times),
            Fault::RemoveTestProvider { times } => ("remove_test_provider", times),
            Fault::SetTestProviderEnabled { times } => ("set_test_provider_enabled", times),
            Fault::SetTestProviderLocation { times } => ("set_test_provider_location", times),
        }
    }
}

#[derive(Debug, Default)]
struct TestProviderEntry {
    enabled: bool,
    location: Option<MockFix>,
}

#[derive(Debug, Default)]
struct LocationInner {
    providers: HashMap<String, TestProviderEntry>,
    faults: HashMap<&'static str, u32>,
    calls: Vec<String>,
}

impl LocationInner {
    // 記錄呼叫並檢查是否要注入錯誤
    fn enter(&mut self, operation: &'static str, provider: &str) -> PlatformResult<()> {
        self.calls.push(operation.to_string());
        if let Some(remaining) = self.faults.get_mut(operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(PlatformError::new(
                    operation,
                    format!("simulated failure for provider \"{}\"", provider),
                ));
            }
        }
        Ok(())
    }

    fn entry_mut(
        &mut self,
        operation: &'static str,
        provider: &str,
    ) -> PlatformResult<&mut TestProviderEntry> {
        self.providers.get_mut(provider).ok_or_else(|| {
            PlatformError::new(
                operation,
                format!("Provider \"{}\" unknown", provider),
            )
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedLocationManager {
    inner: Arc<Mutex<LocationInner>>,
}

impl SimulatedLocationManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LocationInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn inject(&self, fault: Fault) {
        let (operation, times) = fault.split();
        *self.lock().faults.entry(operation).or_insert(0) += times;
    }

    /// Last fix served by `provider`, if it is registered and enabled.
    pub fn current_fix(&self, provider: &str) -> Option<MockFix> {
        let inner = self.lock();
        inner
            .providers
            .get(provider)
            .filter(|entry| entry.enabled)
            .and_then(|entry| entry.location.clone())
    }

    pub fn is_registered(&self, provider: &str) -> bool {
        self.lock().providers.contains_key(provider)
    }

    pub fn is_enabled(&self, provider: &str) -> bool {
        self.lock()
            .providers
            .get(provider)
            .map(|entry| entry.enabled)
            .unwrap_or(false)
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn calls_named(&self, operation: &str) -> usize {
        self.lock().calls.iter().filter(|c| *c == operation).count()
    }
}

#[async_trait]
impl TestProviderPlatform for SimulatedLocationManager {
    async fn add_test_provider(
        &self,
        provider: &str,
        _properties: &ProviderProperties,
    ) -> PlatformResult<()> {
        let mut inner = self.lock();
        inner.enter("add_test_provider", provider)?;
        if inner.providers.contains_key(provider) {
            return Err(PlatformError::new(
                "add_test_provider",
                format!("Provider \"{}\" already exists", provider),
            ));
        }
        inner
            .providers
            .insert(provider.to_string(), TestProviderEntry::default());
        Ok(())
    }

    async fn remove_test_provider(&self, provider: &str) -> PlatformResult<()> {
        let mut inner = self.lock();
        inner.enter("remove_test_provider", provider)?;
        inner
            .providers
            .remove(provider)
            .map(|_| ())
            .ok_or_else(|| {
                PlatformError::new(
                    "remove_test_provider",
                    format!("Provider \"{}\" unknown", provider),
                )
            })
    }

    async fn set_test_provider_enabled(
        &self,
        provider: &str,
        enabled: bool,
    ) -> PlatformResult<()> {
        let mut inner = self.lock();
        inner.enter("set_test_provider_enabled", provider)?;
        inner
            .entry_mut("set_test_provider_enabled", provider)?
            .enabled = enabled;
        Ok(())
    }

    async fn set_test_provider_location(
        &self,
        provider: &str,
        fix: &MockFix,
    ) -> PlatformResult<()> {
        let mut inner = self.lock();
        inner.enter("set_test_provider_location", provider)?;
        inner
            .entry_mut("set_test_provider_location", provider)?
            .location = Some(fix.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct NotificationInner {
    channels: HashMap<String, NotificationChannel>,
    foreground: Option<StatusNotification>,
    deny_foreground: bool,
    fail_channel: bool,
    fail_stop: bool,
    create_channel_calls: usize,
    stop_calls: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedNotificationManager {
    inner: Arc<Mutex<NotificationInner>>,
}

impl SimulatedNotificationManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, NotificationInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulates a missing notification permission.
    pub fn deny_foreground(&self, deny: bool) {
        self.lock().deny_foreground = deny;
    }

    pub fn fail_channel(&self, fail: bool) {
        self.lock().fail_channel = fail;
    }

    pub fn fail_stop(&self, fail: bool) {
        self.lock().fail_stop = fail;
    }

    pub fn foreground_notification(&self) -> Option<StatusNotification> {
        self.lock().foreground.clone()
    }

    pub fn has_channel(&self, id: &str) -> bool {
        self.lock().channels.contains_key(id)
    }

    pub fn channel_count(&self) -> usize {
        self.lock().channels.len()
    }

    pub fn create_channel_calls(&self) -> usize {
        self.lock().create_channel_calls
    }

    pub fn stop_calls(&self) -> usize {
        self.lock().stop_calls
    }
}

#[async_trait]
impl ForegroundPlatform for SimulatedNotificationManager {
    async fn create_channel(&self, channel: &NotificationChannel) -> PlatformResult<()> {
        let mut inner = self.lock();
        inner.create_channel_calls += 1;
        if inner.fail_channel {
            return Err(PlatformError::new(
                "create_channel",
                "simulated NotificationManager failure",
            ));
        }
        inner
            .channels
            .entry(channel.id.clone())
            .or_insert_with(|| channel.clone());
        Ok(())
    }

    async fn start_foreground(&self, notification: &StatusNotification) -> PlatformResult<()> {
        let mut inner = self.lock();
        if !inner.channels.contains_key(&notification.channel_id) {
            return Err(PlatformError::new(
                "start_foreground",
                format!("Bad notification: no channel \"{}\"", notification.channel_id),
            ));
        }
        if inner.deny_foreground {
            return Err(PlatformError::new(
                "start_foreground",
                "startForeground not allowed: POST_NOTIFICATIONS not granted",
            ));
        }
        inner.foreground = Some(notification.clone());
        Ok(())
    }

    async fn stop_self(&self) -> PlatformResult<()> {
        let mut inner = self.lock();
        inner.stop_calls += 1;
        if inner.fail_stop {
            return Err(PlatformError::new("stop_self", "simulated stopService failure"));
        }
        inner.foreground = None;
        Ok(())
    }
}
