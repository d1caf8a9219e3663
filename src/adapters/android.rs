//! On-device backend over JNI.
//!
//! `AndroidLocationManager` and `AndroidForegroundService` call the
//! framework through the `Context` handed to `nativeInit`. The exported
//! `Java_...` functions are the entry points for
//! `com.example.mocklocation.MockLocationBridge`; they block the calling
//! thread until the platform calls return.
//!
//! `com.example.mocklocation.LocationForegroundService` forwards its
//! `onCreate` and `onStartCommand` here: the channel is created, the
//! notification is built from the intent extras (`model::extra`) and the
//! service is promoted with `startForeground`, or stops itself on failure.

use crate::core::bridge::MockLocationBridge;
use crate::core::notification::StatusNotifier;
use crate::core::provider::MockLocationProvider;
use crate::domain::model::{
    extra, MockFix, NotificationChannel, ProviderProperties, StatusNotification, GPS_PROVIDER,
};
use crate::domain::ports::{ForegroundPlatform, TestProviderPlatform};
use crate::utils::error::{PlatformError, PlatformResult};
use async_trait::async_trait;
use jni::objects::{GlobalRef, JObject, JString, JValue};
use jni::sys::{jdouble, jint};
use jni::{JNIEnv, JavaVM};
use std::sync::{Arc, Mutex, PoisonError};

const SDK_O: i32 = 26;
const IMPORTANCE_DEFAULT: i32 = 3;
const PRIORITY_DEFAULT: i32 = 0;
const START_STICKY: jint = 1;
const START_NOT_STICKY: jint = 2;
const BUILDER_CLASS: &str = "android/app/Notification$Builder";
const SERVICE_CLASS: &str = "com.example.mocklocation.LocationForegroundService";

/// Shared JVM handle plus the application `Context`.
#[derive(Clone)]
pub struct AndroidContext {
    vm: Arc<JavaVM>,
    context: GlobalRef,
}

impl AndroidContext {
    pub fn new(env: &mut JNIEnv, context: &JObject) -> jni::errors::Result<Self> {
        Ok(Self {
            vm: Arc::new(env.get_java_vm()?),
            context: env.new_global_ref(context)?,
        })
    }

    fn with_env<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut JNIEnv, &JObject) -> jni::errors::Result<T>,
    ) -> PlatformResult<T> {
        let mut env = self
            .vm
            .attach_current_thread()
            .map_err(|e| PlatformError::new(operation, e.to_string()))?;
        let result = f(&mut *env, self.context.as_obj());
        result.map_err(|e| PlatformError::new(operation, take_exception(&mut *env, e)))
    }
}

// 取出並清除 Java 例外，轉成訊息字串
fn take_exception(env: &mut JNIEnv, error: jni::errors::Error) -> String {
    if !env.exception_check().unwrap_or(false) {
        return error.to_string();
    }
    let throwable = match env.exception_occurred() {
        Ok(throwable) => throwable,
        Err(e) => return e.to_string(),
    };
    let _ = env.exception_clear();

    env.call_method(&throwable, "toString", "()Ljava/lang/String;", &[])
        .and_then(|value| value.l())
        .and_then(|obj| {
            let text = JString::from(obj);
            let message = env.get_string(&text).map(String::from);
            message
        })
        .unwrap_or_else(|e| e.to_string())
}

fn sdk_int(env: &mut JNIEnv) -> jni::errors::Result<i32> {
    env.get_static_field("android/os/Build$VERSION", "SDK_INT", "I")?
        .i()
}

fn system_service<'l>(
    env: &mut JNIEnv<'l>,
    context: &JObject,
    name: &str,
) -> jni::errors::Result<JObject<'l>> {
    let name = env.new_string(name)?;
    env.call_method(
        context,
        "getSystemService",
        "(Ljava/lang/String;)Ljava/lang/Object;",
        &[(&name).into()],
    )?
    .l()
}

#[derive(Clone)]
pub struct AndroidLocationManager {
    ctx: AndroidContext,
}

impl AndroidLocationManager {
    pub fn new(ctx: AndroidContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl TestProviderPlatform for AndroidLocationManager {
    async fn add_test_provider(
        &self,
        provider: &str,
        properties: &ProviderProperties,
    ) -> PlatformResult<()> {
        self.ctx.with_env("addTestProvider", |env, context| {
            let manager = system_service(env, context, "location")?;
            let name = env.new_string(provider)?;
            env.call_method(
                &manager,
                "addTestProvider",
                "(Ljava/lang/String;ZZZZZZZII)V",
                &[
                    (&name).into(),
                    JValue::Bool(properties.requires_network.into()),
                    JValue::Bool(properties.requires_satellite.into()),
                    JValue::Bool(properties.requires_cell.into()),
                    JValue::Bool(properties.has_monetary_cost.into()),
                    JValue::Bool(properties.supports_altitude.into()),
                    JValue::Bool(properties.supports_speed.into()),
                    JValue::Bool(properties.supports_bearing.into()),
                    JValue::Int(properties.power_requirement as i32),
                    JValue::Int(properties.accuracy as i32),
                ],
            )?;
            Ok(())
        })
    }

    async fn remove_test_provider(&self, provider: &str) -> PlatformResult<()> {
        self.ctx.with_env("removeTestProvider", |env, context| {
            let manager = system_service(env, context, "location")?;
            let name = env.new_string(provider)?;
            env.call_method(
                &manager,
                "removeTestProvider",
                "(Ljava/lang/String;)V",
                &[(&name).into()],
            )?;
            Ok(())
        })
    }

    async fn set_test_provider_enabled(
        &self,
        provider: &str,
        enabled: bool,
    ) -> PlatformResult<()> {
        self.ctx.with_env("setTestProviderEnabled", |env, context| {
            let manager = system_service(env, context, "location")?;
            let name = env.new_string(provider)?;
            env.call_method(
                &manager,
                "setTestProviderEnabled",
                "(Ljava/lang/String;Z)V",
                &[(&name).into(), JValue::Bool(enabled.into())],
            )?;
            Ok(())
        })
    }

    async fn set_test_provider_location(
        &self,
        provider: &str,
        fix: &MockFix,
    ) -> PlatformResult<()> {
        self.ctx.with_env("setTestProviderLocation", |env, context| {
            let manager = system_service(env, context, "location")?;
            let name = env.new_string(provider)?;
            let location = env.new_object(
                "android/location/Location",
                "(Ljava/lang/String;)V",
                &[(&name).into()],
            )?;
            env.call_method(&location, "setLatitude", "(D)V", &[JValue::Double(fix.latitude)])?;
            env.call_method(&location, "setLongitude", "(D)V", &[JValue::Double(fix.longitude)])?;
            env.call_method(&location, "setAccuracy", "(F)V", &[JValue::Float(fix.accuracy)])?;
            env.call_method(
                &location,
                "setTime",
                "(J)V",
                &[JValue::Long(fix.timestamp.timestamp_millis())],
            )?;
            let elapsed = env
                .call_static_method("android/os/SystemClock", "elapsedRealtimeNanos", "()J", &[])?
                .j()?;
            env.call_method(
                &location,
                "setElapsedRealtimeNanos",
                "(J)V",
                &[JValue::Long(elapsed)],
            )?;

            env.call_method(
                &manager,
                "setTestProviderLocation",
                "(Ljava/lang/String;Landroid/location/Location;)V",
                &[(&name).into(), (&location).into()],
            )?;
            Ok(())
        })
    }
}

#[derive(Clone)]
pub struct AndroidForegroundService {
    ctx: AndroidContext,
    service_class: String,
}

impl AndroidForegroundService {
    pub fn new(ctx: AndroidContext, service_class: impl Into<String>) -> Self {
        Self {
            ctx,
            service_class: service_class.into(),
        }
    }
}

fn service_intent<'l>(
    env: &mut JNIEnv<'l>,
    context: &JObject,
    service_class: &str,
) -> jni::errors::Result<JObject<'l>> {
    let intent = env.new_object("android/content/Intent", "()V", &[])?;
    let class_name = env.new_string(service_class)?;
    env.call_method(
        &intent,
        "setClassName",
        "(Landroid/content/Context;Ljava/lang/String;)Landroid/content/Intent;",
        &[context.into(), (&class_name).into()],
    )?;
    Ok(intent)
}

fn put_string_extra(
    env: &mut JNIEnv,
    intent: &JObject,
    key: &str,
    value: &str,
) -> jni::errors::Result<()> {
    let key = env.new_string(key)?;
    let value = env.new_string(value)?;
    env.call_method(
        intent,
        "putExtra",
        "(Ljava/lang/String;Ljava/lang/String;)Landroid/content/Intent;",
        &[(&key).into(), (&value).into()],
    )?;
    Ok(())
}

fn put_extra(
    env: &mut JNIEnv,
    intent: &JObject,
    key: &str,
    value_sig: &str,
    value: JValue,
) -> jni::errors::Result<()> {
    let key = env.new_string(key)?;
    env.call_method(
        intent,
        "putExtra",
        format!("(Ljava/lang/String;{})Landroid/content/Intent;", value_sig),
        &[(&key).into(), value],
    )?;
    Ok(())
}

fn ensure_channel(
    env: &mut JNIEnv,
    context: &JObject,
    channel: &NotificationChannel,
) -> jni::errors::Result<()> {
    if sdk_int(env)? < SDK_O {
        return Ok(());
    }
    let id = env.new_string(&channel.id)?;
    let name = env.new_string(&channel.name)?;
    let java_channel = env.new_object(
        "android/app/NotificationChannel",
        "(Ljava/lang/String;Ljava/lang/CharSequence;I)V",
        &[(&id).into(), (&name).into(), JValue::Int(IMPORTANCE_DEFAULT)],
    )?;
    let manager = system_service(env, context, "notification")?;
    env.call_method(
        &manager,
        "createNotificationChannel",
        "(Landroid/app/NotificationChannel;)V",
        &[(&java_channel).into()],
    )?;
    Ok(())
}

#[async_trait]
impl ForegroundPlatform for AndroidForegroundService {
    async fn create_channel(&self, channel: &NotificationChannel) -> PlatformResult<()> {
        self.ctx.with_env("createNotificationChannel", |env, context| {
            ensure_channel(env, context, channel)
        })
    }

    async fn start_foreground(&self, notification: &StatusNotification) -> PlatformResult<()> {
        self.ctx.with_env("startForegroundService", |env, context| {
            let intent = service_intent(env, context, &self.service_class)?;
            put_extra(env, &intent, extra::LATITUDE, "D", JValue::Double(notification.latitude))?;
            put_extra(env, &intent, extra::LONGITUDE, "D", JValue::Double(notification.longitude))?;
            put_extra(env, &intent, extra::NOTIFICATION_ID, "I", JValue::Int(notification.id))?;
            put_extra(env, &intent, extra::ONGOING, "Z", JValue::Bool(notification.ongoing.into()))?;
            put_extra(
                env,
                &intent,
                extra::ONLY_ALERT_ONCE,
                "Z",
                JValue::Bool(notification.only_alert_once.into()),
            )?;
            put_extra(
                env,
                &intent,
                extra::AUTO_CANCEL,
                "Z",
                JValue::Bool(notification.auto_cancel.into()),
            )?;
            put_string_extra(env, &intent, extra::CHANNEL_ID, &notification.channel_id)?;
            put_string_extra(env, &intent, extra::TITLE, &notification.title)?;
            put_string_extra(env, &intent, extra::TEXT, &notification.text)?;

            let method = if sdk_int(env)? >= SDK_O {
                "startForegroundService"
            } else {
                "startService"
            };
            env.call_method(
                context,
                method,
                "(Landroid/content/Intent;)Landroid/content/ComponentName;",
                &[(&intent).into()],
            )?;
            Ok(())
        })
    }

    async fn stop_self(&self) -> PlatformResult<()> {
        self.ctx.with_env("stopService", |env, context| {
            let intent = service_intent(env, context, &self.service_class)?;
            env.call_method(
                context,
                "stopService",
                "(Landroid/content/Intent;)Z",
                &[(&intent).into()],
            )?;
            Ok(())
        })
    }
}

fn string_extra(
    env: &mut JNIEnv,
    intent: &JObject,
    key: &str,
) -> jni::errors::Result<Option<String>> {
    let key = env.new_string(key)?;
    let value = env
        .call_method(
            intent,
            "getStringExtra",
            "(Ljava/lang/String;)Ljava/lang/String;",
            &[(&key).into()],
        )?
        .l()?;
    if value.is_null() {
        return Ok(None);
    }
    let value = JString::from(value);
    let text = env.get_string(&value)?.into();
    Ok(Some(text))
}

fn double_extra(env: &mut JNIEnv, intent: &JObject, key: &str, default: f64) -> jni::errors::Result<f64> {
    let key = env.new_string(key)?;
    env.call_method(
        intent,
        "getDoubleExtra",
        "(Ljava/lang/String;D)D",
        &[(&key).into(), JValue::Double(default)],
    )?
    .d()
}

fn int_extra(env: &mut JNIEnv, intent: &JObject, key: &str, default: i32) -> jni::errors::Result<i32> {
    let key = env.new_string(key)?;
    env.call_method(
        intent,
        "getIntExtra",
        "(Ljava/lang/String;I)I",
        &[(&key).into(), JValue::Int(default)],
    )?
    .i()
}

fn bool_extra(env: &mut JNIEnv, intent: &JObject, key: &str, default: bool) -> jni::errors::Result<bool> {
    let key = env.new_string(key)?;
    env.call_method(
        intent,
        "getBooleanExtra",
        "(Ljava/lang/String;Z)Z",
        &[(&key).into(), JValue::Bool(default.into())],
    )?
    .z()
}

// 從 Intent extras 還原通知內容，缺少的欄位採用預設值
fn notification_from_intent(
    env: &mut JNIEnv,
    intent: &JObject,
) -> jni::errors::Result<StatusNotification> {
    let mut channel = NotificationChannel::default();
    if intent.is_null() {
        return Ok(StatusNotification::for_coordinates(&channel, 0.0, 0.0));
    }

    let latitude = double_extra(env, intent, extra::LATITUDE, 0.0)?;
    let longitude = double_extra(env, intent, extra::LONGITUDE, 0.0)?;
    if let Some(id) = string_extra(env, intent, extra::CHANNEL_ID)? {
        channel.id = id;
    }

    let mut notification = StatusNotification::for_coordinates(&channel, latitude, longitude);
    if let Some(title) = string_extra(env, intent, extra::TITLE)? {
        notification.title = title;
    }
    if let Some(text) = string_extra(env, intent, extra::TEXT)? {
        notification.text = text;
    }
    notification.id = int_extra(env, intent, extra::NOTIFICATION_ID, notification.id)?;
    notification.ongoing = bool_extra(env, intent, extra::ONGOING, notification.ongoing)?;
    notification.only_alert_once =
        bool_extra(env, intent, extra::ONLY_ALERT_ONCE, notification.only_alert_once)?;
    notification.auto_cancel =
        bool_extra(env, intent, extra::AUTO_CANCEL, notification.auto_cancel)?;
    Ok(notification)
}

fn builder_call(
    env: &mut JNIEnv,
    builder: &JObject,
    method: &str,
    arg_sig: &str,
    arg: JValue,
) -> jni::errors::Result<()> {
    env.call_method(
        builder,
        method,
        format!("({})L{};", arg_sig, BUILDER_CLASS),
        &[arg],
    )?;
    Ok(())
}

fn build_notification<'l>(
    env: &mut JNIEnv<'l>,
    context: &JObject,
    notification: &StatusNotification,
) -> jni::errors::Result<JObject<'l>> {
    let builder = if sdk_int(env)? >= SDK_O {
        let channel_id = env.new_string(&notification.channel_id)?;
        env.new_object(
            BUILDER_CLASS,
            "(Landroid/content/Context;Ljava/lang/String;)V",
            &[context.into(), (&channel_id).into()],
        )?
    } else {
        env.new_object(BUILDER_CLASS, "(Landroid/content/Context;)V", &[context.into()])?
    };

    let icon = env
        .get_static_field("android/R$drawable", "ic_menu_mylocation", "I")?
        .i()?;
    let title = env.new_string(&notification.title)?;
    let text = env.new_string(&notification.text)?;
    let category = env.new_string(StatusNotification::CATEGORY)?;

    builder_call(env, &builder, "setSmallIcon", "I", JValue::Int(icon))?;
    builder_call(env, &builder, "setContentTitle", "Ljava/lang/CharSequence;", (&title).into())?;
    builder_call(env, &builder, "setContentText", "Ljava/lang/CharSequence;", (&text).into())?;
    builder_call(env, &builder, "setCategory", "Ljava/lang/String;", (&category).into())?;
    builder_call(env, &builder, "setOngoing", "Z", JValue::Bool(notification.ongoing.into()))?;
    builder_call(
        env,
        &builder,
        "setOnlyAlertOnce",
        "Z",
        JValue::Bool(notification.only_alert_once.into()),
    )?;
    builder_call(
        env,
        &builder,
        "setAutoCancel",
        "Z",
        JValue::Bool(notification.auto_cancel.into()),
    )?;
    builder_call(env, &builder, "setPriority", "I", JValue::Int(PRIORITY_DEFAULT))?;

    env.call_method(&builder, "build", "()Landroid/app/Notification;", &[])?
        .l()
}

fn start_in_foreground(
    env: &mut JNIEnv,
    service: &JObject,
    intent: &JObject,
) -> jni::errors::Result<StatusNotification> {
    let notification = notification_from_intent(env, intent)?;
    let built = build_notification(env, service, &notification)?;
    env.call_method(
        service,
        "startForeground",
        "(ILandroid/app/Notification;)V",
        &[JValue::Int(notification.id), (&built).into()],
    )?;
    Ok(notification)
}

/// `LocationForegroundService.onCreate`: makes sure the status channel exists.
#[no_mangle]
pub extern "system" fn Java_com_example_mocklocation_LocationForegroundService_nativeOnCreate<'a>(
    mut env: JNIEnv<'a>,
    service: JObject<'a>,
) {
    if let Err(e) = ensure_channel(&mut env, &service, &NotificationChannel::default()) {
        let message = take_exception(&mut env, e);
        tracing::error!("❌ createNotificationChannel failed: {}", message);
    }
}

/// `LocationForegroundService.onStartCommand`: returns `START_STICKY` once
/// the service is in the foreground, otherwise stops the service and
/// returns `START_NOT_STICKY`.
#[no_mangle]
pub extern "system" fn Java_com_example_mocklocation_LocationForegroundService_nativeOnStartCommand<'a>(
    mut env: JNIEnv<'a>,
    service: JObject<'a>,
    intent: JObject<'a>,
    _flags: jint,
    _start_id: jint,
) -> jint {
    match start_in_foreground(&mut env, &service, &intent) {
        Ok(notification) => {
            tracing::info!("🔔 startForeground success: {}", notification.text);
            START_STICKY
        }
        Err(e) => {
            let message = take_exception(&mut env, e);
            tracing::error!("❌ onStartCommand failed: {}", message);
            // 無法前景化就停止服務，不做降級
            if let Err(e) = env.call_method(&service, "stopSelf", "()V", &[]) {
                let message = take_exception(&mut env, e);
                tracing::warn!("⚠️ stopSelf failed: {}", message);
            }
            START_NOT_STICKY
        }
    }
}

struct NativeSession {
    runtime: tokio::runtime::Runtime,
    bridge: MockLocationBridge<AndroidLocationManager, AndroidForegroundService>,
}

static SESSION: Mutex<Option<NativeSession>> = Mutex::new(None);

fn throw(env: &mut JNIEnv, message: &str) {
    if let Err(e) = env.throw_new("java/lang/IllegalStateException", message) {
        tracing::error!("❌ Failed to raise Java exception: {}", e);
    }
}

fn with_session(env: &mut JNIEnv, f: impl FnOnce(&mut NativeSession) -> Result<(), String>) {
    let mut guard = SESSION.lock().unwrap_or_else(PoisonError::into_inner);
    let result = match guard.as_mut() {
        Some(session) => f(session),
        None => Err("MockLocationBridge.nativeInit was not called".to_string()),
    };
    if let Err(message) = result {
        throw(env, &message);
    }
}

/// Creates the bridge for the given application `Context`.
#[no_mangle]
pub extern "system" fn Java_com_example_mocklocation_MockLocationBridge_nativeInit<'a>(
    mut env: JNIEnv<'a>,
    _obj: JObject<'a>,
    context: JObject<'a>,
) {
    let ctx = match AndroidContext::new(&mut env, &context) {
        Ok(ctx) => ctx,
        Err(e) => return throw(&mut env, &e.to_string()),
    };
    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(runtime) => runtime,
        Err(e) => return throw(&mut env, &e.to_string()),
    };

    let bridge = MockLocationBridge::new(
        MockLocationProvider::new(AndroidLocationManager::new(ctx.clone()), GPS_PROVIDER),
        StatusNotifier::new(AndroidForegroundService::new(ctx, SERVICE_CLASS)),
    );
    *SESSION.lock().unwrap_or_else(PoisonError::into_inner) =
        Some(NativeSession { runtime, bridge });
    tracing::debug!("Native init complete");
}

/// Throws `IllegalStateException` when the provider is unavailable.
#[no_mangle]
pub extern "system" fn Java_com_example_mocklocation_MockLocationBridge_setMockLocation<'a>(
    mut env: JNIEnv<'a>,
    _obj: JObject<'a>,
    latitude: jdouble,
    longitude: jdouble,
) {
    with_session(&mut env, |session| {
        session
            .runtime
            .block_on(session.bridge.set_mock_location(latitude, longitude))
            .map(|_| ())
            .map_err(|e| e.to_string())
    });
}

/// Throws `IllegalStateException` when the notification cannot be shown.
#[no_mangle]
pub extern "system" fn Java_com_example_mocklocation_MockLocationBridge_startStatusNotification<'a>(
    mut env: JNIEnv<'a>,
    _obj: JObject<'a>,
    latitude: jdouble,
    longitude: jdouble,
) {
    with_session(&mut env, |session| {
        session
            .runtime
            .block_on(session.bridge.start_status_notification(latitude, longitude))
            .map_err(|e| e.to_string())
    });
}
