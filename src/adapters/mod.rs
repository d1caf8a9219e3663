// Adapters layer: concrete implementations of the domain ports.

pub mod adb;
#[cfg(feature = "android")]
pub mod android;
pub mod http;
pub mod memory;
