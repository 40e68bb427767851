pub mod bridge;
pub mod locator;
pub mod parse;
pub mod runner;
pub mod wireless;

pub use bridge::{AdbBridge, DeviceBridge};
