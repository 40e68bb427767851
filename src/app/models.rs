use serde::{Deserialize, Serialize};

use crate::app::reconcile::{BannerState, DeviceHealth};

/// One attached device, re-read fresh on every enumeration. Nothing about a
/// device is cached across polls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceSummary {
    pub serial: String,
    pub model: String,
}

/// Per-device row of the status endpoint. `proxy` is `None` for a clean
/// device, the literal `:0` sentinel for a disabled one, `host:port` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceStatus {
    pub serial: String,
    pub model: String,
    pub proxy: Option<String>,
    pub health: DeviceHealth,
}

/// Outcome of one action on one device. A failed device never aborts the
/// batch; its row just carries `ok: false` and the failure message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionResult {
    pub ok: bool,
    pub model: String,
    pub serial: String,
    pub message: String,
}

impl ActionResult {
    pub fn success(device: &DeviceSummary, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            model: device.model.clone(),
            serial: device.serial.clone(),
            message: message.into(),
        }
    }

    pub fn failure(device: &DeviceSummary, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            model: device.model.clone(),
            serial: device.serial.clone(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusReport {
    pub ip: String,
    pub port: u16,
    pub adb: bool,
    pub banner: BannerState,
    pub devices: Vec<DeviceStatus>,
}

/// The operator's configured proxy endpoint. In-memory only; owned by the
/// control surface and updated only through the reconfigure action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyTarget {
    pub host: String,
    pub port: u16,
}

impl ProxyTarget {
    pub fn setting_value(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
