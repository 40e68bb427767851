use tracing::{info, warn};

use crate::app::adb::DeviceBridge;
use crate::app::error::AppError;
use crate::app::models::{ActionResult, DeviceStatus, ProxyTarget, StatusReport};
use crate::app::reconcile::{
    aggregate_banner, classify_device, is_loopback_value, DISABLED_SENTINEL, LOOPBACK_HOST,
};

/// What the enable action points devices at: the host's reachable address for
/// Wi-Fi mode, or the loopback relay through a reverse tunnel for USB mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnableTarget {
    Wifi { host: String, port: u16 },
    Usb { tunnel_port: u16 },
}

impl EnableTarget {
    pub fn setting_value(&self) -> String {
        match self {
            EnableTarget::Wifi { host, port } => format!("{host}:{port}"),
            EnableTarget::Usb { tunnel_port } => format!("{LOOPBACK_HOST}:{tunnel_port}"),
        }
    }
}

/// Point every attached device at the target.
///
/// USB mode establishes the reverse tunnel before writing the setting; if the
/// tunnel cannot be set up the setting is left untouched so the device is not
/// pointed into a blackhole. Per-device failures land in that device's result
/// row; only a bridge-level failure aborts the call.
pub fn enable<B: DeviceBridge>(
    bridge: &B,
    target: &EnableTarget,
    trace_id: &str,
) -> Result<Vec<ActionResult>, AppError> {
    let devices = bridge.list_devices(trace_id)?;
    let value = target.setting_value();
    let mut results = Vec::with_capacity(devices.len());
    for device in &devices {
        let outcome = match target {
            EnableTarget::Wifi { .. } => {
                bridge.set_proxy_setting(&device.serial, &value, trace_id)
            }
            EnableTarget::Usb { tunnel_port } => bridge
                .ensure_tunnel(&device.serial, *tunnel_port, trace_id)
                .map_err(|err| {
                    AppError::new(
                        err.code,
                        format!("failed to set up USB tunnel: {}", err.error),
                        trace_id,
                    )
                })
                .and_then(|()| bridge.set_proxy_setting(&device.serial, &value, trace_id)),
        };
        results.push(match outcome {
            Ok(()) => {
                info!(trace_id = %trace_id, serial = %device.serial, value = %value, "proxy enabled");
                let message = match target {
                    EnableTarget::Wifi { .. } => format!("proxy set to {value}"),
                    EnableTarget::Usb { .. } => format!("proxy set to {value} (USB tunnel)"),
                };
                ActionResult::success(device, message)
            }
            Err(err) => {
                warn!(trace_id = %trace_id, serial = %device.serial, error = %err, "enable failed");
                ActionResult::failure(device, err.error)
            }
        });
    }
    Ok(results)
}

/// Write the `:0` sentinel to every device: proxying stops but the setting
/// stays present, so "intentionally off" remains distinguishable from "never
/// configured". Any reverse tunnel on the configured port is torn down first.
pub fn disable<B: DeviceBridge>(
    bridge: &B,
    tunnel_port: u16,
    trace_id: &str,
) -> Result<Vec<ActionResult>, AppError> {
    let devices = bridge.list_devices(trace_id)?;
    let mut results = Vec::with_capacity(devices.len());
    for device in &devices {
        let _ = bridge.remove_tunnel(&device.serial, tunnel_port, trace_id);
        // Delete-then-write matches what the settings provider reliably
        // persists; a bare overwrite sometimes leaves the old value visible
        // until connectivity is toggled.
        let _ = bridge.delete_proxy_setting(&device.serial, trace_id);
        results.push(
            match bridge.set_proxy_setting(&device.serial, DISABLED_SENTINEL, trace_id) {
                Ok(()) => {
                    info!(trace_id = %trace_id, serial = %device.serial, "proxy disabled");
                    ActionResult::success(
                        device,
                        "proxy disabled (toggle Wi-Fi if it still shows)",
                    )
                }
                Err(err) => {
                    warn!(trace_id = %trace_id, serial = %device.serial, error = %err, "disable failed");
                    ActionResult::failure(device, err.error)
                }
            },
        );
    }
    Ok(results)
}

/// Remove the setting entirely, returning devices to clean.
pub fn delete<B: DeviceBridge>(
    bridge: &B,
    tunnel_port: u16,
    trace_id: &str,
) -> Result<Vec<ActionResult>, AppError> {
    let devices = bridge.list_devices(trace_id)?;
    let mut results = Vec::with_capacity(devices.len());
    for device in &devices {
        let _ = bridge.remove_tunnel(&device.serial, tunnel_port, trace_id);
        results.push(
            match bridge.delete_proxy_setting(&device.serial, trace_id) {
                Ok(()) => {
                    info!(trace_id = %trace_id, serial = %device.serial, "proxy deleted");
                    ActionResult::success(device, "proxy deleted")
                }
                Err(err) => {
                    warn!(trace_id = %trace_id, serial = %device.serial, error = %err, "delete failed");
                    ActionResult::failure(device, err.error)
                }
            },
        );
    }
    Ok(results)
}

/// Enumerate, read, classify, aggregate. Everything is recomputed from fresh
/// reads; nothing survives between polls. A device whose setting cannot be
/// read is reported with no proxy value rather than failing the poll.
pub fn status<B: DeviceBridge>(
    bridge: &B,
    target: &ProxyTarget,
    trace_id: &str,
) -> Result<StatusReport, AppError> {
    let devices = bridge.list_devices(trace_id)?;
    let mut rows = Vec::with_capacity(devices.len());
    for device in &devices {
        let proxy = match bridge.proxy_setting(&device.serial, trace_id) {
            Ok(value) => value,
            Err(err) => {
                warn!(trace_id = %trace_id, serial = %device.serial, error = %err, "proxy read failed");
                None
            }
        };
        // Tunnel state only matters for loopback values; skip the extra adb
        // round-trip otherwise.
        let tunnels = match proxy.as_deref() {
            Some(value) if is_loopback_value(value) => bridge
                .active_tunnels(&device.serial, trace_id)
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        let health = classify_device(proxy.as_deref(), &target.host, target.port, &tunnels);
        rows.push(DeviceStatus {
            serial: device.serial.clone(),
            model: device.model.clone(),
            proxy,
            health,
        });
    }
    let banner = aggregate_banner(&rows.iter().map(|row| row.health).collect::<Vec<_>>());
    Ok(StatusReport {
        ip: target.host.clone(),
        port: target.port,
        adb: bridge.available(),
        banner,
        devices: rows,
    })
}

/// Update the in-memory default target. Touches no device.
pub fn reconfigure(target: &mut ProxyTarget, host: Option<String>, port: Option<u16>) {
    if let Some(host) = host.map(|value| value.trim().to_string()).filter(|v| !v.is_empty()) {
        target.host = host;
    }
    if let Some(port) = port.filter(|port| *port != 0) {
        target.port = port;
    }
}
