use std::time::Duration;

use crate::app::adb::parse::{parse_devices_list, parse_reverse_ports, parse_setting_output};
use crate::app::adb::runner::{run_bridge, serial_args, CommandOutput, ACTION_TIMEOUT, QUERY_TIMEOUT};
use crate::app::error::AppError;
use crate::app::models::DeviceSummary;

pub const HTTP_PROXY_SETTING: &str = "http_proxy";

/// The two primitives the rest of the tool needs from the debugging bridge:
/// device enumeration and proxy-setting access, plus the reverse-tunnel calls
/// for USB relay mode. Behind a trait so the action layer tests with injected
/// device data instead of a live adb.
pub trait DeviceBridge {
    fn list_devices(&self, trace_id: &str) -> Result<Vec<DeviceSummary>, AppError>;
    fn available(&self) -> bool;
    fn proxy_setting(&self, serial: &str, trace_id: &str) -> Result<Option<String>, AppError>;
    fn set_proxy_setting(&self, serial: &str, value: &str, trace_id: &str)
        -> Result<(), AppError>;
    fn delete_proxy_setting(&self, serial: &str, trace_id: &str) -> Result<(), AppError>;
    fn ensure_tunnel(&self, serial: &str, port: u16, trace_id: &str) -> Result<(), AppError>;
    fn remove_tunnel(&self, serial: &str, port: u16, trace_id: &str) -> Result<(), AppError>;
    fn active_tunnels(&self, serial: &str, trace_id: &str) -> Result<Vec<u16>, AppError>;
}

#[derive(Debug, Clone)]
pub struct AdbBridge {
    program: String,
}

impl AdbBridge {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn run_for_device(
        &self,
        serial: &str,
        tail: &[&str],
        timeout: Duration,
        trace_id: &str,
    ) -> Result<CommandOutput, AppError> {
        let output = run_bridge(&self.program, &serial_args(serial, tail), timeout, trace_id)?;
        if !output.success() {
            return Err(AppError::device_unreachable(
                format!("{serial}: {}", output.detail()),
                trace_id,
            ));
        }
        Ok(output)
    }
}

impl DeviceBridge for AdbBridge {
    fn list_devices(&self, trace_id: &str) -> Result<Vec<DeviceSummary>, AppError> {
        let args = vec!["devices".to_string(), "-l".to_string()];
        let output = run_bridge(&self.program, &args, ACTION_TIMEOUT, trace_id)?;
        if !output.success() {
            return Err(AppError::bridge_unavailable(
                format!("adb devices failed: {}", output.detail()),
                trace_id,
            ));
        }
        Ok(parse_devices_list(&output.stdout))
    }

    fn available(&self) -> bool {
        let args = vec!["version".to_string()];
        run_bridge(&self.program, &args, QUERY_TIMEOUT, "adb-availability")
            .map(|output| output.success())
            .unwrap_or(false)
    }

    fn proxy_setting(&self, serial: &str, trace_id: &str) -> Result<Option<String>, AppError> {
        let output = self.run_for_device(
            serial,
            &["shell", "settings", "get", "global", HTTP_PROXY_SETTING],
            QUERY_TIMEOUT,
            trace_id,
        )?;
        Ok(parse_setting_output(&output.stdout))
    }

    fn set_proxy_setting(
        &self,
        serial: &str,
        value: &str,
        trace_id: &str,
    ) -> Result<(), AppError> {
        self.run_for_device(
            serial,
            &["shell", "settings", "put", "global", HTTP_PROXY_SETTING, value],
            ACTION_TIMEOUT,
            trace_id,
        )?;
        Ok(())
    }

    fn delete_proxy_setting(&self, serial: &str, trace_id: &str) -> Result<(), AppError> {
        self.run_for_device(
            serial,
            &["shell", "settings", "delete", "global", HTTP_PROXY_SETTING],
            ACTION_TIMEOUT,
            trace_id,
        )?;
        Ok(())
    }

    fn ensure_tunnel(&self, serial: &str, port: u16, trace_id: &str) -> Result<(), AppError> {
        let spec = format!("tcp:{port}");
        self.run_for_device(
            serial,
            &["reverse", &spec, &spec],
            ACTION_TIMEOUT,
            trace_id,
        )?;
        Ok(())
    }

    fn remove_tunnel(&self, serial: &str, port: u16, trace_id: &str) -> Result<(), AppError> {
        let spec = format!("tcp:{port}");
        // Removing a tunnel that does not exist is not an error.
        run_bridge(
            &self.program,
            &serial_args(serial, &["reverse", "--remove", &spec]),
            ACTION_TIMEOUT,
            trace_id,
        )?;
        Ok(())
    }

    fn active_tunnels(&self, serial: &str, trace_id: &str) -> Result<Vec<u16>, AppError> {
        let output = self.run_for_device(
            serial,
            &["reverse", "--list"],
            QUERY_TIMEOUT,
            trace_id,
        )?;
        Ok(parse_reverse_ports(&output.stdout))
    }
}
