use std::time::Duration;

use crate::app::adb::runner::{run_bridge, CommandOutput};
use crate::app::error::AppError;

const PAIR_TIMEOUT: Duration = Duration::from_secs(15);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// `adb pair <ip:port> <code>` for first-time wireless debugging setup.
pub fn pair(
    program: &str,
    address: &str,
    pairing_code: &str,
    trace_id: &str,
) -> Result<CommandOutput, AppError> {
    let args = vec![
        "pair".to_string(),
        address.to_string(),
        pairing_code.to_string(),
    ];
    let output = run_bridge(program, &args, PAIR_TIMEOUT, trace_id)?;
    // adb pair can exit 0 while still reporting failure text.
    let combined = format!("{}{}", output.stdout, output.stderr);
    if !output.success() || !combined.contains("Successfully") {
        return Err(AppError::device_unreachable(
            format!("adb pair failed: {}", output.detail()),
            trace_id,
        ));
    }
    Ok(output)
}

/// `adb connect <ip:port>` for an already-paired device.
pub fn connect(program: &str, address: &str, trace_id: &str) -> Result<CommandOutput, AppError> {
    let args = vec!["connect".to_string(), address.to_string()];
    let output = run_bridge(program, &args, CONNECT_TIMEOUT, trace_id)?;
    let combined = format!("{}{}", output.stdout, output.stderr).to_lowercase();
    if !output.success() || !combined.contains("connected") {
        return Err(AppError::device_unreachable(
            format!("adb connect failed: {}", output.detail()),
            trace_id,
        ));
    }
    Ok(output)
}
