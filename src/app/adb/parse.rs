use std::sync::OnceLock;

use regex::Regex;

use crate::app::models::DeviceSummary;

/// Parse `adb devices -l` output into usable devices.
///
/// Offline and unauthorized entries are dropped: they cannot take settings
/// mutations, and listing them would only produce guaranteed-failure rows.
pub fn parse_devices_list(output: &str) -> Vec<DeviceSummary> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.trim_start().starts_with('*'))
        .filter(|line| !line.to_lowercase().contains("list of devices"))
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 2 || tokens[1] != "device" {
                return None;
            }
            let serial = tokens[0].to_string();
            let model = tokens
                .iter()
                .skip(2)
                .find_map(|token| token.strip_prefix("model:"))
                .unwrap_or("unknown")
                .to_string();
            Some(DeviceSummary { serial, model })
        })
        .collect()
}

/// Raw value of `settings get global http_proxy`. Android prints `null` for
/// an unset key; both that and empty output map to "no setting present".
pub fn parse_setting_output(output: &str) -> Option<String> {
    let value = output.trim();
    if value.is_empty() || value == "null" {
        return None;
    }
    Some(value.to_string())
}

/// Device-side ports with an active reverse tunnel, from `adb reverse --list`
/// output (`<serial> tcp:<device-port> tcp:<host-port>` per line).
pub fn parse_reverse_ports(output: &str) -> Vec<u16> {
    static REVERSE_RE: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = REVERSE_RE.get_or_init(|| Regex::new(r"tcp:(\d+)\s+tcp:\d+").ok()) else {
        return Vec::new();
    };
    re.captures_iter(output)
        .filter_map(|caps| caps[1].parse::<u16>().ok())
        .collect()
}
