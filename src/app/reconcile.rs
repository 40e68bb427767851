use serde::{Deserialize, Serialize};

/// Written by the disable action; a present-but-inert proxy setting. Distinct
/// from an unset property so the operator can tell "intentionally off" from
/// "never configured".
pub const DISABLED_SENTINEL: &str = ":0";

pub const LOOPBACK_HOST: &str = "127.0.0.1";

/// Health of a single device's proxy setting. Derived on every poll from the
/// raw setting value, the configured host address and the active tunnel set;
/// never mutated independently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeviceHealth {
    /// No proxy setting present.
    Clean,
    /// Setting present but equal to the `:0` sentinel.
    Disabled,
    /// Setting points at the configured target and is reachable.
    EnabledMatching,
    /// Setting points at an address the host no longer answers on.
    Stale,
    /// Setting points at the loopback relay port but no reverse tunnel exists;
    /// device traffic is blackholed.
    NoTunnel,
}

impl DeviceHealth {
    pub fn needs_fix(self) -> bool {
        matches!(self, DeviceHealth::Stale | DeviceHealth::NoTunnel)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BannerState {
    NoDevices,
    AllClean,
    AllEnabled,
    AllDisabled,
    Stale,
    Mixed,
}

/// Split a raw `host:port` setting value. Ports are split from the right so an
/// unbracketed IPv6-ish host keeps its colons.
pub fn split_setting_value(value: &str) -> (&str, Option<u16>) {
    match value.rsplit_once(':') {
        Some((host, port)) => (host, port.parse::<u16>().ok()),
        None => (value, None),
    }
}

pub fn is_loopback_value(value: &str) -> bool {
    split_setting_value(value).0 == LOOPBACK_HOST
}

/// Classify one device's proxy setting.
///
/// Precedence: absent, sentinel, loopback-without-tunnel, mismatched, matching.
/// Pure: callers supply the raw setting value and the already-collected tunnel
/// port list, so this can be tested without any adb dependency.
pub fn classify_device(
    setting: Option<&str>,
    host_ip: &str,
    tunnel_port: u16,
    active_tunnels: &[u16],
) -> DeviceHealth {
    let Some(value) = setting else {
        return DeviceHealth::Clean;
    };
    if value == DISABLED_SENTINEL {
        return DeviceHealth::Disabled;
    }

    let (host, port) = split_setting_value(value);
    if host == LOOPBACK_HOST {
        // USB relay mode: healthy only while the reverse tunnel is up.
        return match port {
            Some(port) if active_tunnels.contains(&port) => DeviceHealth::EnabledMatching,
            Some(port) if port == tunnel_port => DeviceHealth::NoTunnel,
            _ => DeviceHealth::Stale,
        };
    }

    // Wi-Fi mode: the setting must point at the host's current address. A
    // value with no parsable port cannot match anything we would have written.
    if host != host_ip || port.is_none() {
        return DeviceHealth::Stale;
    }
    DeviceHealth::EnabledMatching
}

/// Collapse per-device classifications into the dashboard banner.
///
/// A single stale or tunnel-less device dominates everything else: the
/// operator must see drift before being shown a uniform state.
pub fn aggregate_banner(healths: &[DeviceHealth]) -> BannerState {
    if healths.is_empty() {
        return BannerState::NoDevices;
    }
    if healths.iter().any(|health| health.needs_fix()) {
        return BannerState::Stale;
    }
    let first = healths[0];
    if healths.iter().any(|health| *health != first) {
        return BannerState::Mixed;
    }
    match first {
        DeviceHealth::Clean => BannerState::AllClean,
        DeviceHealth::Disabled => BannerState::AllDisabled,
        _ => BannerState::AllEnabled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "192.168.1.5";
    const PORT: u16 = 9090;

    fn classify(setting: Option<&str>, tunnels: &[u16]) -> DeviceHealth {
        classify_device(setting, HOST, PORT, tunnels)
    }

    #[test]
    fn clean_iff_setting_absent() {
        assert_eq!(classify(None, &[]), DeviceHealth::Clean);
        assert_ne!(classify(Some(":0"), &[]), DeviceHealth::Clean);
        assert_ne!(classify(Some("192.168.1.5:9090"), &[]), DeviceHealth::Clean);
    }

    #[test]
    fn disabled_iff_sentinel_regardless_of_host() {
        assert_eq!(classify(Some(":0"), &[]), DeviceHealth::Disabled);
        assert_eq!(
            classify_device(Some(":0"), "10.0.0.1", 8888, &[]),
            DeviceHealth::Disabled
        );
    }

    #[test]
    fn matching_wifi_value_is_enabled() {
        assert_eq!(
            classify(Some("192.168.1.5:9090"), &[]),
            DeviceHealth::EnabledMatching
        );
    }

    #[test]
    fn mismatched_host_is_stale() {
        assert_eq!(classify(Some("10.0.0.9:9090"), &[]), DeviceHealth::Stale);
    }

    #[test]
    fn wifi_match_is_on_host_only() {
        // Staleness tracks the host address, which is what drifts when the
        // machine changes networks. A different port on the right host is
        // still the operator's own doing.
        assert_eq!(
            classify_device(Some("192.168.1.5:8000"), HOST, PORT, &[]),
            DeviceHealth::EnabledMatching,
        );
    }

    #[test]
    fn loopback_without_tunnel_is_no_tunnel() {
        assert_eq!(classify(Some("127.0.0.1:9090"), &[]), DeviceHealth::NoTunnel);
    }

    #[test]
    fn loopback_with_tunnel_is_enabled() {
        assert_eq!(
            classify(Some("127.0.0.1:9090"), &[9090]),
            DeviceHealth::EnabledMatching
        );
    }

    #[test]
    fn loopback_on_unexpected_port_without_tunnel_is_stale() {
        assert_eq!(classify(Some("127.0.0.1:8000"), &[]), DeviceHealth::Stale);
    }

    #[test]
    fn malformed_value_is_stale() {
        assert_eq!(classify(Some("garbage"), &[]), DeviceHealth::Stale);
        assert_eq!(classify(Some("192.168.1.5:abc"), &[]), DeviceHealth::Stale);
    }

    #[test]
    fn spec_scenario_three_devices() {
        // Host 192.168.1.5:9090; A absent, B matching, C pointing elsewhere.
        let healths = vec![
            classify(None, &[]),
            classify(Some("192.168.1.5:9090"), &[]),
            classify(Some("10.0.0.9:9090"), &[]),
        ];
        assert_eq!(
            healths,
            vec![
                DeviceHealth::Clean,
                DeviceHealth::EnabledMatching,
                DeviceHealth::Stale
            ]
        );
        assert_eq!(aggregate_banner(&healths), BannerState::Stale);
    }

    #[test]
    fn aggregate_empty_is_no_devices() {
        assert_eq!(aggregate_banner(&[]), BannerState::NoDevices);
    }

    #[test]
    fn aggregate_uniform_sets() {
        assert_eq!(
            aggregate_banner(&[DeviceHealth::Clean, DeviceHealth::Clean]),
            BannerState::AllClean
        );
        assert_eq!(
            aggregate_banner(&[DeviceHealth::Disabled]),
            BannerState::AllDisabled
        );
        assert_eq!(
            aggregate_banner(&[DeviceHealth::EnabledMatching; 3]),
            BannerState::AllEnabled
        );
    }

    #[test]
    fn single_stale_dominates_enabled_majority() {
        let healths = [
            DeviceHealth::EnabledMatching,
            DeviceHealth::EnabledMatching,
            DeviceHealth::Stale,
        ];
        assert_eq!(aggregate_banner(&healths), BannerState::Stale);
    }

    #[test]
    fn no_tunnel_dominates_like_stale() {
        let healths = [DeviceHealth::Clean, DeviceHealth::NoTunnel];
        assert_eq!(aggregate_banner(&healths), BannerState::Stale);
    }

    #[test]
    fn mixed_iff_disagreement_without_stale() {
        let healths = [DeviceHealth::Clean, DeviceHealth::EnabledMatching];
        assert_eq!(aggregate_banner(&healths), BannerState::Mixed);
        let healths = [DeviceHealth::Disabled, DeviceHealth::Clean];
        assert_eq!(aggregate_banner(&healths), BannerState::Mixed);
    }

    #[test]
    fn splits_setting_values() {
        assert_eq!(split_setting_value("192.168.1.5:9090"), ("192.168.1.5", Some(9090)));
        assert_eq!(split_setting_value(":0"), ("", Some(0)));
        assert_eq!(split_setting_value("no-port"), ("no-port", None));
    }

    #[test]
    fn health_serializes_snake_case() {
        let json = serde_json::to_string(&DeviceHealth::NoTunnel).expect("serialize");
        assert_eq!(json, "\"no_tunnel\"");
        let json = serde_json::to_string(&BannerState::AllEnabled).expect("serialize");
        assert_eq!(json, "\"all_enabled\"");
    }
}
