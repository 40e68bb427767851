use std::net::UdpSocket;

use tracing::warn;

use crate::app::adb::locator::resolve_adb_program;
use crate::app::models::ProxyTarget;

pub const DEFAULT_PROXY_PORT: u16 = 9090;
pub const DEFAULT_WEB_PORT: u16 = 8080;

pub const ENV_PROXY_HOST: &str = "PROXY_HOST";
pub const ENV_PROXY_PORT: &str = "PROXY_PORT";
pub const ENV_WEB_PORT: &str = "PROXY_WEB_PORT";
pub const ENV_ADB_PATH: &str = "ADB_PATH";

/// Startup configuration. Environment variables are read once at launch;
/// later host/port changes go through the reconfigure action and live only
/// in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub proxy_host: String,
    pub proxy_port: u16,
    pub web_port: u16,
    pub adb_program: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an injectable lookup so env parsing is testable without
    /// touching process state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let proxy_host = lookup(ENV_PROXY_HOST)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(detect_local_ip);
        let proxy_port = parse_port(lookup(ENV_PROXY_PORT), ENV_PROXY_PORT, DEFAULT_PROXY_PORT);
        let web_port = parse_port(lookup(ENV_WEB_PORT), ENV_WEB_PORT, DEFAULT_WEB_PORT);
        let adb_program = resolve_adb_program(lookup(ENV_ADB_PATH).as_deref().unwrap_or(""));

        Self {
            proxy_host,
            proxy_port,
            web_port,
            adb_program,
        }
    }

    pub fn target(&self) -> ProxyTarget {
        ProxyTarget {
            host: self.proxy_host.clone(),
            port: self.proxy_port,
        }
    }
}

fn parse_port(raw: Option<String>, name: &str, default: u16) -> u16 {
    let Some(raw) = raw.map(|value| value.trim().to_string()).filter(|v| !v.is_empty()) else {
        return default;
    };
    match raw.parse::<u16>() {
        Ok(port) if port != 0 => port,
        _ => {
            warn!(variable = name, value = %raw, default, "invalid port value, using default");
            default
        }
    }
}

/// The host's IP on the active outbound interface, via a connected UDP socket
/// that never sends a packet. Falls back to loopback when offline.
pub fn detect_local_ip() -> String {
    let probe = || -> std::io::Result<String> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(("8.8.8.8", 80))?;
        Ok(socket.local_addr()?.ip().to_string())
    };
    probe().unwrap_or_else(|_| "127.0.0.1".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn reads_explicit_values() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_PROXY_HOST, "192.168.4.2"),
            (ENV_PROXY_PORT, "9999"),
            (ENV_WEB_PORT, "8088"),
            (ENV_ADB_PATH, "/opt/platform-tools/adb"),
        ]));
        assert_eq!(config.proxy_host, "192.168.4.2");
        assert_eq!(config.proxy_port, 9999);
        assert_eq!(config.web_port, 8088);
        assert_eq!(config.adb_program, "/opt/platform-tools/adb");
    }

    #[test]
    fn falls_back_on_invalid_ports() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_PROXY_HOST, "10.0.0.2"),
            (ENV_PROXY_PORT, "not-a-port"),
            (ENV_WEB_PORT, "0"),
        ]));
        assert_eq!(config.proxy_port, DEFAULT_PROXY_PORT);
        assert_eq!(config.web_port, DEFAULT_WEB_PORT);
    }

    #[test]
    fn blank_host_uses_detection() {
        let config = AppConfig::from_lookup(lookup_from(&[(ENV_PROXY_HOST, "   ")]));
        assert!(!config.proxy_host.is_empty());
    }

    #[test]
    fn defaults_adb_program() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.adb_program, "adb");
    }

    #[test]
    fn builds_target_from_config() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_PROXY_HOST, "192.168.1.5"),
            (ENV_PROXY_PORT, "9090"),
        ]));
        assert_eq!(config.target().setting_value(), "192.168.1.5:9090");
    }
}
