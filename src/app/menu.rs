use std::io::{self, BufRead, Write};

use uuid::Uuid;

use crate::app::actions::{self, EnableTarget};
use crate::app::adb::{wireless, AdbBridge, DeviceBridge};
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::app::models::{ActionResult, ProxyTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    Enable,
    Disable,
    Wireless,
    ChangeHost,
    ChangePort,
    Quit,
    Unknown,
}

impl MenuChoice {
    fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "1" => MenuChoice::Enable,
            "2" => MenuChoice::Disable,
            "3" => MenuChoice::Wireless,
            "4" => MenuChoice::ChangeHost,
            "5" => MenuChoice::ChangePort,
            "q" => MenuChoice::Quit,
            _ => MenuChoice::Unknown,
        }
    }
}

pub fn run_menu(config: AppConfig) {
    let bridge = AdbBridge::new(config.adb_program.clone());
    let mut target = config.target();

    loop {
        print_header(&target);
        println!();
        println!("   1) Set Proxy              (fully automated via adb)");
        println!("   2) Clear Proxy            (fully automated via adb)");
        println!("   3) ADB Wireless Connect   (pair & connect devices over Wi-Fi)");
        println!();
        println!("   4) Change proxy IP");
        println!("   5) Change proxy port");
        println!("   q) Quit");
        println!();

        let Some(choice) = prompt("  Select an option: ") else {
            break;
        };
        match MenuChoice::parse(&choice) {
            MenuChoice::Enable => {
                let enable_target = EnableTarget::Wifi {
                    host: target.host.clone(),
                    port: target.port,
                };
                print_action_outcome(actions::enable(&bridge, &enable_target, &new_trace_id()));
            }
            MenuChoice::Disable => {
                print_action_outcome(actions::disable(&bridge, target.port, &new_trace_id()));
            }
            MenuChoice::Wireless => wireless_menu(&bridge),
            MenuChoice::ChangeHost => {
                if let Some(input) = prompt(&format!("  Enter new proxy IP [{}]: ", target.host)) {
                    actions::reconfigure(&mut target, Some(input), None);
                    println!("  Proxy IP is {}", target.host);
                }
            }
            MenuChoice::ChangePort => {
                if let Some(input) = prompt("  Enter new proxy port: ") {
                    match input.trim().parse::<u16>() {
                        Ok(port) if port != 0 => {
                            actions::reconfigure(&mut target, None, Some(port));
                            println!("  Proxy port updated to {}", target.port);
                        }
                        _ => println!("  Invalid port, keeping current value."),
                    }
                }
            }
            MenuChoice::Quit => break,
            MenuChoice::Unknown => println!("\n  Invalid option. Try again."),
        }
        println!();
    }
    println!("\n  Bye!");
}

fn print_header(target: &ProxyTarget) {
    println!("\n{}", "=".repeat(56));
    println!("   Proxy Auto-Setup Tool for Android Test Devices");
    println!("{}", "=".repeat(56));
    println!("   Host IP     : {}", target.host);
    println!("   Proxy Port  : {}", target.port);
    println!("{}", "-".repeat(56));
}

fn wireless_menu(bridge: &AdbBridge) {
    println!();
    println!("  ADB Wireless Connect");
    println!("  --------------------");
    println!("  Prerequisites:");
    println!("    - Device and host must be on the same Wi-Fi network");
    println!("    - On the device: Settings > Developer Options > Wireless debugging > ON");
    println!();
    println!("  Options:");
    println!("    a) Pair a new device   (first time only, needs pairing code)");
    println!("    b) Connect to a device (already paired, just needs IP:port)");
    println!("    c) List connected devices");
    println!("    d) Back to main menu");
    println!();

    let Some(choice) = prompt("  Select: ") else {
        return;
    };
    match choice.trim().to_lowercase().as_str() {
        "a" => wireless_pair(bridge),
        "b" => wireless_connect(bridge),
        "c" => wireless_list(bridge),
        "d" => {}
        _ => println!("  Invalid option."),
    }
}

fn wireless_pair(bridge: &AdbBridge) {
    println!();
    println!("  On the device, go to:");
    println!("    Settings > Developer Options > Wireless debugging > Pair device with pairing code");
    println!();
    let Some(address) = prompt("  Enter pairing IP:port (e.g. 192.168.4.50:37123): ") else {
        return;
    };
    if address.trim().is_empty() {
        println!("  Cancelled.");
        return;
    }
    let Some(code) = prompt("  Enter 6-digit pairing code: ") else {
        return;
    };
    if code.trim().is_empty() {
        println!("  Cancelled.");
        return;
    }

    println!("\n  Pairing with {}...", address.trim());
    match wireless::pair(bridge.program(), address.trim(), code.trim(), &new_trace_id()) {
        Ok(output) => {
            println!("  [OK] {}", output.detail());
            println!("\n  Now use option (b) to connect to the device's wireless debugging port.");
        }
        Err(err) => println!("  [FAIL] {}", err.error),
    }
}

fn wireless_connect(bridge: &AdbBridge) {
    println!();
    println!("  On the device, check the IP:port shown under:");
    println!("    Settings > Developer Options > Wireless debugging");
    println!("  (This is the *connection* port, NOT the pairing port.)");
    println!();
    let Some(address) = prompt("  Enter device IP:port (e.g. 192.168.4.50:41567): ") else {
        return;
    };
    if address.trim().is_empty() {
        println!("  Cancelled.");
        return;
    }

    println!("\n  Connecting to {}...", address.trim());
    match wireless::connect(bridge.program(), address.trim(), &new_trace_id()) {
        Ok(output) => println!("  [OK] {}", output.detail()),
        Err(err) => println!("  [FAIL] {}", err.error),
    }
}

fn wireless_list(bridge: &AdbBridge) {
    match bridge.list_devices(&new_trace_id()) {
        Ok(devices) if devices.is_empty() => println!("\n  No devices connected."),
        Ok(devices) => {
            println!("\n  Connected devices ({}):\n", devices.len());
            for device in devices {
                println!("    - {} ({})", device.model, device.serial);
            }
        }
        Err(err) => println!("\n  [!] {}", err.error),
    }
}

fn print_action_outcome(outcome: Result<Vec<ActionResult>, AppError>) {
    match outcome {
        Ok(results) if results.is_empty() => {
            println!("\n  [!] No connected Android devices found.");
            println!("      Make sure USB debugging is enabled and the device is connected.");
        }
        Ok(results) => {
            println!("\n  Found {} device(s):\n", results.len());
            println!("{}", render_results(&results));
        }
        Err(err) if err.is_bridge_unavailable() => {
            println!("\n  [!] adb not found on PATH. Install Android platform-tools first.");
        }
        Err(err) => println!("\n  [!] {}", err.error),
    }
}

fn render_results(results: &[ActionResult]) -> String {
    results
        .iter()
        .map(|row| {
            let tag = if row.ok { "OK" } else { "FAIL" };
            format!("    [{tag}] {} ({}) -> {}", row.model, row.serial, row.message)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `None` means EOF: the operator closed stdin, treat it as quit.
fn prompt(label: &str) -> Option<String> {
    print!("{label}");
    let _ = io::stdout().flush();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
    }
}

fn new_trace_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_menu_choices() {
        assert_eq!(MenuChoice::parse("1"), MenuChoice::Enable);
        assert_eq!(MenuChoice::parse(" q "), MenuChoice::Quit);
        assert_eq!(MenuChoice::parse("Q"), MenuChoice::Quit);
        assert_eq!(MenuChoice::parse("7"), MenuChoice::Unknown);
        assert_eq!(MenuChoice::parse(""), MenuChoice::Unknown);
    }

    #[test]
    fn renders_result_rows() {
        let results = vec![
            ActionResult {
                ok: true,
                model: "Pixel_7".to_string(),
                serial: "ABC".to_string(),
                message: "proxy set to 192.168.1.5:9090".to_string(),
            },
            ActionResult {
                ok: false,
                model: "unknown".to_string(),
                serial: "DEF".to_string(),
                message: "timed out".to_string(),
            },
        ];
        let rendered = render_results(&results);
        assert!(rendered.contains("[OK] Pixel_7 (ABC) -> proxy set to 192.168.1.5:9090"));
        assert!(rendered.contains("[FAIL] unknown (DEF) -> timed out"));
    }
}
