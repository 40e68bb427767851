//! Proxy setup tool for Android test devices.
//!
//! Runs as:
//! - Interactive terminal menu (default)
//! - Web dashboard (with `serve` subcommand)
//!
//! Usage:
//! - Menu mode: `droidproxy`
//! - Dashboard: `droidproxy serve`
//! - Dashboard on a custom port: `droidproxy serve --port 8088`

use droidproxy::app::adb::locator::validate_adb_program;
use droidproxy::app::config::AppConfig;
use droidproxy::app::logging::init_logging;
use droidproxy::app::{menu, server};

struct RuntimeArgs {
    serve: bool,
    web_port_override: Option<u16>,
}

fn parse_args() -> RuntimeArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = RuntimeArgs {
        serve: false,
        web_port_override: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "serve" => {
                parsed.serve = true;
                i += 1;
            }
            "--port" if i + 1 < args.len() => {
                parsed.web_port_override = args[i + 1].parse().ok().filter(|port| *port != 0);
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_help();
                std::process::exit(2);
            }
        }
    }

    parsed
}

fn print_help() {
    println!("droidproxy - proxy setup tool for Android test devices");
    println!();
    println!("USAGE:");
    println!("    droidproxy [COMMAND] [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    serve            Run the web dashboard instead of the terminal menu");
    println!();
    println!("OPTIONS:");
    println!("    --port <PORT>    Dashboard listening port (serve mode only)");
    println!("    -h, --help       Print help information");
    println!();
    println!("ENVIRONMENT:");
    println!("    PROXY_HOST       Proxy host address (default: auto-detected local IP)");
    println!("    PROXY_PORT       Proxy port (default: 9090)");
    println!("    PROXY_WEB_PORT   Dashboard port (default: 8080)");
    println!("    ADB_PATH         Path to the adb binary (default: adb on PATH)");
}

fn main() {
    init_logging();
    let args = parse_args();
    let mut config = AppConfig::from_env();
    if let Err(reason) = validate_adb_program(&config.adb_program) {
        eprintln!("Warning: {reason}");
    }

    if args.serve {
        if let Some(port) = args.web_port_override {
            config.web_port = port;
        }
        println!();
        println!("  Proxy Setup Web UI");
        println!("  ------------------");
        println!("  Host IP   : {}", config.proxy_host);
        println!("  Dashboard : http://localhost:{}", config.web_port);
        println!();

        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(err) => {
                eprintln!("Failed to create runtime: {err}");
                std::process::exit(1);
            }
        };
        if let Err(err) = rt.block_on(server::run(config)) {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    } else {
        menu::run_menu(config);
    }
}
