use tracing_subscriber::EnvFilter;

/// Log lines go to stderr: menu mode owns stdout for its prompts and result
/// rows. `RUST_LOG` overrides the default filter; the default keeps the HTTP
/// layers quiet so the 5s status polls do not drown operator actions.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=warn,hyper=warn"));

    if cfg!(debug_assertions) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .with_target(false)
            .try_init();
    }
}
