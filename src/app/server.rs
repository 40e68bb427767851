use std::sync::{Arc, RwLock};

use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::app::actions::{self, EnableTarget};
use crate::app::adb::AdbBridge;
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::app::models::{ActionResult, ProxyTarget, StatusReport};

const INDEX_HTML: &str = include_str!("assets/index.html");

pub struct ServerState {
    pub bridge: AdbBridge,
    pub target: RwLock<ProxyTarget>,
}

impl ServerState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            bridge: AdbBridge::new(config.adb_program.clone()),
            target: RwLock::new(config.target()),
        }
    }

    fn current_target(&self, trace_id: &str) -> Result<ProxyTarget, AppError> {
        self.target
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| AppError::system("target lock poisoned", trace_id))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnableRequest {
    pub ip: Option<String>,
    pub port: Option<u16>,
    pub usb: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigRequest {
    pub ip: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub results: Vec<ActionResult>,
}

/// Omitted request fields fall back to the configured target; the
/// reconfigure endpoint exists to maintain that default.
fn resolve_enable_target(request: &EnableRequest, default: &ProxyTarget) -> EnableTarget {
    if request.usb.unwrap_or(false) {
        EnableTarget::Usb {
            tunnel_port: request.port.unwrap_or(default.port),
        }
    } else {
        EnableTarget::Wifi {
            host: request
                .ip
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .unwrap_or(&default.host)
                .to_string(),
            port: request.port.unwrap_or(default.port),
        }
    }
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/status", get(get_status))
        .route("/api/proxy/enable", post(enable_proxy))
        .route("/api/proxy/disable", post(disable_proxy))
        .route("/api/proxy/delete", post(delete_proxy))
        .route("/api/proxy/fix", post(fix_proxy))
        .route("/api/config", post(update_config))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let web_port = config.web_port;
    let state = Arc::new(ServerState::new(&config));
    info!(
        host = %config.proxy_host,
        proxy_port = config.proxy_port,
        web_port,
        adb = %config.adb_program,
        "dashboard listening"
    );
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", web_port))
        .await
        .map_err(|err| AppError::system(format!("failed to bind port {web_port}: {err}"), ""))?;
    axum::serve(listener, router(state))
        .await
        .map_err(|err| AppError::system(format!("server error: {err}"), ""))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// adb work is blocking subprocess I/O; keep it off the async workers.
async fn run_blocking<T, F>(trace_id: String, task: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| AppError::system(format!("worker task failed: {err}"), trace_id))?
}

async fn get_status(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<StatusReport>, AppError> {
    let trace_id = Uuid::new_v4().to_string();
    let target = state.current_target(&trace_id)?;
    let bridge = state.bridge.clone();
    let report = run_blocking(trace_id.clone(), move || {
        actions::status(&bridge, &target, &trace_id)
    })
    .await?;
    Ok(Json(report))
}

async fn enable_proxy(
    State(state): State<Arc<ServerState>>,
    request: Option<Json<EnableRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    let trace_id = Uuid::new_v4().to_string();
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let default = state.current_target(&trace_id)?;
    let target = resolve_enable_target(&request, &default);
    info!(trace_id = %trace_id, target = %target.setting_value(), "enable proxy requested");
    let bridge = state.bridge.clone();
    let results = run_blocking(trace_id.clone(), move || {
        actions::enable(&bridge, &target, &trace_id)
    })
    .await?;
    Ok(Json(ActionResponse { results }))
}

async fn disable_proxy(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<ActionResponse>, AppError> {
    let trace_id = Uuid::new_v4().to_string();
    let target = state.current_target(&trace_id)?;
    info!(trace_id = %trace_id, "disable proxy requested");
    let bridge = state.bridge.clone();
    let results = run_blocking(trace_id.clone(), move || {
        actions::disable(&bridge, target.port, &trace_id)
    })
    .await?;
    Ok(Json(ActionResponse { results }))
}

async fn delete_proxy(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<ActionResponse>, AppError> {
    let trace_id = Uuid::new_v4().to_string();
    let target = state.current_target(&trace_id)?;
    info!(trace_id = %trace_id, "delete proxy requested");
    let bridge = state.bridge.clone();
    let results = run_blocking(trace_id.clone(), move || {
        actions::delete(&bridge, target.port, &trace_id)
    })
    .await?;
    Ok(Json(ActionResponse { results }))
}

/// Auto-fix is enable with the configured target; stale and tunnel-less
/// devices get re-pointed at the last-known-good address.
async fn fix_proxy(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<ActionResponse>, AppError> {
    let trace_id = Uuid::new_v4().to_string();
    let default = state.current_target(&trace_id)?;
    let target = EnableTarget::Wifi {
        host: default.host,
        port: default.port,
    };
    info!(trace_id = %trace_id, target = %target.setting_value(), "auto-fix requested");
    let bridge = state.bridge.clone();
    let results = run_blocking(trace_id.clone(), move || {
        actions::enable(&bridge, &target, &trace_id)
    })
    .await?;
    Ok(Json(ActionResponse { results }))
}

async fn update_config(
    State(state): State<Arc<ServerState>>,
    request: Option<Json<ConfigRequest>>,
) -> Result<Json<ProxyTarget>, AppError> {
    let trace_id = Uuid::new_v4().to_string();
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let mut guard = state
        .target
        .write()
        .map_err(|_| AppError::system("target lock poisoned", &trace_id))?;
    actions::reconfigure(&mut guard, request.ip, request.port);
    info!(trace_id = %trace_id, target = %guard.setting_value(), "target reconfigured");
    Ok(Json(guard.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_target() -> ProxyTarget {
        ProxyTarget {
            host: "192.168.1.5".to_string(),
            port: 9090,
        }
    }

    #[test]
    fn enable_request_falls_back_to_configured_target() {
        let target = resolve_enable_target(&EnableRequest::default(), &default_target());
        assert_eq!(
            target,
            EnableTarget::Wifi {
                host: "192.168.1.5".to_string(),
                port: 9090
            }
        );
    }

    #[test]
    fn enable_request_overrides_fields() {
        let request = EnableRequest {
            ip: Some("10.0.0.2".to_string()),
            port: Some(8888),
            usb: None,
        };
        let target = resolve_enable_target(&request, &default_target());
        assert_eq!(target.setting_value(), "10.0.0.2:8888");
    }

    #[test]
    fn usb_request_targets_loopback_relay() {
        let request = EnableRequest {
            ip: Some("10.0.0.2".to_string()),
            port: None,
            usb: Some(true),
        };
        let target = resolve_enable_target(&request, &default_target());
        assert_eq!(target, EnableTarget::Usb { tunnel_port: 9090 });
        assert_eq!(target.setting_value(), "127.0.0.1:9090");
    }

    #[test]
    fn dashboard_page_polls_and_pauses_during_actions() {
        assert!(INDEX_HTML.contains("fetch('/api/status')"));
        assert!(INDEX_HTML.contains("setInterval(fetchStatus, 5000)"));
        // Polling stops while an action is in flight and resumes after.
        assert!(INDEX_HTML.contains("clearInterval(refreshTimer)"));
    }

    #[test]
    fn blank_ip_in_request_is_ignored() {
        let request = EnableRequest {
            ip: Some("   ".to_string()),
            port: None,
            usb: None,
        };
        let target = resolve_enable_target(&request, &default_target());
        assert_eq!(target.setting_value(), "192.168.1.5:9090");
    }
}
