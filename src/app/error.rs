use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::fmt;

pub const ERR_VALIDATION: &str = "ERR_VALIDATION";
pub const ERR_BRIDGE_UNAVAILABLE: &str = "ERR_BRIDGE_UNAVAILABLE";
pub const ERR_BRIDGE_TIMEOUT: &str = "ERR_BRIDGE_TIMEOUT";
pub const ERR_DEVICE_UNREACHABLE: &str = "ERR_DEVICE_UNREACHABLE";
pub const ERR_SYSTEM: &str = "ERR_SYSTEM";

#[derive(Debug, Clone, Serialize)]
pub struct AppError {
    pub error: String,
    pub code: String,
    pub trace_id: String,
}

impl AppError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            trace_id: trace_id.into(),
        }
    }

    pub fn validation(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_VALIDATION, message, trace_id)
    }

    /// The adb executable itself could not be invoked. Fatal for the whole request.
    pub fn bridge_unavailable(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_BRIDGE_UNAVAILABLE, message, trace_id)
    }

    /// An external call overran its timeout. Scoped like a device failure but
    /// labeled distinctly so a hung adb server is diagnosable.
    pub fn bridge_timeout(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_BRIDGE_TIMEOUT, message, trace_id)
    }

    /// A single device failed mid-call. Recorded in that device's result row.
    pub fn device_unreachable(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_DEVICE_UNREACHABLE, message, trace_id)
    }

    pub fn system(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_SYSTEM, message, trace_id)
    }

    pub fn is_bridge_unavailable(&self) -> bool {
        self.code == ERR_BRIDGE_UNAVAILABLE
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.error, self.code)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            ERR_VALIDATION => StatusCode::BAD_REQUEST,
            ERR_BRIDGE_UNAVAILABLE => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_code_and_trace_id() {
        let err = AppError::bridge_timeout("adb timed out", "trace-1");
        assert_eq!(err.code, ERR_BRIDGE_TIMEOUT);
        assert_eq!(err.trace_id, "trace-1");
        assert_eq!(err.to_string(), "adb timed out (ERR_BRIDGE_TIMEOUT)");
    }

    #[test]
    fn distinguishes_bridge_unavailable() {
        assert!(AppError::bridge_unavailable("no adb", "t").is_bridge_unavailable());
        assert!(!AppError::device_unreachable("gone", "t").is_bridge_unavailable());
    }
}
