use crate::error::AppError;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub const SCHEMA_VERSION: &str = "1.0";

/// Non-fatal import/render diagnostics, surfaced to the caller instead of
/// being printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub code: &'static str,
    pub message: String,
}

impl Warning {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
    pub suggested_action: &'static str,
}

impl From<&AppError> for ErrorDetail {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            retryable: err.retryable(),
            suggested_action: err.suggested_action(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StageMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Metrics {
    pub duration_ms: u64,
    pub stages: StageMetrics,
}

/// Machine-readable result wrapper written to stdout by every command.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub schema_version: &'static str,
    pub request_id: String,
    pub ok: bool,
    pub command: &'static str,
    pub result: Option<T>,
    pub warnings: Vec<Warning>,
    pub errors: Vec<ErrorDetail>,
    pub metrics: Metrics,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(
        command: &'static str,
        request_id: String,
        result: T,
        warnings: Vec<Warning>,
        metrics: Metrics,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            request_id,
            ok: true,
            command,
            result: Some(result),
            warnings,
            errors: Vec::new(),
            metrics,
        }
    }

    pub fn failure(
        command: &'static str,
        request_id: String,
        error: &AppError,
        metrics: Metrics,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            request_id,
            ok: false,
            command,
            result: None,
            warnings: Vec::new(),
            errors: vec![ErrorDetail::from(error)],
            metrics,
        }
    }
}

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Process-unique request id: epoch seconds, a monotonic per-process tick,
/// and a short hex salt.
pub fn request_id() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let tick = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let salt = u64::from(now.subsec_micros()) & 0xffff;
    format!("req_{}_{tick}_{salt:04x}", now.as_secs())
}
