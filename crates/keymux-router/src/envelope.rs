use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use keymux_core::DispatchError;

/// JSON error envelope shared by dispatch and admin failures.
pub(crate) fn envelope(status: u16, message: &str, label: &str) -> Response {
    let payload = serde_json::json!({
        "error": { "code": status, "message": message, "status": label }
    });
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(payload)).into_response()
}

pub(crate) fn dispatch_error(err: &DispatchError) -> Response {
    envelope(err.status(), &err.to_string(), err.status_label())
}
