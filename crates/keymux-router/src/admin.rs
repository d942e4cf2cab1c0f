use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use tracing::{info, warn};

use keymux_core::AppState;
use keymux_core::bootstrap::ConfigSource;

use crate::envelope::envelope;

#[derive(Clone)]
struct AdminState {
    state: Arc<AppState>,
    source: ConfigSource,
}

/// Admin surface. The web UI lives elsewhere; this is only the narrow reload
/// interface the core exposes.
pub fn admin_router(state: Arc<AppState>, source: ConfigSource) -> Router {
    Router::new()
        .route("/reload", post(reload))
        .with_state(AdminState { state, source })
}

async fn reload(State(admin): State<AdminState>, headers: HeaderMap) -> Response {
    let Some(expected) = admin.state.snapshot.load().global.admin_key.clone() else {
        return envelope(503, "Admin key not configured", "INTERNAL");
    };
    let provided = headers.get("x-admin-key").and_then(|value| value.to_str().ok());
    if provided != Some(expected.as_str()) {
        warn!(event = "admin_denied");
        return envelope(401, "Invalid admin key", "INVALID_ARGUMENT");
    }

    match admin.source.load() {
        Ok(snapshot) => {
            let providers = snapshot.providers.len();
            admin.state.replace_snapshot(snapshot);
            info!(event = "config_reload", providers = providers);
            Json(serde_json::json!({ "status": "ok", "providers": providers })).into_response()
        }
        Err(err) => envelope(400, &format!("Config reload failed: {err:#}"), "INVALID_ARGUMENT"),
    }
}
