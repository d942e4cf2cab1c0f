use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use tracing::error;

use keymux_core::{HttpMethod, ProxyEngine, ProxyRequest, UpstreamHttpResponse};
use keymux_provider_core::Headers;

use crate::envelope::{dispatch_error, envelope};

#[derive(Clone)]
struct ProxyState {
    engine: Arc<ProxyEngine>,
}

pub fn proxy_router(engine: Arc<ProxyEngine>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/favicon.ico", get(|| async { StatusCode::NO_CONTENT }))
        .route("/robots.txt", get(robots))
        .fallback(proxy_handler)
        .with_state(ProxyState { engine })
}

async fn index() -> Response {
    Json(serde_json::json!({
        "name": "keymux",
        "status": "ok",
    }))
    .into_response()
}

async fn robots() -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "User-agent: *\nDisallow: /\n",
    )
        .into_response()
}

async fn proxy_handler(
    State(state): State<ProxyState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let trace_id = uuid::Uuid::now_v7().to_string();
    let Some(method) = HttpMethod::from_http(&method) else {
        return envelope(400, "Unsupported method", "INVALID_ARGUMENT");
    };

    let req = ProxyRequest {
        trace_id,
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: headers_to_vec(&headers),
        body,
    };

    match state.engine.dispatch(req).await {
        Ok(resp) => to_axum_response(resp),
        Err(err) => {
            if err.status() >= 500 {
                error!(event = "dispatch_error", error = %err);
            }
            dispatch_error(&err)
        }
    }
}

fn headers_to_vec(headers: &HeaderMap) -> Headers {
    let mut out = Vec::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            out.push((name.as_str().to_string(), value.to_string()));
        }
    }
    out
}

/// Copies the upstream response back verbatim, minus hop-by-hop and framing
/// headers (hyper sets framing itself).
fn to_axum_response(resp: UpstreamHttpResponse) -> Response {
    let mut builder = Response::builder().status(resp.status);
    if let Some(out) = builder.headers_mut() {
        for (name, value) in resp.headers {
            if is_hop_by_hop_or_framing_header(&name) {
                continue;
            }
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                out.append(name, value);
            }
        }
    }
    builder
        .body(Body::from(resp.body))
        .unwrap_or_else(|_| envelope(500, "Response build failed", "INTERNAL"))
}

fn is_hop_by_hop_or_framing_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("connection")
        || name.eq_ignore_ascii_case("keep-alive")
        || name.eq_ignore_ascii_case("proxy-authenticate")
        || name.eq_ignore_ascii_case("proxy-authorization")
        || name.eq_ignore_ascii_case("te")
        || name.eq_ignore_ascii_case("trailer")
        || name.eq_ignore_ascii_case("transfer-encoding")
        || name.eq_ignore_ascii_case("upgrade")
        || name.eq_ignore_ascii_case("content-length")
}
