use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use keymux_provider_core::{
    ApiFlavor, AuthDirectives, Headers, header_remove, header_set, parse_auth_header,
    retain_headers,
};

use crate::error::DispatchError;
use crate::state::AppState;
use crate::route::resolve_route;
use crate::upstream_client::{HttpMethod, UpstreamHttpResponse};

/// One transport-agnostic client request as seen by the dispatcher.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub trace_id: String,
    pub method: HttpMethod,
    pub path: String,
    pub query: Option<String>,
    pub headers: Headers,
    pub body: Bytes,
}

/// Glues route resolution, directive extraction, the access gate and the
/// per-provider client together.
#[derive(Clone)]
pub struct ProxyEngine {
    state: Arc<AppState>,
}

impl ProxyEngine {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub async fn dispatch(
        &self,
        req: ProxyRequest,
    ) -> Result<UpstreamHttpResponse, DispatchError> {
        let snapshot = self.state.snapshot.load_full();
        let route = resolve_route(&req.path, req.query.as_deref(), &snapshot)
            .ok_or(DispatchError::InvalidRoute)?;

        let settings = snapshot.provider(&route.provider);
        let flavor = match settings {
            Some(settings) => settings.flavor,
            // Legacy aliases carry their flavor in the name.
            None => ApiFlavor::from_alias(&route.provider)
                .ok_or(DispatchError::ProviderNotConfigured)?,
        };

        let mut headers = req.headers;
        let directives = match header_remove(&mut headers, flavor.auth_header()) {
            Some(raw) => parse_auth_header(&raw),
            None => AuthDirectives::default(),
        };

        if let Some(required) = settings.and_then(|s| s.access_key.as_deref()) {
            if directives.access_key.as_deref() != Some(required) {
                warn!(
                    event = "access_denied",
                    trace_id = %req.trace_id,
                    provider = %route.provider,
                );
                return Err(DispatchError::AccessDenied);
            }
        }

        let client = self
            .state
            .client_for(&route)
            .ok_or(DispatchError::ProviderNotConfigured)?;

        retain_headers(&mut headers, flavor.forwarded_headers());
        if let Some(cleaned) = directives.cleaned {
            header_set(&mut headers, flavor.auth_header(), cleaned);
        }

        info!(
            event = "proxy_request",
            trace_id = %req.trace_id,
            provider = %route.provider,
            flavor = %flavor,
            method = %req.method,
            path = %route.upstream_path,
            body_bytes = req.body.len(),
        );

        let body = (!req.body.is_empty()).then_some(req.body);
        let response = client
            .make_request(
                &req.trace_id,
                req.method,
                &route.upstream_path,
                body,
                headers,
                directives.status_codes.as_ref(),
            )
            .await?;
        Ok(response)
    }
}
