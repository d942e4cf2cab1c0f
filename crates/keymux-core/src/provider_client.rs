use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::{info, warn};

use keymux_provider_core::{
    ApiFlavor, Headers, KeyPool, ProviderSettings, default_rotation_codes, header_get,
    header_remove, header_set,
};

use crate::error::RotationError;
use crate::upstream_client::{
    HttpMethod, UpstreamClient, UpstreamFailure, UpstreamHttpRequest, UpstreamHttpResponse,
};

pub const GOOG_API_KEY_HEADER: &str = "x-goog-api-key";

/// Per-provider upstream client: owns the key pool and drives the rotation
/// loop. One instance is shared by all requests for its provider until the
/// configuration snapshot is replaced.
pub struct ProviderClient {
    name: String,
    flavor: ApiFlavor,
    base_url: String,
    pool: Arc<KeyPool>,
    http: Arc<dyn UpstreamClient>,
}

impl ProviderClient {
    pub fn new(
        name: impl Into<String>,
        flavor: ApiFlavor,
        base_url: impl Into<String>,
        pool: Arc<KeyPool>,
        http: Arc<dyn UpstreamClient>,
    ) -> Self {
        Self {
            name: name.into(),
            flavor,
            base_url: base_url.into(),
            pool,
            http,
        }
    }

    pub fn from_settings(settings: &ProviderSettings, http: Arc<dyn UpstreamClient>) -> Self {
        Self::new(
            settings.name.clone(),
            settings.flavor,
            settings.base_url.clone(),
            Arc::new(KeyPool::new(settings.keys.clone())),
            http,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flavor(&self) -> ApiFlavor {
        self.flavor
    }

    pub fn pool(&self) -> &Arc<KeyPool> {
        &self.pool
    }

    /// Forwards one client request upstream, rotating keys on rotation-code
    /// responses and transport errors until a decisive response arrives or
    /// the pool is exhausted.
    ///
    /// Attempts are strictly sequential; at most one is in flight.
    pub async fn make_request(
        &self,
        trace_id: &str,
        method: HttpMethod,
        path: &str,
        body: Option<Bytes>,
        mut headers: Headers,
        rotation_codes: Option<&BTreeSet<u16>>,
    ) -> Result<UpstreamHttpResponse, RotationError> {
        // Client-supplied key bypass: the caller overrides the pool, so
        // rotation is disabled and exactly one attempt is made.
        if self.flavor == ApiFlavor::Gemini
            && let Some(key) = header_remove(&mut headers, GOOG_API_KEY_HEADER)
        {
            let req = self.build_attempt(method, path, &headers, body, &key, true);
            return self
                .send_attempt(trace_id, 1, req)
                .await
                .map_err(RotationError::from);
        }

        if self.pool.is_empty() {
            return Err(RotationError::EmptyPool);
        }

        let default_codes;
        let codes = match rotation_codes {
            Some(codes) => codes,
            None => {
                default_codes = default_rotation_codes();
                &default_codes
            }
        };

        let mut ctx = self.pool.new_context();
        let mut last_response: Option<UpstreamHttpResponse> = None;
        let mut last_error: Option<UpstreamFailure> = None;
        let mut attempt = 0u32;

        while let Some(key) = ctx.next_key() {
            attempt += 1;
            let req = self.build_attempt(method, path, &headers, body.clone(), &key, false);
            match self.send_attempt(trace_id, attempt, req).await {
                Err(failure) => {
                    last_error = Some(failure);
                }
                Ok(resp) if codes.contains(&resp.status) => {
                    info!(
                        event = "key_rotation",
                        trace_id = %trace_id,
                        provider = %self.name,
                        attempt = attempt,
                        status = resp.status,
                        remaining = self.pool.len() - ctx.tried_count(),
                    );
                    ctx.mark_rate_limited(&key);
                    last_response = Some(resp);
                }
                Ok(resp) => {
                    self.pool
                        .update_last_failed_key(ctx.last_failed_in_request());
                    return Ok(resp);
                }
            }
        }

        self.pool
            .update_last_failed_key(ctx.last_failed_in_request());

        if ctx.all_tried_are_rate_limited() {
            // Prefer the last upstream 429 body over the synthetic one.
            return Ok(last_response.unwrap_or_else(|| self.synthetic_rate_limited()));
        }
        if let Some(failure) = last_error {
            return Err(failure.into());
        }
        Err(RotationError::Exhausted)
    }

    fn build_attempt(
        &self,
        method: HttpMethod,
        path: &str,
        headers: &Headers,
        body: Option<Bytes>,
        key: &str,
        bypass: bool,
    ) -> UpstreamHttpRequest {
        let mut url = join_upstream_url(&self.base_url, path);
        let mut headers = headers.clone();

        match (self.flavor, bypass) {
            (ApiFlavor::OpenAI, _) => {
                // A client-supplied bearer wins over the pool key.
                if header_get(&headers, "authorization").is_none() {
                    header_set(&mut headers, "authorization", format!("Bearer {key}"));
                }
            }
            (ApiFlavor::Gemini, true) => {
                header_set(&mut headers, GOOG_API_KEY_HEADER, key);
            }
            (ApiFlavor::Gemini, false) => {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str("key=");
                url.push_str(&urlencoding::encode(key));
            }
        }

        if header_get(&headers, "content-type").is_none() {
            header_set(&mut headers, "content-type", "application/json");
        }
        let body = body.filter(|body| !body.is_empty());
        if let Some(body) = &body
            && method != HttpMethod::Get
        {
            header_set(&mut headers, "content-length", body.len().to_string());
        }

        UpstreamHttpRequest {
            method,
            url,
            headers,
            body,
        }
    }

    async fn send_attempt(
        &self,
        trace_id: &str,
        attempt: u32,
        req: UpstreamHttpRequest,
    ) -> Result<UpstreamHttpResponse, UpstreamFailure> {
        info!(
            event = "upstream_request",
            trace_id = %trace_id,
            provider = %self.name,
            attempt = attempt,
            method = %req.method,
            url = %redact_query(&req.url),
        );
        let started = Instant::now();
        match self.http.send(req).await {
            Ok(resp) => {
                info!(
                    event = "upstream_response",
                    trace_id = %trace_id,
                    provider = %self.name,
                    attempt = attempt,
                    status = resp.status,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                );
                Ok(resp)
            }
            Err(failure) => {
                warn!(
                    event = "upstream_response",
                    trace_id = %trace_id,
                    provider = %self.name,
                    attempt = attempt,
                    status = "error",
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %failure,
                );
                Err(failure)
            }
        }
    }

    fn synthetic_rate_limited(&self) -> UpstreamHttpResponse {
        UpstreamHttpResponse {
            status: 429,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: self.flavor.rate_limited_body(),
        }
    }
}

/// Joins base URL and upstream path with exactly one `/`, reconciling version
/// segments: a `/vX/...` path routed through a base pinned to `/vY` replaces
/// the base's version when X differs from Y.
pub fn join_upstream_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let (path_only, query) = match path.find('?') {
        Some(idx) => (&path[..idx], &path[idx..]),
        None => (path, ""),
    };
    if path_only.is_empty() || path_only == "/" {
        return format!("{base}{query}");
    }
    let path_only = path_only.strip_prefix('/').unwrap_or(path_only);

    let mut base = base;
    if let (Some(base_version), Some(path_version)) =
        (trailing_version(base), leading_version(path_only))
        && base_version != path_version
    {
        base = &base[..base.len() - base_version.len() - 1];
    }
    format!("{base}/{path_only}{query}")
}

/// Version segment at the tail of a base URL (`.../v1` → `v1`).
fn trailing_version(base: &str) -> Option<&str> {
    let idx = base.rfind('/')?;
    // Don't mistake the host for a path segment.
    if !base[..idx].contains("://") {
        return None;
    }
    let tail = &base[idx + 1..];
    is_version_segment(tail).then_some(tail)
}

/// Version segment at the front of a path (`v1beta/models/...` → `v1beta`).
fn leading_version(path: &str) -> Option<&str> {
    let (head, rest) = path.split_once('/')?;
    if rest.is_empty() {
        return None;
    }
    is_version_segment(head).then_some(head)
}

fn is_version_segment(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() >= 2
        && bytes[0] == b'v'
        && bytes[1].is_ascii_digit()
        && segment[1..].chars().all(|c| c.is_ascii_alphanumeric())
}

fn redact_query(url: &str) -> &str {
    match url.find('?') {
        Some(idx) => &url[..idx],
        None => url,
    }
}
