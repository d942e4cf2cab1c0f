#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use keymux_core::{
    TransportErrorKind, UpstreamClient, UpstreamFailure, UpstreamHttpRequest, UpstreamHttpResponse,
};

pub type AttemptResult = Result<UpstreamHttpResponse, UpstreamFailure>;

/// Upstream double: pops one scripted result per attempt and records every
/// request it saw.
pub struct ScriptedClient {
    script: Mutex<VecDeque<AttemptResult>>,
    requests: Mutex<Vec<UpstreamHttpRequest>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<AttemptResult>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, idx: usize) -> UpstreamHttpRequest {
        self.requests.lock().unwrap()[idx].clone()
    }
}

#[async_trait]
impl UpstreamClient for ScriptedClient {
    async fn send(&self, req: UpstreamHttpRequest) -> AttemptResult {
        self.requests.lock().unwrap().push(req);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("more attempts than scripted results")
    }
}

pub fn ok(status: u16, body: &str) -> AttemptResult {
    Ok(UpstreamHttpResponse {
        status,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: Bytes::from(body.to_string()),
    })
}

pub fn ok_with_headers(status: u16, headers: &[(&str, &str)], body: &str) -> AttemptResult {
    Ok(UpstreamHttpResponse {
        status,
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        body: Bytes::from(body.to_string()),
    })
}

pub fn transport_err(message: &str) -> AttemptResult {
    Err(UpstreamFailure {
        kind: TransportErrorKind::Connect,
        message: message.to_string(),
    })
}
