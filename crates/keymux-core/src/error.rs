use crate::upstream_client::{TransportErrorKind, UpstreamFailure};

/// Terminal outcome of a rotation loop that produced no forwardable response.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RotationError {
    #[error("provider has no api keys")]
    EmptyPool,
    #[error("upstream transport failure: {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },
    #[error("all keys exhausted without a decisive response")]
    Exhausted,
}

impl From<UpstreamFailure> for RotationError {
    fn from(failure: UpstreamFailure) -> Self {
        RotationError::Transport {
            kind: failure.kind,
            message: failure.message,
        }
    }
}

/// Client-visible dispatch failures; the router renders these as JSON
/// envelopes. Upstream responses, including non-rotation 4xx/5xx, are never
/// errors: they pass through verbatim.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatchError {
    #[error("Invalid API path")]
    InvalidRoute,
    #[error("Invalid access key")]
    AccessDenied,
    #[error("Provider not configured")]
    ProviderNotConfigured,
    #[error("Upstream request failed: {0}")]
    Transport(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::InvalidRoute => 400,
            DispatchError::AccessDenied => 401,
            DispatchError::ProviderNotConfigured => 503,
            DispatchError::Transport(_) | DispatchError::Internal(_) => 500,
        }
    }

    /// Envelope status string: `INVALID_ARGUMENT` for client faults,
    /// `INTERNAL` otherwise.
    pub fn status_label(&self) -> &'static str {
        match self {
            DispatchError::InvalidRoute | DispatchError::AccessDenied => "INVALID_ARGUMENT",
            _ => "INTERNAL",
        }
    }
}

impl From<RotationError> for DispatchError {
    fn from(err: RotationError) -> Self {
        match err {
            RotationError::EmptyPool => DispatchError::ProviderNotConfigured,
            RotationError::Transport { message, .. } => DispatchError::Transport(message),
            RotationError::Exhausted => {
                DispatchError::Transport("exhausted all keys without a clear error".to_string())
            }
        }
    }
}
