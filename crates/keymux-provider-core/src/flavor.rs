use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Credential-passing convention of an upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFlavor {
    OpenAI,
    Gemini,
}

const OPENAI_RATE_LIMITED_BODY: &str = r#"{"error":{"message":"All OpenAI API keys have been rate limited for this request","type":"rate_limit_exceeded","code":"rate_limit_exceeded"}}"#;
const GEMINI_RATE_LIMITED_BODY: &str = r#"{"error":{"code":429,"message":"All API keys have been rate limited for this request","status":"RESOURCE_EXHAUSTED"}}"#;

impl ApiFlavor {
    /// Header the client uses to talk to the proxy (directives included).
    pub fn auth_header(&self) -> &'static str {
        match self {
            ApiFlavor::OpenAI => "authorization",
            ApiFlavor::Gemini => "x-goog-api-key",
        }
    }

    /// Client headers forwarded to the upstream. Credential headers are
    /// excluded; the provider client attaches those itself.
    pub fn forwarded_headers(&self) -> &'static [&'static str] {
        match self {
            ApiFlavor::OpenAI => &[
                "content-type",
                "accept",
                "user-agent",
                "openai-organization",
                "openai-project",
            ],
            ApiFlavor::Gemini => &["content-type", "accept", "user-agent", "x-goog-user-project"],
        }
    }

    /// Base URL of the built-in provider behind the legacy `/openai/*` and
    /// `/gemini/*` aliases. Version-free: legacy clients carry the version
    /// segment in their own path.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ApiFlavor::OpenAI => "https://api.openai.com",
            ApiFlavor::Gemini => "https://generativelanguage.googleapis.com",
        }
    }

    /// Flavor for a legacy alias path segment, if it names one.
    pub fn from_alias(name: &str) -> Option<Self> {
        match name {
            "openai" => Some(ApiFlavor::OpenAI),
            "gemini" => Some(ApiFlavor::Gemini),
            _ => None,
        }
    }

    /// Synthetic 429 body returned when every key was rate limited and no
    /// upstream response body is available to pass through.
    pub fn rate_limited_body(&self) -> Bytes {
        match self {
            ApiFlavor::OpenAI => Bytes::from_static(OPENAI_RATE_LIMITED_BODY.as_bytes()),
            ApiFlavor::Gemini => Bytes::from_static(GEMINI_RATE_LIMITED_BODY.as_bytes()),
        }
    }
}

impl std::fmt::Display for ApiFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiFlavor::OpenAI => f.write_str("openai"),
            ApiFlavor::Gemini => f.write_str("gemini"),
        }
    }
}
