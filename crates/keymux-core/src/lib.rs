//! Dispatch engine for keymux: route resolution, per-provider clients with
//! key rotation, and the upstream HTTP transport.

pub mod bootstrap;
pub mod engine;
pub mod error;
pub mod provider_client;
pub mod route;
pub mod state;
pub mod upstream_client;

pub use bootstrap::{Bootstrap, CliArgs, ConfigSource};
pub use engine::{ProxyEngine, ProxyRequest};
pub use error::{DispatchError, RotationError};
pub use provider_client::ProviderClient;
pub use route::{Route, resolve_route};
pub use state::{AppState, ProxySnapshot};
pub use upstream_client::{
    HttpMethod, TransportErrorKind, UpstreamClient, UpstreamClientConfig, UpstreamFailure,
    UpstreamHttpRequest, UpstreamHttpResponse, WreqUpstreamClient,
};
