//! Core key-pool abstractions for keymux.
//!
//! This crate intentionally does **not** depend on axum or any concrete HTTP
//! client. It owns the per-provider key pool, the per-request key selection
//! state, and the in-band directive grammar; a higher layer performs IO.

pub mod config;
pub mod context;
pub mod directives;
pub mod flavor;
pub mod headers;
pub mod pool;

pub use config::{ProviderConfigError, ProviderSettings, validate_providers};
pub use context::RequestKeyContext;
pub use directives::{
    AuthDirectives, default_rotation_codes, parse_auth_header, parse_status_spec,
};
pub use flavor::ApiFlavor;
pub use headers::{Headers, header_get, header_remove, header_set, retain_headers};
pub use pool::KeyPool;
