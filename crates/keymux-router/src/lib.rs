//! HTTP surface for keymux: the proxy fallback route, the handful of
//! non-proxied paths, and the admin reload endpoint.

mod admin;
mod envelope;
mod proxy;

pub use admin::admin_router;
pub use proxy::proxy_router;
