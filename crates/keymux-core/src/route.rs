use keymux_provider_core::ApiFlavor;

use crate::state::ProxySnapshot;

/// A resolved `/{provider}/...` route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Lowercased provider name; the cache key.
    pub provider: String,
    /// Remainder of the path, always `/`-prefixed, with the query string
    /// re-attached.
    pub upstream_path: String,
    /// True when the provider is a built-in legacy alias rather than a
    /// configured record.
    pub legacy: bool,
}

/// Maps a request path to a provider route.
///
/// The first non-empty path segment is matched case-insensitively against
/// configured provider names; `gemini` and `openai` fall back to the built-in
/// legacy aliases when no configured provider claims the name.
pub fn resolve_route(path: &str, query: Option<&str>, snapshot: &ProxySnapshot) -> Option<Route> {
    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    let provider = segments.next()?.to_ascii_lowercase();

    let rest: Vec<&str> = segments.collect();
    let mut upstream_path = String::from("/");
    upstream_path.push_str(&rest.join("/"));
    if let Some(query) = query {
        upstream_path.push('?');
        upstream_path.push_str(query);
    }

    if snapshot.provider(&provider).is_some() {
        return Some(Route {
            provider,
            upstream_path,
            legacy: false,
        });
    }
    if ApiFlavor::from_alias(&provider).is_some() {
        return Some(Route {
            provider,
            upstream_path,
            legacy: true,
        });
    }
    None
}
