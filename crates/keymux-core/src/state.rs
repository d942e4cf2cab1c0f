use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use keymux_common::GlobalConfig;
use keymux_provider_core::{ApiFlavor, KeyPool, ProviderSettings};

use crate::provider_client::ProviderClient;
use crate::route::Route;
use crate::upstream_client::UpstreamClient;

/// Immutable configuration snapshot consumed by the dispatcher.
///
/// Replaced wholesale on reload; readers observe either the old or the new
/// snapshot, never a partial one.
#[derive(Debug, Clone)]
pub struct ProxySnapshot {
    pub global: GlobalConfig,
    pub providers: Vec<ProviderSettings>,
    /// Key lists behind the built-in legacy `/gemini/*` and `/openai/*`
    /// aliases. Empty list: the alias is not constructible.
    pub gemini_keys: Vec<String>,
    pub openai_keys: Vec<String>,
}

impl ProxySnapshot {
    pub fn provider(&self, name: &str) -> Option<&ProviderSettings> {
        self.providers.iter().find(|p| p.name == name)
    }

    fn legacy_keys(&self, flavor: ApiFlavor) -> &[String] {
        match flavor {
            ApiFlavor::Gemini => &self.gemini_keys,
            ApiFlavor::OpenAI => &self.openai_keys,
        }
    }
}

/// Process-wide shared state: the config snapshot and the lazily populated
/// per-provider client cache.
pub struct AppState {
    pub snapshot: ArcSwap<ProxySnapshot>,
    clients: ArcSwap<HashMap<String, Arc<ProviderClient>>>,
    http: Arc<dyn UpstreamClient>,
}

impl AppState {
    pub fn new(snapshot: ProxySnapshot, http: Arc<dyn UpstreamClient>) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(snapshot),
            clients: ArcSwap::from_pointee(HashMap::new()),
            http,
        }
    }

    /// Replaces the snapshot and clears the client cache; subsequent requests
    /// lazily rebuild clients (and their rotation hints) from the new config.
    pub fn replace_snapshot(&self, snapshot: ProxySnapshot) {
        self.snapshot.store(Arc::new(snapshot));
        self.clients.store(Arc::new(HashMap::new()));
    }

    /// Cached or freshly built client for a resolved route. Two concurrent
    /// rebuilds of the same provider are tolerated; the last writer wins and
    /// both instances behave identically.
    pub fn client_for(&self, route: &Route) -> Option<Arc<ProviderClient>> {
        if let Some(client) = self.clients.load().get(&route.provider) {
            return Some(client.clone());
        }

        let snapshot = self.snapshot.load_full();
        let client = if route.legacy {
            let flavor = ApiFlavor::from_alias(&route.provider)?;
            let keys = snapshot.legacy_keys(flavor);
            if keys.is_empty() {
                return None;
            }
            Arc::new(ProviderClient::new(
                route.provider.clone(),
                flavor,
                flavor.default_base_url(),
                Arc::new(KeyPool::new(keys.to_vec())),
                self.http.clone(),
            ))
        } else {
            let settings = snapshot.provider(&route.provider)?;
            Arc::new(ProviderClient::from_settings(settings, self.http.clone()))
        };

        let name = route.provider.clone();
        let inserted = client.clone();
        self.clients.rcu(move |current| {
            let mut map = HashMap::clone(current);
            map.insert(name.clone(), inserted.clone());
            map
        });
        Some(client)
    }
}
