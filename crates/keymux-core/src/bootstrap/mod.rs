use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

use keymux_common::GlobalConfigPatch;
use keymux_provider_core::{ProviderSettings, validate_providers};

use crate::state::{AppState, ProxySnapshot};
use crate::upstream_client::{UpstreamClient, UpstreamClientConfig, WreqUpstreamClient};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "keymux",
    version,
    about = "Key-pooling reverse proxy for LLM HTTP APIs"
)]
pub struct CliArgs {
    /// Path to the JSON configuration file.
    #[arg(long, env = "KEYMUX_CONFIG", default_value = "keymux.json")]
    pub config: PathBuf,

    /// Bind host.
    #[arg(long, env = "KEYMUX_HOST")]
    pub host: Option<String>,

    /// Bind port.
    #[arg(long, env = "KEYMUX_PORT")]
    pub port: Option<u16>,

    /// Admin key guarding the reload endpoint.
    #[arg(long, env = "KEYMUX_ADMIN_KEY")]
    pub admin_key: Option<String>,

    /// Optional outbound proxy for upstream requests.
    #[arg(long, env = "KEYMUX_PROXY")]
    pub proxy: Option<String>,
}

impl CliArgs {
    fn as_patch(&self) -> GlobalConfigPatch {
        GlobalConfigPatch {
            host: self.host.clone(),
            port: self.port,
            admin_key: self.admin_key.clone(),
            proxy: self.proxy.clone(),
        }
    }
}

/// On-disk configuration document.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(flatten)]
    global: GlobalConfigPatch,
    #[serde(default)]
    providers: Vec<ProviderSettings>,
    /// Built-in pools behind the legacy `/gemini/*` and `/openai/*` aliases.
    #[serde(default)]
    gemini_keys: Vec<String>,
    #[serde(default)]
    openai_keys: Vec<String>,
}

/// Re-loadable configuration origin: the file plus the CLI/ENV overrides.
///
/// Merge order per field: CLI > ENV (clap resolves those two) > file.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    path: PathBuf,
    overrides: GlobalConfigPatch,
}

impl ConfigSource {
    pub fn new(path: PathBuf, overrides: GlobalConfigPatch) -> Self {
        Self { path, overrides }
    }

    pub fn load(&self) -> anyhow::Result<ProxySnapshot> {
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read config file {}", self.path.display()))?;
        let file: ConfigFile = serde_json::from_str(&raw)
            .with_context(|| format!("parse config file {}", self.path.display()))?;
        validate_providers(&file.providers).context("validate providers")?;

        let mut patch = file.global;
        patch.overlay(self.overrides.clone());
        let global = patch.into_config().context("merge global config")?;

        Ok(ProxySnapshot {
            global,
            providers: file.providers,
            gemini_keys: file.gemini_keys,
            openai_keys: file.openai_keys,
        })
    }
}

pub struct Bootstrap {
    pub state: Arc<AppState>,
    pub source: ConfigSource,
}

pub fn bootstrap_from_env() -> anyhow::Result<Bootstrap> {
    bootstrap(CliArgs::parse())
}

pub fn bootstrap(args: CliArgs) -> anyhow::Result<Bootstrap> {
    let source = ConfigSource::new(args.config.clone(), args.as_patch());
    let snapshot = source.load()?;

    let http: Arc<dyn UpstreamClient> = Arc::new(
        WreqUpstreamClient::new(UpstreamClientConfig {
            proxy: snapshot.global.proxy.clone(),
            ..Default::default()
        })
        .context("build upstream client")?,
    );
    let state = Arc::new(AppState::new(snapshot, http));
    Ok(Bootstrap { state, source })
}
