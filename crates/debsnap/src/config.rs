use std::path::Path;

use debsnap_fetch::FetchOptions;
use debsnap_resolve::ResolverConfig;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Default: `127.0.0.1:5000`
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Whole service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub fetch: FetchOptions,
    pub resolver: ResolverConfig,
}

impl AppConfig {
    /// Defaults, then `path` if it exists, then `DEBSNAP_*` variables
    /// (`DEBSNAP_SERVER__BIND`, `DEBSNAP_FETCH__MAX_ATTEMPTS`, ...).
    pub fn load(path: &Path) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("DEBSNAP_").split("__"))
            .extract()
    }
}
