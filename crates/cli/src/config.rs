//! `rulebook.toml` loading.
//!
//! ```toml
//! [simulation]
//! default_base_rate = "100"
//! money_scale = 2
//!
//! [[simulation.fees]]
//! name = "Policy Fee"
//! amount = "25"
//!
//! [[simulation.taxes]]
//! name = "Premium Tax"
//! rate = "0.03"
//!
//! [conflicts]
//! open_ended = "skip"          # or "unbounded"
//! max_dependency_visits = 10000
//! ```
//!
//! Every key is optional; missing sections keep their defaults.

use serde::Deserialize;
use std::path::Path;

use rulebook_analyze::ConflictPolicy;
use rulebook_eval::SimulationConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RulebookConfig {
    pub simulation: SimulationConfig,
    pub conflicts: ConflictPolicy,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Load the config file at `path`, or the defaults when no path is given.
pub(crate) fn load(path: Option<&Path>) -> Result<RulebookConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(RulebookConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let cfg = parse(&text).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %path.display(), "loaded config");
    Ok(cfg)
}

fn parse(text: &str) -> Result<RulebookConfig, toml::de::Error> {
    toml::from_str(text)
}
