//! `tabmap.toml` loading.
//!
//! Looked up at `--config PATH`, or in the platform config directory:
//! - Linux: ~/.config/tabmap/
//! - macOS: ~/Library/Application Support/dev.tabmap.tabmap/
//! - Windows: %APPDATA%/tabmap/tabmap/config/

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tabmap_llm::ProviderConfig;
use tabmap_map::PipelineConfig;

const APP_QUALIFIER: &str = "dev";
const APP_ORG: &str = "tabmap";
const APP_NAME: &str = "tabmap";
const CONFIG_FILENAME: &str = "tabmap.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub pipeline: PipelineConfig,
}

/// Values given on the command line; set fields replace file values.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub cell_budget: Option<usize>,
    pub seed: Option<u64>,
    pub narrate: bool,
}

impl AppConfig {
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(model) = overrides.model {
            self.provider.model = model;
        }
        if let Some(base_url) = overrides.base_url {
            self.provider.base_url = base_url;
        }
        if let Some(cell_budget) = overrides.cell_budget {
            self.pipeline.cell_budget = cell_budget;
        }
        if overrides.seed.is_some() {
            self.pipeline.seed = overrides.seed;
        }
        if overrides.narrate {
            self.pipeline.narrate_mapping = true;
        }
        self
    }
}

/// The default config file location, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Loads the configuration.
///
/// An explicit path must exist. A missing file at the default location
/// yields defaults. A file that does not parse is always an error.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    match explicit {
        Some(path) => read_config(path),
        None => match default_config_path() {
            Some(path) => load_optional(&path),
            None => {
                tracing::warn!("could not determine config directory, using defaults");
                Ok(AppConfig::default())
            }
        },
    }
}

/// Reads `path`, falling back to defaults if it does not exist.
pub fn load_optional(path: &Path) -> Result<AppConfig> {
    match fs::read_to_string(path) {
        Ok(content) => parse_config(&content, path),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(AppConfig::default())
        }
        Err(e) => {
            Err(e).with_context(|| format!("failed to read config file {}", path.display()))
        }
    }
}

fn read_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&content, path)
}

fn parse_config(content: &str, path: &Path) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(content)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded config");
    Ok(config)
}
