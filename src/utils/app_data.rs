use crate::index::types::IndexConfig;
use crate::utils::MIN_TOKEN_CHARS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "savor";
const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides the configured catalog path
pub const CATALOG_ENV: &str = "SAVOR_CATALOG";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Catalog snapshot to index (JSON array or JSON Lines)
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Suggestions returned when no limit is given
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Cached queries per loaded index (0 disables the cache)
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Derive index keys on all cores
    #[serde(default = "default_parallel_build")]
    pub parallel_build: bool,

    /// Shortest name/cuisine token indexed on its own
    #[serde(default = "default_min_token_chars")]
    pub min_token_chars: usize,
}

fn default_limit() -> usize {
    10
}

fn default_cache_size() -> usize {
    128
}

fn default_parallel_build() -> bool {
    true
}

fn default_min_token_chars() -> usize {
    MIN_TOKEN_CHARS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            default_limit: default_limit(),
            cache_size: default_cache_size(),
            parallel_build: default_parallel_build(),
            min_token_chars: default_min_token_chars(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    /// Load config from an explicit file, or return default if it does not exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .context("Failed to read config file")?;
            let config: AppConfig = serde_json::from_str(&content)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the app data directory
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(config_path, content)
            .context("Failed to write config file")?;
        Ok(())
    }

    /// Builder settings derived from this config
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig {
            parallel: self.parallel_build,
            min_token_chars: self.min_token_chars.max(1),
        }
    }

    /// Resolve the catalog path: explicit flag, then `SAVOR_CATALOG`, then config
    pub fn resolve_catalog(&self, flag: Option<&Path>) -> Result<PathBuf> {
        let env = std::env::var_os(CATALOG_ENV).map(PathBuf::from);
        resolve_catalog_from(flag, env, self.catalog_path.as_deref())
    }
}

fn resolve_catalog_from(
    flag: Option<&Path>,
    env: Option<PathBuf>,
    configured: Option<&Path>,
) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = env.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }
    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }
    anyhow::bail!(
        "No catalog configured. Pass --catalog <FILE>, set {}, or run 'savor config --catalog <FILE> --save'",
        CATALOG_ENV
    )
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}
