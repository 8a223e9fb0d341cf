//! Profile configuration
//!
//! A static TOML profile under the user config dir names the remote store and
//! tab; `ORDERDESK_*` environment variables override it. The API key is never
//! read from the file, only from the environment (a `.env` file works via
//! dotenvy, loaded in main).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::sync::columns::ColumnMap;

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_API_KEY_ENV: &str = "ORDERDESK_API_KEY";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub tab: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Optional sparse field → column override table. Fields omitted here
    /// become unsupported and are rejected before any network call.
    #[serde(default)]
    pub columns: Option<HashMap<String, String>>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            spreadsheet_id: String::new(),
            tab: String::new(),
            api_key_env: default_api_key_env(),
            columns: None,
        }
    }
}

impl Profile {
    /// Load the profile: explicit path, else the default location, else
    /// built-in defaults. Environment overrides are applied afterwards.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut profile = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::default_path()?;
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Profile::default()
                }
            }
        };
        profile.apply_env_overrides();
        Ok(profile)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profile {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse profile {}", path.display()))
    }

    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("no user config directory available")?;
        Ok(dir.join("orderdesk").join("orderdesk.toml"))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("ORDERDESK_BASE_URL") {
            self.base_url = value;
        }
        if let Ok(value) = std::env::var("ORDERDESK_SPREADSHEET_ID") {
            self.spreadsheet_id = value;
        }
        if let Ok(value) = std::env::var("ORDERDESK_TAB") {
            self.tab = value;
        }
    }

    /// Resolve the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).with_context(|| {
            format!(
                "API key not found: set the {} environment variable",
                self.api_key_env
            )
        })
    }

    /// The effective column mapping: the profile's override table when
    /// present, the built-in layout otherwise
    pub fn column_map(&self) -> Result<ColumnMap> {
        match &self.columns {
            Some(overrides) => ColumnMap::from_overrides(overrides),
            None => Ok(ColumnMap::default()),
        }
    }

    /// Check the addressing context needed before any commit
    pub fn require_target(&self) -> Result<()> {
        if self.spreadsheet_id.trim().is_empty() {
            bail!("no spreadsheet configured: set spreadsheet_id in the profile or ORDERDESK_SPREADSHEET_ID");
        }
        if self.tab.trim().is_empty() {
            bail!("no target tab configured: set tab in the profile or ORDERDESK_TAB");
        }
        Ok(())
    }
}
