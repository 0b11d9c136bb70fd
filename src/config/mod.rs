//! File and environment based client configuration
//!
//! Settings are read from `config.toml` in the user's config directory (or an
//! explicit path), then overridden by environment variables. A `.env` file in
//! the working directory is honored.

use crate::api::{
    Client, ClientPreferences, DefaultParameters, HttpTransport, ResponseMode, UrlParameters,
    DEFAULT_MODULES,
};
use crate::api::constants::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const ENV_AUTH_TOKEN: &str = "ZOHO_CRM_AUTHTOKEN";
pub const ENV_BASE_URL: &str = "ZOHO_CRM_BASE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub response_mode: ResponseMode,
    pub auto_fetch_paginated: bool,
    pub modules: Vec<String>,
    pub default_parameters: DefaultParameters,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let preferences = ClientPreferences::default();
        Self {
            auth_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            response_mode: preferences.response_mode,
            auto_fetch_paginated: preferences.auto_fetch_paginated_requests,
            modules: DEFAULT_MODULES.iter().map(|m| m.to_string()).collect(),
            default_parameters: DefaultParameters::default(),
        }
    }
}

impl ClientConfig {
    /// Path of the default config file
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("zoho-crm");
        Ok(config_dir.join("config.toml"))
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file: {:?}", path))
    }

    /// Load from `path`, or the default location when it exists, then apply
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::default_path()?;
                if default_path.exists() {
                    log::debug!("Loading config from: {:?}", default_path);
                    Self::from_file(&default_path)?
                } else {
                    log::debug!("No config file at {:?}, using defaults", default_path);
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from environment lookups
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_AUTH_TOKEN).filter(|t| !t.is_empty()) {
            self.auth_token = Some(token);
        }
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|u| !u.is_empty()) {
            self.base_url = base_url;
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Build a client with an HTTP transport for this configuration
    pub fn into_client(self) -> Result<Client> {
        let auth_token = self.auth_token.with_context(|| {
            format!("No auth token configured; set {} or auth_token in config.toml", ENV_AUTH_TOKEN)
        })?;

        let transport = HttpTransport::new(self.base_url, Duration::from_secs(self.timeout_secs))?;
        let default_parameters: UrlParameters = self.default_parameters.into();

        let client = Client::builder()
            .auth_token(auth_token)
            .modules(self.modules)
            .default_parameters(default_parameters)
            .response_mode(self.response_mode)
            .auto_fetch_paginated_requests(self.auto_fetch_paginated)
            .transport(Arc::new(transport))
            .build()?;

        Ok(client)
    }
}
