//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

use crate::error::{CoreError, CoreResult};
use crate::logging::LogConfig;

/// Cache generation name used when none is configured.
pub const DEFAULT_CACHE_NAME: &str = "djangopwa-v2";

/// Assets pre-cached at install when no manifest is configured.
pub const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "/static/images/logo.png",
    "/static/images/favicon.ico",
    "/static/styles/main.css",
    "/lessons-repository/",
];

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Offline cache controller settings
    pub offline: OfflineConfig,

    /// Page interaction settings
    pub page: PageConfig,

    /// Logging settings
    pub logging: LogConfig,
}

/// Offline cache controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Origin every manifest path and request is resolved against
    pub origin: Url,

    /// Name of the current cache generation
    pub cache_name: String,

    /// Absolute paths pre-cached at install
    pub manifest: Vec<String>,

    /// Generated manifest file; replaces `manifest` when set
    pub manifest_path: Option<PathBuf>,

    /// Path served when the network is unreachable
    pub offline_fallback: String,

    /// User agent for live fetches
    pub user_agent: String,

    /// Live fetch timeout in seconds
    pub request_timeout_secs: u64,
}

/// Selectors, attribute names and element ids the page helpers look for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub dropdown_trigger_selector: String,
    pub dropdown_menu_selector: String,
    pub menu_attribute: String,
    pub nav_item_selector: String,
    pub url_attribute: String,
    pub reverse_checkbox_id: String,
    pub practice_form_id: String,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            origin: Url::parse("http://localhost:8000/").expect("static origin is valid"),
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            manifest: DEFAULT_MANIFEST.iter().map(|s| s.to_string()).collect(),
            manifest_path: None,
            offline_fallback: "/".to_string(),
            user_agent: format!("LLApp-Offline/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            dropdown_trigger_selector: ".dropdown-btn".to_string(),
            dropdown_menu_selector: ".dropdown-menu".to_string(),
            menu_attribute: "data-menu".to_string(),
            nav_item_selector: ".word-item".to_string(),
            url_attribute: "data-url".to_string(),
            reverse_checkbox_id: "reverse-practice".to_string(),
            practice_form_id: "practice-form".to_string(),
        }
    }
}

impl AppConfig {
    /// Parse a configuration from JSON text. Missing fields take defaults.
    pub fn from_json(text: &str) -> CoreResult<Self> {
        let config: AppConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration");
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load a configuration file, or use defaults if it does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the values the rest of the application relies on.
    pub fn validate(&self) -> CoreResult<()> {
        self.offline.validate()?;
        self.page.validate()
    }
}

impl OfflineConfig {
    /// Check cache name and fallback path.
    pub fn validate(&self) -> CoreResult<()> {
        if self.cache_name.trim().is_empty() {
            return Err(CoreError::config("offline.cache_name must not be empty"));
        }
        if !self.offline_fallback.starts_with('/') {
            return Err(CoreError::config(format!(
                "offline.offline_fallback must be an absolute path, got {:?}",
                self.offline_fallback
            )));
        }
        if self.origin.cannot_be_a_base() {
            return Err(CoreError::config(format!(
                "offline.origin cannot be used as a base URL: {}",
                self.origin
            )));
        }
        Ok(())
    }

    /// Resolve a path against the configured origin.
    pub fn resolve(&self, path: &str) -> CoreResult<Url> {
        Ok(self.origin.join(path)?)
    }
}

impl PageConfig {
    fn validate(&self) -> CoreResult<()> {
        let fields = [
            ("page.dropdown_trigger_selector", &self.dropdown_trigger_selector),
            ("page.dropdown_menu_selector", &self.dropdown_menu_selector),
            ("page.menu_attribute", &self.menu_attribute),
            ("page.nav_item_selector", &self.nav_item_selector),
            ("page.url_attribute", &self.url_attribute),
            ("page.reverse_checkbox_id", &self.reverse_checkbox_id),
            ("page.practice_form_id", &self.practice_form_id),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(CoreError::config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}
