//! The fixed list of assets a cache generation guarantees.

use std::path::Path;

use llapp_core::{OfflineConfig, DEFAULT_MANIFEST};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{OfflineError, Result};

/// Ordered, validated list of absolute asset paths.
///
/// Serializes as a plain JSON array of paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct AssetManifest {
    paths: Vec<String>,
}

impl AssetManifest {
    /// Validate and wrap a list of paths.
    pub fn new(paths: Vec<String>) -> Result<Self> {
        if paths.is_empty() {
            return Err(OfflineError::Manifest("manifest is empty".to_string()));
        }
        for (i, path) in paths.iter().enumerate() {
            if !path.starts_with('/') {
                return Err(OfflineError::Manifest(format!(
                    "entry {i} is not an absolute path: {path:?}"
                )));
            }
            if paths[..i].contains(path) {
                return Err(OfflineError::Manifest(format!("duplicate entry {path:?}")));
            }
        }
        Ok(Self { paths })
    }

    /// Manifest configured for the offline controller: the generated file
    /// when one is set, the inline list otherwise.
    pub fn from_config(config: &OfflineConfig) -> Result<Self> {
        match config.manifest_path {
            Some(ref path) => Self::load(path),
            None => Self::new(config.manifest.clone()),
        }
    }

    /// Load a manifest file written by `manifest-gen`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let manifest = Self::from_json(&contents)?;
        debug!(path = %path.display(), assets = manifest.len(), "Loaded asset manifest");
        Ok(manifest)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resolve every path against `origin`, keeping manifest order.
    pub fn resolve(&self, origin: &Url) -> Result<Vec<Url>> {
        self.paths
            .iter()
            .map(|path| origin.join(path).map_err(OfflineError::from))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self {
            paths: DEFAULT_MANIFEST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for AssetManifest {
    type Error = OfflineError;

    fn try_from(paths: Vec<String>) -> Result<Self> {
        Self::new(paths)
    }
}

impl From<AssetManifest> for Vec<String> {
    fn from(manifest: AssetManifest) -> Self {
        manifest.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_manifest() {
        let manifest = AssetManifest::default();
        assert_eq!(manifest.len(), 5);
        assert!(manifest.contains("/static/images/favicon.ico"));
        assert_eq!(manifest.iter().next(), Some("/"));
        assert!(AssetManifest::new(manifest.iter().map(String::from).collect()).is_ok());
    }

    #[test]
    fn test_rejects_invalid_entries() {
        assert!(AssetManifest::new(Vec::new()).is_err());
        assert!(AssetManifest::new(paths(&["/", "static/logo.png"])).is_err());
        assert!(AssetManifest::new(paths(&["/", "/a.css", "/"])).is_err());
    }

    #[test]
    fn test_resolve_keeps_order() {
        let manifest = AssetManifest::new(paths(&["/", "/static/styles/main.css"])).unwrap();
        let origin = Url::parse("https://lessons.example.com/").unwrap();

        let urls = manifest.resolve(&origin).unwrap();
        assert_eq!(urls[0].as_str(), "https://lessons.example.com/");
        assert_eq!(urls[1].as_str(), "https://lessons.example.com/static/styles/main.css");
    }

    #[test]
    fn test_json_is_plain_array() {
        let manifest = AssetManifest::new(paths(&["/", "/a.css"])).unwrap();
        let text = serde_json::to_string(&manifest).unwrap();
        assert_eq!(text, r#"["/","/a.css"]"#);

        assert!(AssetManifest::from_json(r#"["/", "relative.css"]"#).is_err());
    }

    #[test]
    fn test_from_config_prefers_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"["/", "/static/app.js"]"#).unwrap();

        let mut config = OfflineConfig::default();
        assert_eq!(AssetManifest::from_config(&config).unwrap().len(), 5);

        config.manifest_path = Some(file.path().to_path_buf());
        let manifest = AssetManifest::from_config(&config).unwrap();
        assert_eq!(manifest.len(), 2);
        assert!(manifest.contains("/static/app.js"));
    }
}
