//! Static directory scanning.

use std::path::{Path, PathBuf};

use llapp_offline::{AssetManifest, OfflineError};
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    #[error(transparent)]
    Manifest(#[from] OfflineError),
}

/// Normalize a URL prefix to `/segment...` with no trailing slash. The root
/// prefix becomes the empty string.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// URL paths of every file under `root`, served below `prefix`. Hidden files
/// and directories are skipped.
pub fn collect_assets(root: &Path, prefix: &str) -> Result<Vec<String>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let prefix = normalize_prefix(prefix);

    let mut assets = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_hidden(e)) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let mut url_path = prefix.clone();
        for component in relative.components() {
            let segment = component
                .as_os_str()
                .to_str()
                .ok_or_else(|| ScanError::NonUtf8Path(entry.path().to_path_buf()))?;
            url_path.push('/');
            url_path.push_str(segment);
        }
        debug!(path = %url_path, "Found asset");
        assets.push(url_path);
    }
    Ok(assets)
}

/// Build a manifest from the extra `includes` plus every asset under `root`.
/// Entries are sorted and deduplicated.
pub fn generate(
    root: &Path,
    prefix: &str,
    includes: &[String],
) -> Result<AssetManifest, ScanError> {
    let mut paths = includes.to_vec();
    paths.extend(collect_assets(root, prefix)?);
    paths.sort();
    paths.dedup();
    Ok(AssetManifest::new(paths)?)
}
