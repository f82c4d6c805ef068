//! Path helpers for stable document identifiers and directory context
//!
//! Document identifiers are the path relative to the root a run was started
//! from, always with forward slashes and without a leading "./". The
//! synthesizer also needs the immediate parent directory name and the file
//! name of each document, which are extracted here.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Normalize a path to be relative to a run root
///
/// - Strips the root prefix when the path lives under it
/// - Uses forward slashes (/) as path separators on all platforms
/// - Removes leading "./" prefixes
/// - Falls back to the path itself when it is the root (single-file runs)
///
/// # Examples
/// ```
/// use std::path::Path;
/// use docseo::path_utils::normalize_path_relative;
/// let root = Path::new("/site/docs");
/// let file = Path::new("/site/docs/十神/比肩.md");
/// assert_eq!(normalize_path_relative(file, root), "十神/比肩.md");
/// ```
pub fn normalize_path_relative(path: &Path, root: &Path) -> String {
    let relative_path = match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel,
        Ok(_) => path,
        Err(_) => {
            debug!("Path {:?} is not under root {:?}, using as-is", path, root);
            path
        }
    };

    let path_str = relative_path.to_string_lossy();

    let normalized = if cfg!(windows) {
        path_str.replace('\\', "/")
    } else {
        path_str.to_string()
    };

    match normalized.strip_prefix("./") {
        Some(stripped) => stripped.to_string(),
        None => normalized,
    }
}

/// Name of the directory directly containing `path`, if any
pub fn parent_dir_name(path: &Path) -> Option<String> {
    path.parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
}

/// Final component of `path` as text
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whether the path names a Markdown document
pub fn is_markdown(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("md")
}

/// Sibling scratch file used while replacing `path`
fn temp_sibling(path: &Path) -> PathBuf {
    path.with_file_name(format!(".{}.docseo-tmp", file_name(path)))
}

/// Replace the whole file or leave the original untouched
pub async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp_path = temp_sibling(path);
    tokio::fs::write(&tmp_path, contents)
        .await
        .with_context(|| format!("Failed to write temp file {}", tmp_path.display()))?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        warn!("Failed to replace {}: {}", path.display(), e);
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }
    Ok(())
}
