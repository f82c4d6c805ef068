// Services Layer - orchestration shared by every CLI command
//
// Each service walks its target, runs the core per document and returns
// counters; per-document failures are logged and counted, never raised.

pub mod analysis_service;
pub mod frontmatter_service;
pub mod optimization_service;

pub use analysis_service::{AnalysisService, AnalyzeOptions, AnalyzeResult};
pub use frontmatter_service::{
    DocumentOutcome, FixKeywordsResult, FrontmatterService, KeywordFix, TranslateOptions,
    UpdateOptions, UpdateResult,
};
pub use optimization_service::{OptimizationService, RunOptions, RunOutcome};

use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::path_utils::is_markdown;

/// Markdown files under `root` in file-name order, or `root` itself when it is a file
pub fn discover_documents(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if entry.file_type().is_file() && is_markdown(entry.path()) {
            documents.push(entry.into_path());
        }
    }
    documents
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discovery_is_sorted_and_markdown_only() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("b/z.md"), "").unwrap();
        std::fs::write(dir.path().join("b/a.md"), "").unwrap();
        std::fs::write(dir.path().join("c.md"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();

        let found: Vec<String> = discover_documents(dir.path())
            .iter()
            .map(|p| crate::path_utils::normalize_path_relative(p, dir.path()))
            .collect();
        assert_eq!(found, vec!["b/a.md", "b/z.md", "c.md"]);
    }

    #[test]
    fn test_single_file_target() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("one.md");
        std::fs::write(&file, "").unwrap();
        assert_eq!(discover_documents(&file), vec![file]);
    }
}
