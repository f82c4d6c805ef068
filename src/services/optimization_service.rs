// OptimizationService - the full pipeline
//
// robots.txt -> sitemap index -> analysis reports -> frontmatter update of the
// docs directory (and translated docs under i18n when no target was given) ->
// optimization_report.json.

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::config::SeoConfig;
use crate::observability::RunCounters;
use crate::reports::{write_run_summary, RunSummary};
use crate::site_files::{write_robots, write_sitemap_index};

use super::{AnalysisService, AnalyzeOptions, FrontmatterService, UpdateOptions};

/// Translated docs live in `<i18n>/<lang>/<I18N_DOCS_DIR>`
pub const I18N_DOCS_DIR: &str = "docusaurus-plugin-content-docs";

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Update this directory instead of the configured docs directory
    pub target: Option<PathBuf>,
    pub preview: bool,
    pub create_missing: bool,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub summary_path: PathBuf,
    pub counters: RunCounters,
}

pub struct OptimizationService<'a> {
    config: &'a SeoConfig,
    analysis: AnalysisService,
    frontmatter: FrontmatterService,
}

impl<'a> OptimizationService<'a> {
    pub fn new(config: &'a SeoConfig, frontmatter: FrontmatterService) -> Self {
        Self {
            config,
            analysis: AnalysisService::new(config),
            frontmatter,
        }
    }

    pub async fn run(&self, options: RunOptions) -> Result<RunOutcome> {
        let started = Instant::now();
        let paths = &self.config.paths;
        info!("Starting full SEO optimization");

        write_robots(self.config).await?;
        write_sitemap_index(self.config, Utc::now().date_naive()).await?;

        let analysis = self
            .analysis
            .analyze(AnalyzeOptions {
                target: paths.docs_dir.clone(),
                output_dir: Some(paths.output_dir.clone()),
            })
            .await?;

        let target = options
            .target
            .clone()
            .unwrap_or_else(|| paths.docs_dir.clone());
        let mut counters = self.update_dir(&target, &options).await?;

        if options.target.is_none() {
            for docs_dir in i18n_doc_dirs(&self.config.i18n_dir()).await? {
                info!("Processing translated docs: {}", docs_dir.display());
                counters.merge(self.update_dir(&docs_dir, &options).await?);
            }
        }

        let duration = started.elapsed();
        info!("SEO optimization finished in {:.2}s", duration.as_secs_f64());

        let summary = RunSummary {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            duration_secs: (duration.as_secs_f64() * 100.0).round() / 100.0,
            target: target.display().to_string(),
            enhancer_enabled: self.frontmatter.has_enhancer(),
            preview_mode: options.preview,
            seo_issues: analysis.stats.total_issues(),
            files_analyzed: analysis.stats.documents_analyzed(),
            files_with_issues: analysis.stats.document_issues().len(),
            documents_updated: counters.succeeded,
            documents_failed: counters.failed,
            output_dir: paths.output_dir.display().to_string(),
        };
        let summary_path = write_run_summary(&summary, &paths.output_dir).await?;
        info!("Optimization report written: {}", summary_path.display());

        Ok(RunOutcome {
            summary,
            summary_path,
            counters,
        })
    }

    async fn update_dir(&self, target: &Path, options: &RunOptions) -> Result<RunCounters> {
        let result = self
            .frontmatter
            .update(UpdateOptions {
                target: target.to_path_buf(),
                preview: options.preview,
                create_missing: options.create_missing,
                with_analysis: false,
            })
            .await?;
        Ok(result.counters)
    }
}

/// `<i18n>/<lang>/docusaurus-plugin-content-docs` directories that exist, sorted by language
async fn i18n_doc_dirs(i18n_dir: &Path) -> Result<Vec<PathBuf>> {
    if !i18n_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = tokio::fs::read_dir(i18n_dir)
        .await
        .with_context(|| format!("Failed to list {}", i18n_dir.display()))?;

    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let docs_dir = entry.path().join(I18N_DOCS_DIR);
        if docs_dir.is_dir() {
            dirs.push(docs_dir);
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_i18n_dirs_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for lang in ["ja", "en"] {
            std::fs::create_dir_all(dir.path().join(lang).join(I18N_DOCS_DIR)).unwrap();
        }
        std::fs::create_dir_all(dir.path().join("ko").join("other")).unwrap();

        let dirs = i18n_doc_dirs(dir.path()).await.unwrap();
        assert_eq!(dirs.len(), 2);
        assert!(dirs[0].starts_with(dir.path().join("en")));
        assert!(i18n_doc_dirs(&dir.path().join("absent")).await.unwrap().is_empty());
    }
}
