// Integration tests for the full optimization pipeline and config loading

use anyhow::Result;
use docseo::services::{FrontmatterService, OptimizationService, RunOptions};
use docseo::*;
use std::path::Path;
use tempfile::TempDir;

fn site_config(root: &Path) -> SeoConfig {
    let mut config = SeoConfig::with_defaults();
    config.site.url = "https://wiki.example.com".to_string();
    config.site.locales = vec!["en".to_string(), "ja".to_string()];
    config.paths.docs_dir = root.join("docs");
    config.paths.static_dir = root.join("static");
    config.paths.output_dir = root.join("reports");
    config
}

fn seed_site(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root.join("docs/天干"))?;
    std::fs::write(root.join("docs/天干/甲.md"), "---\ntitle: 甲\n---\n# 甲\n\n甲木为阳木。\n")?;
    std::fs::write(root.join("docs/intro.md"), "# Intro\n\nNo front-block here.\n")?;

    let ja_docs = root.join("i18n/ja/docusaurus-plugin-content-docs");
    std::fs::create_dir_all(&ja_docs)?;
    std::fs::write(ja_docs.join("page.md"), "---\ntitle: ページ\n---\n本文\n")?;
    Ok(())
}

#[tokio::test]
async fn test_full_run_produces_every_artifact() -> Result<()> {
    let root = TempDir::new()?;
    seed_site(root.path())?;
    let config = site_config(root.path());

    let frontmatter = FrontmatterService::new(&config, None);
    let outcome = OptimizationService::new(&config, frontmatter)
        .run(RunOptions::default())
        .await?;

    let robots = std::fs::read_to_string(root.path().join("static/robots.txt"))?;
    assert!(robots.contains("Sitemap: https://wiki.example.com/sitemap-index.xml"));
    let sitemap = std::fs::read_to_string(root.path().join("static/sitemap-index.xml"))?;
    assert_eq!(sitemap.matches("<sitemap>").count(), 3);

    for report in ["seo_stats.csv", "seo_issues.csv", "keywords_stats.csv", "optimization_report.json"] {
        assert!(root.path().join("reports").join(report).exists(), "{report} missing");
    }

    // docs: one updated, one skipped; i18n/ja: one updated
    assert_eq!(outcome.counters.succeeded, 2);
    assert_eq!(outcome.counters.skipped, 1);
    assert_eq!(outcome.summary.files_analyzed, 1);
    assert!(!outcome.summary.enhancer_enabled);

    let translated = std::fs::read_to_string(
        root.path().join("i18n/ja/docusaurus-plugin-content-docs/page.md"),
    )?;
    assert!(parse_document(&translated)?.metadata.contains_key("dateModified"));

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(
        &outcome.summary_path,
    )?)?;
    assert_eq!(json["preview_mode"], serde_json::Value::Bool(false));
    assert_eq!(json["files_analyzed"], 1);
    Ok(())
}

#[tokio::test]
async fn test_explicit_target_skips_i18n() -> Result<()> {
    let root = TempDir::new()?;
    seed_site(root.path())?;
    let config = site_config(root.path());
    let page = root.path().join("i18n/ja/docusaurus-plugin-content-docs/page.md");
    let before = std::fs::read_to_string(&page)?;

    let frontmatter = FrontmatterService::new(&config, None);
    let outcome = OptimizationService::new(&config, frontmatter)
        .run(RunOptions {
            target: Some(root.path().join("docs/天干")),
            ..RunOptions::default()
        })
        .await?;

    assert_eq!(outcome.counters.succeeded, 1);
    assert_eq!(std::fs::read_to_string(&page)?, before);
    Ok(())
}

#[tokio::test]
async fn test_preview_run_leaves_documents_untouched() -> Result<()> {
    let root = TempDir::new()?;
    seed_site(root.path())?;
    let config = site_config(root.path());
    let doc = root.path().join("docs/天干/甲.md");
    let before = std::fs::read_to_string(&doc)?;

    let frontmatter = FrontmatterService::new(&config, None);
    let outcome = OptimizationService::new(&config, frontmatter)
        .run(RunOptions {
            preview: true,
            ..RunOptions::default()
        })
        .await?;

    assert!(outcome.summary.preview_mode);
    assert_eq!(std::fs::read_to_string(&doc)?, before);
    Ok(())
}

#[test]
fn test_config_file_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("docseo.toml");
    std::fs::write(
        &path,
        r#"
[site]
url = "https://docs.example.org"
author = "Docs Team"

[analysis]
min_internal_links = 3

[directories.guides]
keywords = ["guide", "tutorial", "howto"]
glossary = false
"#,
    )?;

    let config = SeoConfig::from_file(&path)?;
    assert_eq!(config.site.author, "Docs Team");
    assert_eq!(config.analysis.min_internal_links, 3);
    assert_eq!(config.analysis.max_paragraph_length, 300);
    assert_eq!(config.directories.len(), 1);
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_unreadable_config_is_an_error() {
    assert!(SeoConfig::from_file("/no/such/docseo.toml").is_err());
}
