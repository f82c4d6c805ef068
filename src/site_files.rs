// Site Files - robots.txt and multi-locale sitemap index

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{RobotsConfig, SeoConfig};
use crate::path_utils::write_atomic;

pub const ROBOTS_FILE: &str = "robots.txt";
pub const SITEMAP_INDEX_FILE: &str = "sitemap-index.xml";

fn base_url(url: &str) -> &str {
    url.trim_end_matches('/')
}

pub fn render_robots(site_url: &str, robots: &RobotsConfig) -> String {
    let mut lines = vec!["User-agent: *".to_string()];
    if robots.allow_all {
        lines.push("Allow: /".to_string());
    }
    for path in &robots.disallow_paths {
        lines.push(format!("Disallow: {path}"));
    }
    lines.push(String::new());
    lines.push("# Sitemap location".to_string());
    lines.push(format!(
        "Sitemap: {}/{}",
        base_url(site_url),
        robots.sitemap_path.trim_start_matches('/')
    ));

    let mut content = lines.join("\n");
    content.push('\n');
    content
}

/// Sitemap index: the default site map followed by one per locale
pub fn render_sitemap_index(site_url: &str, locales: &[String], lastmod: NaiveDate) -> String {
    let base = base_url(site_url);
    let lastmod = lastmod.format("%Y-%m-%d");

    let locations = std::iter::once(format!("{base}/sitemap.xml"))
        .chain(locales.iter().map(|locale| format!("{base}/{locale}/sitemap.xml")));

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for loc in locations {
        xml.push_str(&format!(
            "  <sitemap>\n    <loc>{loc}</loc>\n    <lastmod>{lastmod}</lastmod>\n  </sitemap>\n"
        ));
    }
    xml.push_str("</sitemapindex>\n");
    xml
}

/// Write `robots.txt` into the static directory
pub async fn write_robots(config: &SeoConfig) -> Result<PathBuf> {
    let static_dir = &config.paths.static_dir;
    ensure_dir(static_dir).await?;
    let path = static_dir.join(ROBOTS_FILE);
    write_atomic(&path, &render_robots(&config.site.url, &config.robots)).await?;
    info!("robots.txt written: {}", path.display());
    Ok(path)
}

/// Write the sitemap index into the static directory, dated `today`
pub async fn write_sitemap_index(config: &SeoConfig, today: NaiveDate) -> Result<PathBuf> {
    let static_dir = &config.paths.static_dir;
    ensure_dir(static_dir).await?;
    let path = static_dir.join(SITEMAP_INDEX_FILE);
    let xml = render_sitemap_index(&config.site.url, &config.site.locales, today);
    write_atomic(&path, &xml).await?;
    info!(
        "Sitemap index written: {} ({} entries)",
        path.display(),
        config.site.locales.len() + 1
    );
    Ok(path)
}

async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create directory {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_robots_content() {
        let robots = RobotsConfig::default();
        assert_eq!(
            render_robots("https://wiki.example.com/", &robots),
            "User-agent: *\nAllow: /\nDisallow: /private/\nDisallow: /temp/\n\n# Sitemap location\nSitemap: https://wiki.example.com/sitemap-index.xml\n"
        );
    }

    #[test]
    fn test_robots_without_allow_all() {
        let robots = RobotsConfig {
            allow_all: false,
            disallow_paths: vec![],
            sitemap_path: "/sitemap.xml".to_string(),
        };
        let content = render_robots("https://x.io", &robots);
        assert!(!content.contains("Allow"));
        assert!(content.contains("Sitemap: https://x.io/sitemap.xml"));
    }

    #[test]
    fn test_sitemap_index_entries() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let xml = render_sitemap_index(
            "https://x.io",
            &["en".to_string(), "ja".to_string()],
            date,
        );
        assert_eq!(xml.matches("<sitemap>").count(), 3);
        assert!(xml.contains("<loc>https://x.io/sitemap.xml</loc>"));
        assert!(xml.contains("<loc>https://x.io/ja/sitemap.xml</loc>"));
        assert_eq!(xml.matches("<lastmod>2024-05-06</lastmod>").count(), 3);
    }

    #[tokio::test]
    async fn test_write_site_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = SeoConfig::with_defaults();
        config.paths.static_dir = dir.path().join("static");

        let robots = write_robots(&config).await.unwrap();
        let sitemap = write_sitemap_index(&config, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .await
            .unwrap();
        assert!(robots.ends_with("robots.txt"));
        assert!(std::fs::read_to_string(sitemap).unwrap().contains("/zh-Hant/sitemap.xml"));
    }
}
