// Configuration - site values, checklist bounds, synthesis policy and directory table
// Loaded from TOML with environment overrides; every section has working defaults.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::validation::ValidationError;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SeoConfig {
    pub site: SiteConfig,
    pub analysis: AnalysisConfig,
    pub synthesis: SynthesisConfig,
    /// Directory name -> seed keywords and glossary flag
    pub directories: IndexMap<String, DirectoryProfile>,
    pub enhancer: EnhancerConfig,
    pub paths: PathsConfig,
    pub robots: RobotsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
    /// Default `author` written by the synthesizer
    pub author: String,
    pub default_locale: String,
    pub locales: Vec<String>,
}

/// Bounds used by the issue detector
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub min_description_length: usize,
    pub max_description_length: usize,
    pub min_keywords_count: usize,
    pub max_keywords_count: usize,
    /// Plain-text characters below which `low_content_density` fires
    pub min_content_length: usize,
    pub max_paragraph_length: usize,
    pub min_internal_links: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub description_max_length: usize,
    /// Extra keywords taken from the body on top of the directory seeds
    pub content_keyword_limit: usize,
    pub max_keywords: usize,
    /// Seeds for directories missing from the table
    pub default_keywords: Vec<String>,
    /// File stems ending with this are overview pages, never term definitions
    pub overview_suffix: String,
    pub default_type: String,
    pub term_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DirectoryProfile {
    pub keywords: Vec<String>,
    /// Documents here define glossary terms
    #[serde(default)]
    pub glossary: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnhancerConfig {
    pub enabled: bool,
    pub url: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    pub docs_dir: PathBuf,
    pub static_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Defaults to `<docs_dir>/../i18n`
    pub i18n_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RobotsConfig {
    pub allow_all: bool,
    pub disallow_paths: Vec<String>,
    pub sitemap_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Cantian AI Wiki".to_string(),
            url: "https://your-docusaurus-site.example.com".to_string(),
            author: "Cantian AI Team".to_string(),
            default_locale: "en".to_string(),
            locales: ["en", "ja", "ko", "zh-Hans", "zh-Hant"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_description_length: 50,
            max_description_length: 160,
            min_keywords_count: 3,
            max_keywords_count: 10,
            min_content_length: 200,
            max_paragraph_length: 300,
            min_internal_links: 2,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            description_max_length: 150,
            content_keyword_limit: 5,
            max_keywords: 10,
            default_keywords: ["命理", "八字", "中国传统文化"]
                .into_iter()
                .map(String::from)
                .collect(),
            overview_suffix: "介绍".to_string(),
            default_type: "Article".to_string(),
            term_type: "DefinedTerm".to_string(),
        }
    }
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "https://cantian-openai.openai.azure.com/openai/deployments/gpt-4o/v1/completions"
                .to_string(),
            api_key: None,
            max_tokens: 2000,
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("../cantian-ai-wiki/docs"),
            static_dir: PathBuf::from("../cantian-ai-wiki/static"),
            output_dir: PathBuf::from("seo_reports"),
            i18n_dir: None,
        }
    }
}

impl Default for RobotsConfig {
    fn default() -> Self {
        Self {
            allow_all: true,
            disallow_paths: vec!["/private/".to_string(), "/temp/".to_string()],
            sitemap_path: "sitemap-index.xml".to_string(),
        }
    }
}

/// Seed table for the wiki's glossary directories
pub fn default_directory_table() -> IndexMap<String, DirectoryProfile> {
    let table: [(&str, &[&str]); 6] = [
        ("十神", &["十神", "命理", "八字", "中国传统文化", "命理学"]),
        ("天干", &["天干", "命理", "八字", "中国传统文化", "命理学", "干支"]),
        ("地支", &["地支", "命理", "八字", "中国传统文化", "命理学", "干支"]),
        ("神煞", &["神煞", "命理", "八字", "中国传统文化", "命理学", "吉凶"]),
        (
            "星运_十二长生_",
            &["十二长生", "星运", "命理", "八字", "中国传统文化", "命理学"],
        ),
        ("其他名词解释", &["命理", "八字", "中国传统文化", "命理学", "术语"]),
    ];

    table
        .into_iter()
        .map(|(dir, keywords)| {
            (
                dir.to_string(),
                DirectoryProfile {
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                    glossary: true,
                },
            )
        })
        .collect()
}

impl SeoConfig {
    /// Defaults with the built-in directory table
    pub fn with_defaults() -> Self {
        Self {
            directories: default_directory_table(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// An absent `[directories]` table falls back to the built-in one.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: SeoConfig = toml::from_str(content)?;
        if config.directories.is_empty() {
            config.directories = default_directory_table();
        }
        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::with_defaults(),
        };

        if let Ok(docs_dir) = std::env::var("DOCSEO_DOCS_DIR") {
            config.paths.docs_dir = PathBuf::from(docs_dir);
        }
        if let Ok(output_dir) = std::env::var("DOCSEO_OUTPUT_DIR") {
            config.paths.output_dir = PathBuf::from(output_dir);
        }
        if let Ok(author) = std::env::var("DOCSEO_AUTHOR") {
            config.site.author = author;
        }
        if let Ok(api_key) = std::env::var("DOCSEO_API_KEY") {
            config.enhancer.api_key = Some(api_key);
        }
        if let Ok(url) = std::env::var("DOCSEO_API_URL") {
            config.enhancer.url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject inconsistent bounds and unusable site values
    pub fn validate(&self) -> Result<(), ValidationError> {
        let analysis = &self.analysis;
        let pairs = [
            (
                "analysis.description_length",
                analysis.min_description_length,
                analysis.max_description_length,
            ),
            (
                "analysis.keywords_count",
                analysis.min_keywords_count,
                analysis.max_keywords_count,
            ),
        ];
        for (field, min, max) in pairs {
            if min > max {
                return Err(ValidationError::InvalidInput {
                    field: field.to_string(),
                    reason: format!("minimum {min} exceeds maximum {max}"),
                });
            }
        }

        if self.site.url.trim().is_empty() {
            return Err(ValidationError::InvalidInput {
                field: "site.url".to_string(),
                reason: "site URL cannot be empty".to_string(),
            });
        }

        if self.synthesis.max_keywords == 0 {
            return Err(ValidationError::InvalidInput {
                field: "synthesis.max_keywords".to_string(),
                reason: "at least one keyword must be allowed".to_string(),
            });
        }

        Ok(())
    }

    /// i18n root next to the docs directory unless configured
    pub fn i18n_dir(&self) -> PathBuf {
        self.paths.i18n_dir.clone().unwrap_or_else(|| {
            self.paths
                .docs_dir
                .parent()
                .map(|parent| parent.join("i18n"))
                .unwrap_or_else(|| PathBuf::from("i18n"))
        })
    }
}
