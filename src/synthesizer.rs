// Frontmatter Synthesizer - fills metadata gaps from content and directory context
// Existing non-empty values always win; enhanced values beat heuristics;
// dateModified is refreshed on every pass.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::path::Path;

use crate::config::{DirectoryProfile, SeoConfig};
use crate::frontmatter::MetadataRecord;
use crate::path_utils::{file_name, parent_dir_name};
use crate::pure::{description, keywords, markdown};
use crate::types::{is_truthy, scalar_to_string, Keywords, StructuredDataType};

/// Timestamp layout of `datePublished`/`dateModified`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Keys copied verbatim into their fixed slot, never synthesized
pub const PASS_THROUGH_KEYS: [&str; 3] = ["sidebar_position", "hide_title", "hide_table_of_contents"];

/// Keys whose position in the output is decided by the synthesizer
const MANAGED_KEYS: [&str; 11] = [
    "title",
    "sidebar_label",
    "sidebar_position",
    "hide_title",
    "hide_table_of_contents",
    "description",
    "keywords",
    "author",
    "datePublished",
    "dateModified",
    "structuredData",
];

/// Directory name -> seed keywords and structured-data type
#[derive(Debug, Clone)]
pub struct ClassificationTable {
    directories: IndexMap<String, DirectoryProfile>,
    default_keywords: Vec<String>,
    overview_suffix: String,
    default_type: StructuredDataType,
    term_type: StructuredDataType,
}

impl ClassificationTable {
    pub fn from_config(config: &SeoConfig) -> Self {
        Self {
            directories: config.directories.clone(),
            default_keywords: config.synthesis.default_keywords.clone(),
            overview_suffix: config.synthesis.overview_suffix.clone(),
            default_type: StructuredDataType::parse(&config.synthesis.default_type),
            term_type: StructuredDataType::parse(&config.synthesis.term_type),
        }
    }

    /// Seed keywords for a directory, or the default seeds when it is unknown
    pub fn seed_keywords(&self, directory: Option<&str>) -> &[String] {
        directory
            .and_then(|dir| self.directories.get(dir))
            .map(|profile| profile.keywords.as_slice())
            .unwrap_or(&self.default_keywords)
    }

    /// Term type for glossary entries, the default type for everything else
    /// (overview pages inside glossary directories included)
    pub fn classify(&self, directory: Option<&str>, file_name: &str) -> StructuredDataType {
        let glossary = directory
            .and_then(|dir| self.directories.get(dir))
            .map(|profile| profile.glossary)
            .unwrap_or(false);

        let stem = file_name.strip_suffix(".md").unwrap_or(file_name);
        if glossary && !stem.ends_with(&self.overview_suffix) {
            self.term_type.clone()
        } else {
            self.default_type.clone()
        }
    }
}

/// Where the document lives and when synthesis happens
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisContext {
    pub parent_dir: Option<String>,
    pub file_name: String,
    pub now: DateTime<Utc>,
}

impl SynthesisContext {
    pub fn for_path(path: &Path, now: DateTime<Utc>) -> Self {
        Self {
            parent_dir: parent_dir_name(path),
            file_name: file_name(path),
            now,
        }
    }

    pub fn timestamp(&self) -> String {
        self.now.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Values supplied by an enhancer; any of them may be missing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnhancedValues {
    pub description: Option<String>,
    pub keywords: Option<Keywords>,
    pub structured_type: Option<StructuredDataType>,
}

impl EnhancedValues {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Computes complete metadata records
#[derive(Debug, Clone)]
pub struct FrontmatterSynthesizer {
    table: ClassificationTable,
    author: String,
    description_max_length: usize,
    content_keyword_limit: usize,
    max_keywords: usize,
}

impl FrontmatterSynthesizer {
    pub fn new(config: &SeoConfig) -> Self {
        Self {
            table: ClassificationTable::from_config(config),
            author: config.site.author.clone(),
            description_max_length: config.synthesis.description_max_length,
            content_keyword_limit: config.synthesis.content_keyword_limit,
            max_keywords: config.synthesis.max_keywords,
        }
    }

    pub fn table(&self) -> &ClassificationTable {
        &self.table
    }

    /// Heuristic description of a body
    pub fn heuristic_description(&self, body: &str) -> String {
        description::generate(body, self.description_max_length)
    }

    /// Directory seeds followed by frequent body terms, deduplicated and capped
    pub fn heuristic_keywords(&self, body: &str, directory: Option<&str>) -> Keywords {
        let mut result = Keywords::new();
        result.extend_unique(self.table.seed_keywords(directory), self.max_keywords);
        result.extend_unique(
            keywords::extract(body, self.content_keyword_limit),
            self.max_keywords,
        );
        result
    }

    /// Merge existing metadata with enhanced and heuristic values.
    ///
    /// # Postconditions
    /// - Every truthy existing value is kept verbatim (keywords are rewritten in list form)
    /// - A present `sidebar_label` is kept even when empty
    /// - `dateModified` equals `context.now`
    /// - Unrecognized keys follow the managed keys in their original order
    pub fn synthesize(
        &self,
        existing: &MetadataRecord,
        body: &str,
        context: &SynthesisContext,
        enhanced: &EnhancedValues,
    ) -> MetadataRecord {
        let mut merged = MetadataRecord::new();
        let timestamp = context.timestamp();

        // Non-scalar values (per-locale mappings, lists) are kept as authored
        let title = match existing.truthy("title") {
            Some(value) => {
                merged.insert("title", value.clone());
                scalar_to_string(value)
            }
            None => {
                let heading = markdown::first_title_heading(body);
                if let Some(heading) = &heading {
                    merged.insert("title", Value::String(heading.clone()));
                }
                heading
            }
        };

        // A present label is authored, even when empty
        match existing.get("sidebar_label") {
            Some(label) => merged.insert("sidebar_label", label.clone()),
            None => {
                if let Some(title) = &title {
                    merged.insert("sidebar_label", Value::String(title.clone()));
                }
            }
        }

        for key in PASS_THROUGH_KEYS {
            if let Some(value) = existing.get(key) {
                merged.insert(key, value.clone());
            }
        }

        let description = existing.truthy("description").cloned().unwrap_or_else(|| {
            let text = enhanced
                .description
                .as_ref()
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| self.heuristic_description(body));
            Value::String(text)
        });
        merged.insert("description", description);

        let keywords = existing
            .keywords()
            .or_else(|| {
                enhanced.keywords.as_ref().and_then(|suggested| {
                    let mut capped = Keywords::new();
                    capped.extend_unique(suggested.iter(), self.max_keywords);
                    (!capped.is_empty()).then_some(capped)
                })
            })
            .unwrap_or_else(|| self.heuristic_keywords(body, context.parent_dir.as_deref()));
        merged.insert("keywords", keywords.to_value());

        let author = existing
            .truthy("author")
            .cloned()
            .unwrap_or_else(|| Value::String(self.author.clone()));
        merged.insert("author", author);

        let published = existing
            .truthy("datePublished")
            .cloned()
            .unwrap_or_else(|| Value::String(timestamp.clone()));
        merged.insert("datePublished", published);
        merged.insert("dateModified", Value::String(timestamp));

        let structured_type = enhanced.structured_type.clone().unwrap_or_else(|| {
            self.table
                .classify(context.parent_dir.as_deref(), &context.file_name)
        });
        merged.insert(
            "structuredData",
            merge_structured_data(existing.get("structuredData"), &structured_type),
        );

        for (key, value) in existing.iter() {
            let managed = key.as_str().map(|k| MANAGED_KEYS.contains(&k)).unwrap_or(false);
            if !managed {
                merged.insert_value(key.clone(), value.clone());
            }
        }

        merged
    }
}

/// Keep an existing structuredData mapping and only fill its `type`
fn merge_structured_data(existing: Option<&Value>, fallback: &StructuredDataType) -> Value {
    let type_value = || Value::String(fallback.as_str().to_string());

    match existing {
        Some(Value::Mapping(data)) => {
            let mut data = data.clone();
            let has_type = data.get("type").map(is_truthy).unwrap_or(false);
            if !has_type {
                data.insert(Value::String("type".to_string()), type_value());
            }
            Value::Mapping(data)
        }
        // A bare scalar is read as the type itself
        Some(value @ (Value::String(_) | Value::Tagged(_))) if is_truthy(value) => {
            let mut data = Mapping::new();
            data.insert(Value::String("type".to_string()), value.clone());
            Value::Mapping(data)
        }
        _ => {
            let mut data = Mapping::new();
            data.insert(Value::String("type".to_string()), type_value());
            Value::Mapping(data)
        }
    }
}
