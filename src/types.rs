// Domain Types - strongly-typed building blocks shared by the detector and synthesizer
// These types keep the closed issue vocabulary and the keyword representation in one place.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;
use std::path::Path;

/// One entry of the SEO checklist, plus the two structural kinds reported
/// when a document has no usable front-block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingFrontmatter,
    InvalidFrontmatter,
    MissingTitle,
    MissingDescription,
    ShortDescription,
    LongDescription,
    MissingKeywords,
    FewKeywords,
    ManyKeywords,
    MissingStructuredData,
    MissingDates,
    DuplicateTitle,
    DuplicateDescription,
    MissingAltText,
    NoInternalLinks,
    FewInternalLinks,
    NoHeadings,
    LongParagraphs,
    LowContentDensity,
}

impl IssueKind {
    /// The 17 checklist kinds, in checklist order
    pub const CHECKLIST: [IssueKind; 17] = [
        IssueKind::MissingTitle,
        IssueKind::MissingDescription,
        IssueKind::ShortDescription,
        IssueKind::LongDescription,
        IssueKind::MissingKeywords,
        IssueKind::FewKeywords,
        IssueKind::ManyKeywords,
        IssueKind::MissingStructuredData,
        IssueKind::MissingDates,
        IssueKind::DuplicateTitle,
        IssueKind::DuplicateDescription,
        IssueKind::MissingAltText,
        IssueKind::NoInternalLinks,
        IssueKind::FewInternalLinks,
        IssueKind::NoHeadings,
        IssueKind::LongParagraphs,
        IssueKind::LowContentDensity,
    ];

    /// Stable machine identifier used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::MissingFrontmatter => "missing_frontmatter",
            IssueKind::InvalidFrontmatter => "invalid_frontmatter",
            IssueKind::MissingTitle => "missing_title",
            IssueKind::MissingDescription => "missing_description",
            IssueKind::ShortDescription => "short_description",
            IssueKind::LongDescription => "long_description",
            IssueKind::MissingKeywords => "missing_keywords",
            IssueKind::FewKeywords => "few_keywords",
            IssueKind::ManyKeywords => "many_keywords",
            IssueKind::MissingStructuredData => "missing_structured_data",
            IssueKind::MissingDates => "missing_dates",
            IssueKind::DuplicateTitle => "duplicate_title",
            IssueKind::DuplicateDescription => "duplicate_description",
            IssueKind::MissingAltText => "missing_alt_text",
            IssueKind::NoInternalLinks => "no_internal_links",
            IssueKind::FewInternalLinks => "few_internal_links",
            IssueKind::NoHeadings => "no_headings",
            IssueKind::LongParagraphs => "long_paragraphs",
            IssueKind::LowContentDensity => "low_content_density",
        }
    }

    /// Human readable label for report rows
    pub fn label(&self) -> &'static str {
        match self {
            IssueKind::MissingFrontmatter => "Missing frontmatter",
            IssueKind::InvalidFrontmatter => "Invalid frontmatter",
            IssueKind::MissingTitle => "Missing title",
            IssueKind::MissingDescription => "Missing description",
            IssueKind::ShortDescription => "Description too short (< 50 characters)",
            IssueKind::LongDescription => "Description too long (> 160 characters)",
            IssueKind::MissingKeywords => "Missing keywords",
            IssueKind::FewKeywords => "Too few keywords (< 3)",
            IssueKind::ManyKeywords => "Too many keywords (> 10)",
            IssueKind::MissingStructuredData => "Missing structured data",
            IssueKind::MissingDates => "Missing date information",
            IssueKind::DuplicateTitle => "Duplicate title",
            IssueKind::DuplicateDescription => "Duplicate description",
            IssueKind::MissingAltText => "Image missing alt text",
            IssueKind::NoInternalLinks => "No internal links",
            IssueKind::FewInternalLinks => "Too few internal links (< 2)",
            IssueKind::NoHeadings => "No subheadings (h2, h3)",
            IssueKind::LongParagraphs => "Paragraph too long (> 300 characters)",
            IssueKind::LowContentDensity => "Low content density (< 200 characters)",
        }
    }

    /// Whether this kind means the document was skipped entirely
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            IssueKind::MissingFrontmatter | IssueKind::InvalidFrontmatter
        )
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered keyword list.
///
/// On disk a document may carry either a comma-joined string or a YAML
/// sequence; both are read through [`Keywords::from_value`]. The only
/// representation ever written is the sequence form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keywords {
    inner: Vec<String>,
}

impl Keywords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from any iterator, trimming entries and dropping empty ones
    pub fn from_iter_trimmed<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let inner = items
            .into_iter()
            .map(|item| item.as_ref().trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();
        Self { inner }
    }

    /// Parse the comma-joined form (`"a, b, c"`)
    pub fn parse_joined(joined: &str) -> Self {
        Self::from_iter_trimmed(joined.split(','))
    }

    /// Read either on-disk representation.
    ///
    /// Returns `None` for null values; scalars are treated as a single
    /// comma-joined string.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(joined) => Some(Self::parse_joined(joined)),
            Value::Sequence(items) => Some(Self::from_iter_trimmed(
                items.iter().filter_map(scalar_to_string),
            )),
            Value::Tagged(tagged) => Self::from_value(&tagged.value),
            other => scalar_to_string(other).map(|s| Self::parse_joined(&s)),
        }
    }

    /// Canonical on-disk representation
    pub fn to_value(&self) -> Value {
        Value::Sequence(self.inner.iter().cloned().map(Value::String).collect())
    }

    /// Append keywords not already present, stopping once `cap` entries exist
    pub fn extend_unique<I, S>(&mut self, items: I, cap: usize)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in items {
            if self.inner.len() >= cap {
                break;
            }
            let item = item.as_ref().trim();
            if item.is_empty() || self.inner.iter().any(|k| k == item) {
                continue;
            }
            self.inner.push(item.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.inner
    }

    pub fn into_vec(self) -> Vec<String> {
        self.inner
    }
}

impl fmt::Display for Keywords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.join(", "))
    }
}

/// Structured-data classification attached to `structuredData.type`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructuredDataType {
    Article,
    DefinedTerm,
    Other(String),
}

impl StructuredDataType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Article" => StructuredDataType::Article,
            "DefinedTerm" => StructuredDataType::DefinedTerm,
            other => StructuredDataType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StructuredDataType::Article => "Article",
            StructuredDataType::DefinedTerm => "DefinedTerm",
            StructuredDataType::Other(name) => name,
        }
    }
}

impl fmt::Display for StructuredDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifier of a document within a run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentPath {
    inner: String,
}

impl DocumentPath {
    pub fn new(id: impl Into<String>) -> Self {
        Self { inner: id.into() }
    }

    /// Identify a file relative to the root the run was started from
    pub fn relative_to(path: &Path, root: &Path) -> Self {
        Self::new(crate::path_utils::normalize_path_relative(path, root))
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

/// Render a YAML scalar as text; collections yield `None`
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Truthiness of a frontmatter value: null, empty strings, empty
/// collections, `false` and zero all count as absent.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(items) => !items.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_accept_joined_string() {
        let value = Value::String("十神, 命理 ,八字".to_string());
        let keywords = Keywords::from_value(&value).unwrap();
        assert_eq!(keywords.as_slice(), &["十神", "命理", "八字"]);
    }

    #[test]
    fn test_keywords_accept_sequence() {
        let value: Value = serde_yaml::from_str("[a, ' b ', 3]").unwrap();
        let keywords = Keywords::from_value(&value).unwrap();
        assert_eq!(keywords.as_slice(), &["a", "b", "3"]);
    }

    #[test]
    fn test_keywords_drop_empty_tokens() {
        let keywords = Keywords::parse_joined("a,, b ,");
        assert_eq!(keywords.len(), 2);
    }

    #[test]
    fn test_keywords_canonical_form_is_sequence() {
        let keywords = Keywords::parse_joined("a, b");
        assert!(matches!(keywords.to_value(), Value::Sequence(ref s) if s.len() == 2));
    }

    #[test]
    fn test_extend_unique_respects_cap_and_order() {
        let mut keywords = Keywords::from_iter_trimmed(["a", "b"]);
        keywords.extend_unique(["b", "c", "d", "e"], 4);
        assert_eq!(keywords.as_slice(), &["a", "b", "c", "d"]);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&Value::String(String::new())));
        assert!(is_truthy(&Value::String("x".into())));
        assert!(!is_truthy(&Value::Sequence(vec![])));
        assert!(!is_truthy(&Value::Bool(false)));
    }

    #[test]
    fn test_issue_kind_identifiers() {
        assert_eq!(IssueKind::CHECKLIST.len(), 17);
        assert_eq!(IssueKind::LowContentDensity.as_str(), "low_content_density");
        assert!(IssueKind::MissingFrontmatter.is_structural());
        assert!(!IssueKind::MissingTitle.is_structural());
    }

    #[test]
    fn test_structured_type_parse() {
        assert_eq!(StructuredDataType::parse("DefinedTerm"), StructuredDataType::DefinedTerm);
        assert_eq!(
            StructuredDataType::parse("HowTo"),
            StructuredDataType::Other("HowTo".to_string())
        );
    }
}
