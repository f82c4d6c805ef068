// Frontmatter - Metadata Parser and canonical front-block serializer
// Splits a document into its YAML front-block and body, and writes merged
// records back using the same `---` delimiter convention.

use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::types::{is_truthy, scalar_to_string, Keywords, StructuredDataType};

/// Delimiter line opening and closing a front-block
pub const DELIMITER: &str = "---";

/// Why a document has no usable front-block
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrontmatterError {
    #[error("document does not begin with a `---` front-block")]
    Missing,

    #[error("front-block is not a valid key-value mapping: {message}")]
    Invalid { message: String },
}

/// Ordered key-value metadata of one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRecord {
    inner: Mapping,
}

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mapping(inner: Mapping) -> Self {
        Self { inner }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Insert or replace a value; a new key goes to the end of the record
    pub fn insert(&mut self, key: &str, value: Value) {
        self.inner.insert(Value::String(key.to_string()), value);
    }

    /// Insert under an arbitrary (possibly non-string) key
    pub fn insert_value(&mut self, key: Value, value: Value) {
        self.inner.insert(key, value);
    }

    /// Value of `key` when it is present and truthy
    pub fn truthy(&self, key: &str) -> Option<&Value> {
        self.get(key).filter(|value| is_truthy(value))
    }

    /// Text of a truthy scalar value
    pub fn text(&self, key: &str) -> Option<String> {
        self.truthy(key).and_then(scalar_to_string)
    }

    pub fn title(&self) -> Option<String> {
        self.text("title")
    }

    pub fn description(&self) -> Option<String> {
        self.text("description")
    }

    /// Keywords in either on-disk form; `None` when absent or empty
    pub fn keywords(&self) -> Option<Keywords> {
        self.truthy("keywords")
            .and_then(Keywords::from_value)
            .filter(|keywords| !keywords.is_empty())
    }

    /// `structuredData.type`, when the nested mapping carries one
    pub fn structured_data_type(&self) -> Option<StructuredDataType> {
        match self.get("structuredData") {
            Some(Value::Mapping(data)) => data
                .get("type")
                .filter(|value| is_truthy(value))
                .and_then(scalar_to_string)
                .map(|raw| StructuredDataType::parse(&raw)),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.inner
    }

    pub fn into_mapping(self) -> Mapping {
        self.inner
    }
}

/// A document split into metadata and body
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub metadata: MetadataRecord,
    /// Everything after the closing delimiter line
    pub body: String,
}

/// Locate the front-block; returns (yaml source, body) slices
fn split_front_block(text: &str) -> Option<(&str, &str)> {
    let after_open = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        let content = line.trim_end_matches('\n').trim_end_matches('\r');
        if content == DELIMITER {
            let yaml = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }

    None
}

/// Parse raw document text into metadata and body.
///
/// # Errors
/// - [`FrontmatterError::Missing`] when the text does not start with a
///   delimited block
/// - [`FrontmatterError::Invalid`] when the block is not a YAML mapping
pub fn parse_document(text: &str) -> Result<ParsedDocument, FrontmatterError> {
    let (yaml, body) = split_front_block(text).ok_or(FrontmatterError::Missing)?;

    if yaml.trim().is_empty() {
        return Ok(ParsedDocument {
            metadata: MetadataRecord::new(),
            body: body.to_string(),
        });
    }

    let value: Value = serde_yaml::from_str(yaml).map_err(|e| FrontmatterError::Invalid {
        message: e.to_string(),
    })?;

    let mapping = match value {
        Value::Null => Mapping::new(),
        Value::Mapping(mapping) => mapping,
        Value::Tagged(tagged) => match tagged.value {
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(FrontmatterError::Invalid {
                    message: "tagged front-block is not a mapping".to_string(),
                })
            }
        },
        _ => {
            return Err(FrontmatterError::Invalid {
                message: "front-block is not a mapping".to_string(),
            })
        }
    };

    Ok(ParsedDocument {
        metadata: MetadataRecord::from_mapping(mapping),
        body: body.to_string(),
    })
}

/// Serialize a record as the YAML between the delimiters (trailing newline included)
pub fn serialize_metadata(metadata: &MetadataRecord) -> Result<String, serde_yaml::Error> {
    if metadata.is_empty() {
        return Ok(String::new());
    }
    serde_yaml::to_string(metadata.as_mapping())
}

/// Render a full document: delimited front-block followed by the body
pub fn render_document(metadata: &MetadataRecord, body: &str) -> Result<String, serde_yaml::Error> {
    let yaml = serialize_metadata(metadata)?;
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_front_block() {
        let text = "---\ntitle: 比肩\nkeywords: a, b\n---\n# 比肩\n\nBody text.\n";
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.metadata.title().as_deref(), Some("比肩"));
        assert_eq!(doc.body, "# 比肩\n\nBody text.\n");
    }

    #[test]
    fn test_missing_front_block() {
        assert_eq!(parse_document("# Title\n\nbody"), Err(FrontmatterError::Missing));
        // Delimiter must be the very first line
        assert_eq!(
            parse_document("\n---\ntitle: x\n---\n"),
            Err(FrontmatterError::Missing)
        );
        // Unclosed block
        assert_eq!(
            parse_document("---\ntitle: x\nbody"),
            Err(FrontmatterError::Missing)
        );
    }

    #[test]
    fn test_invalid_front_block() {
        let text = "---\ntitle: [unclosed\n---\nbody";
        assert!(matches!(
            parse_document(text),
            Err(FrontmatterError::Invalid { .. })
        ));

        let text = "---\n- just\n- a list\n---\nbody";
        assert!(matches!(
            parse_document(text),
            Err(FrontmatterError::Invalid { .. })
        ));
    }

    #[test]
    fn test_empty_front_block_is_empty_mapping() {
        let doc = parse_document("---\n---\nbody").unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, "body");

        let doc = parse_document("---\n\n---\n").unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, "");
    }

    #[test]
    fn test_crlf_delimiters() {
        let doc = parse_document("---\r\ntitle: x\r\n---\r\nbody").unwrap();
        assert_eq!(doc.metadata.title().as_deref(), Some("x"));
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn test_structured_data_type_lookup() {
        let doc = parse_document("---\nstructuredData:\n  type: DefinedTerm\n---\n").unwrap();
        assert_eq!(
            doc.metadata.structured_data_type(),
            Some(StructuredDataType::DefinedTerm)
        );

        let doc = parse_document("---\nstructuredData: {}\n---\n").unwrap();
        assert_eq!(doc.metadata.structured_data_type(), None);
    }

    #[test]
    fn test_render_then_parse_preserves_order_and_nesting() {
        let text = "---\nzeta: 1\nalpha: two\nstructuredData:\n  type: Article\n  about:\n    name: 十神\n---\nbody\n";
        let doc = parse_document(text).unwrap();
        let rendered = render_document(&doc.metadata, &doc.body).unwrap();
        let reparsed = parse_document(&rendered).unwrap();
        assert_eq!(reparsed, doc);

        let keys: Vec<_> = reparsed
            .metadata
            .iter()
            .filter_map(|(k, _)| k.as_str().map(String::from))
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "structuredData"]);
    }
}
