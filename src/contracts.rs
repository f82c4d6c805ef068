// Contracts - collaborator seams
// The language-model enhancer is the only external collaborator the core
// talks to. It is injected behind this trait so the merge/precedence logic
// can be exercised without any network access.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Keywords, StructuredDataType};

/// What the enhancer is asked to produce
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionKind {
    /// Meta description of roughly `target_length` characters
    Description { target_length: usize },
    /// Keyword list; `seeds` should be included where relevant
    Keywords { seeds: Vec<String> },
    /// Structured-data classification, `expected` being the heuristic answer
    StructuredType { expected: StructuredDataType },
    /// Free-text SEO review of the document
    Analysis,
    /// Translation preserving Markdown structure
    Translation {
        source_lang: String,
        target_lang: String,
    },
}

/// Everything the enhancer may use besides the text itself
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancementContext {
    pub kind: SuggestionKind,
    /// Document identifier, for prompts and logs
    pub document: String,
    /// Immediate parent directory of the document
    pub directory: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl EnhancementContext {
    pub fn new(kind: SuggestionKind, document: impl Into<String>) -> Self {
        Self {
            kind,
            document: document.into(),
            directory: None,
            title: None,
            description: None,
        }
    }

    pub fn with_directory(mut self, directory: Option<String>) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

/// Successful enhancer answer, one variant per [`SuggestionKind`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Suggestion {
    Description(String),
    Keywords(Keywords),
    StructuredType(StructuredDataType),
    Analysis(String),
    Translation(String),
}

/// Why an enhancement is unavailable. Never fatal to a run.
#[derive(Debug, Error)]
pub enum EnhancementError {
    #[error("enhancer is not configured: {0}")]
    Unavailable(String),

    #[error("enhancer returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("enhancer request failed: {0}")]
    Transport(String),

    #[error("enhancer response could not be used: {0}")]
    MalformedResponse(String),
}

/// Language-model style collaborator
#[async_trait]
pub trait Enhancer: Send + Sync {
    /// Produce a suggestion for `text`
    ///
    /// # Preconditions
    /// - `text` is the document body (front-block excluded) or, for
    ///   translations, the full document
    ///
    /// # Postconditions
    /// - On success the returned variant matches `context.kind`
    /// - Any failure (timeout, authorization, unusable output) is reported
    ///   as an [`EnhancementError`]; callers fall back to heuristics
    /// - No retries are performed
    async fn suggest(
        &self,
        text: &str,
        context: &EnhancementContext,
    ) -> Result<Suggestion, EnhancementError>;

    /// Short name for logs
    fn name(&self) -> &str;
}
