// DocSEO - SEO auditing and frontmatter synthesis for Markdown documentation
// Root library module

pub mod config;
pub mod contracts;
pub mod enhancer;
pub mod frontmatter;
pub mod issue_detector;
pub mod observability;
pub mod path_utils;
pub mod pure;
pub mod reports;
pub mod services;
pub mod site_files;
pub mod synthesizer;
pub mod types;
pub mod validation;

// Re-export key types
pub use observability::{
    init_logging,
    init_logging_with_level,
    log_operation,
    with_trace_id,
    Operation,
    RunCounters,
};

pub use contracts::{
    EnhancementContext,
    EnhancementError,
    Enhancer,
    Suggestion,
    SuggestionKind,
};

pub use types::{
    DocumentPath,
    IssueKind,
    Keywords,
    StructuredDataType,
};

pub use config::SeoConfig;
pub use enhancer::CompletionEnhancer;
pub use frontmatter::{parse_document, render_document, FrontmatterError, MetadataRecord, ParsedDocument};
pub use issue_detector::{CorpusStatistics, DocumentReport, IssueDetector};
pub use synthesizer::{ClassificationTable, EnhancedValues, FrontmatterSynthesizer, SynthesisContext};
pub use validation::ValidationError;
