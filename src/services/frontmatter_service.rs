// FrontmatterService - synthesis write-back, preview, keyword repair and translation
//
// The synthesizer stays pure; this service does the I/O, asks the optional
// enhancer for values and decides what happens to each document.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SeoConfig;
use crate::contracts::{EnhancementContext, Enhancer, Suggestion, SuggestionKind};
use crate::frontmatter::{
    parse_document, render_document, serialize_metadata, FrontmatterError, MetadataRecord,
    ParsedDocument,
};
use crate::observability::{log_operation, Operation, OperationContext, RunCounters};
use crate::path_utils::{parent_dir_name, write_atomic};
use crate::pure::markdown;
use crate::synthesizer::{EnhancedValues, FrontmatterSynthesizer, SynthesisContext};
use crate::types::{DocumentPath, Keywords};
use crate::validation::target::{validate_target, TargetKind};
use crate::validation::ValidationError;

use super::discover_documents;

/// Options for a synthesis pass
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub target: PathBuf,
    /// Render merged front-blocks without touching files
    pub preview: bool,
    /// Treat a document without a front-block as having an empty one
    pub create_missing: bool,
    /// In preview mode, also ask the enhancer for a free-text SEO review
    pub with_analysis: bool,
}

/// What happened to one document
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Written {
        document: DocumentPath,
        metadata: MetadataRecord,
    },
    Previewed {
        document: DocumentPath,
        front_block: String,
        analysis: Option<String>,
    },
    Skipped {
        document: DocumentPath,
        reason: String,
    },
    Failed {
        document: DocumentPath,
        error: String,
    },
}

/// Result of a synthesis pass
#[derive(Debug, Clone, Default)]
pub struct UpdateResult {
    pub outcomes: Vec<DocumentOutcome>,
    pub counters: RunCounters,
}

/// How a document's keywords were repaired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordFix {
    AlreadyCanonical,
    Converted,
    AddedEmpty,
}

#[derive(Debug, Clone, Default)]
pub struct FixKeywordsResult {
    pub fixes: Vec<(DocumentPath, KeywordFix)>,
    pub counters: RunCounters,
}

#[derive(Debug, Clone)]
pub struct TranslateOptions {
    pub file: PathBuf,
    pub source_lang: String,
    pub target_lang: String,
    /// Directory receiving `<stem>_<lang>.md`
    pub output_dir: PathBuf,
}

/// Service for frontmatter synthesis and repair
pub struct FrontmatterService {
    synthesizer: FrontmatterSynthesizer,
    enhancer: Option<Arc<dyn Enhancer>>,
    min_description_length: usize,
    description_target_length: usize,
    fixed_now: Option<DateTime<Utc>>,
}

impl FrontmatterService {
    pub fn new(config: &SeoConfig, enhancer: Option<Arc<dyn Enhancer>>) -> Self {
        Self {
            synthesizer: FrontmatterSynthesizer::new(config),
            enhancer,
            min_description_length: config.analysis.min_description_length,
            description_target_length: config.synthesis.description_max_length,
            fixed_now: None,
        }
    }

    /// Use a fixed synthesis timestamp instead of the wall clock
    pub fn with_fixed_time(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    pub fn has_enhancer(&self) -> bool {
        self.enhancer.is_some()
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    /// Synthesize frontmatter for every document under the target
    pub async fn update(&self, options: UpdateOptions) -> Result<UpdateResult> {
        validate_target(&options.target)?;
        let ctx = OperationContext::new(if options.preview { "preview" } else { "update" });
        let mut result = UpdateResult::default();

        info!(
            "Updating frontmatter{}: {}",
            if self.enhancer.is_some() { " (enhanced)" } else { "" },
            options.target.display()
        );

        for path in discover_documents(&options.target) {
            let document = DocumentPath::relative_to(&path, &options.target);
            result.counters.seen += 1;

            let outcome = match self.update_document(&ctx, &path, &document, &options).await {
                Ok(outcome) => outcome,
                Err(e) => DocumentOutcome::Failed {
                    document: document.clone(),
                    error: format!("{e:#}"),
                },
            };

            match &outcome {
                DocumentOutcome::Written { .. } | DocumentOutcome::Previewed { .. } => {
                    result.counters.succeeded += 1
                }
                DocumentOutcome::Skipped { reason, .. } => {
                    log_operation(
                        &ctx,
                        &Operation::DocumentSkipped {
                            document: document.to_string(),
                            reason: reason.clone(),
                        },
                        &Ok(()),
                    );
                    result.counters.skipped += 1;
                }
                DocumentOutcome::Failed { error, .. } => {
                    log_operation(
                        &ctx,
                        &Operation::DocumentFailed {
                            document: document.to_string(),
                        },
                        &Err(anyhow!(error.clone())),
                    );
                    result.counters.failed += 1;
                }
            }
            result.outcomes.push(outcome);
        }

        log_operation(
            &ctx,
            &Operation::RunCompleted {
                succeeded: result.counters.succeeded,
                failed: result.counters.failed,
            },
            &Ok(()),
        );
        info!(
            "Frontmatter update finished: {} succeeded, {} skipped, {} failed",
            result.counters.succeeded, result.counters.skipped, result.counters.failed
        );
        Ok(result)
    }

    async fn update_document(
        &self,
        ctx: &OperationContext,
        path: &Path,
        document: &DocumentPath,
        options: &UpdateOptions,
    ) -> Result<DocumentOutcome> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let parsed = match parse_document(&text) {
            Ok(parsed) => parsed,
            Err(FrontmatterError::Missing) if options.create_missing => ParsedDocument {
                metadata: MetadataRecord::new(),
                body: text.clone(),
            },
            Err(e) => {
                return Ok(DocumentOutcome::Skipped {
                    document: document.clone(),
                    reason: e.to_string(),
                })
            }
        };

        let synthesis = SynthesisContext::for_path(path, self.now());
        let enhanced = self.gather_enhancements(ctx, document, &parsed, &synthesis).await;
        let merged =
            self.synthesizer
                .synthesize(&parsed.metadata, &parsed.body, &synthesis, &enhanced);
        log_operation(
            ctx,
            &Operation::FrontmatterSynthesized {
                document: document.to_string(),
                preview: options.preview,
            },
            &Ok(()),
        );

        if options.preview {
            let front_block = serialize_metadata(&merged)?;
            let analysis = if options.with_analysis {
                self.request_analysis(ctx, document, &text).await
            } else {
                None
            };
            return Ok(DocumentOutcome::Previewed {
                document: document.clone(),
                front_block,
                analysis,
            });
        }

        let rendered = render_document(&merged, &parsed.body)?;
        write_atomic(path, &rendered).await?;
        log_operation(
            ctx,
            &Operation::DocumentWritten {
                document: document.to_string(),
                size_bytes: rendered.len(),
            },
            &Ok(()),
        );

        Ok(DocumentOutcome::Written {
            document: document.clone(),
            metadata: merged,
        })
    }

    /// Ask the enhancer for each field the document is missing.
    /// Any failure leaves that field to the heuristics.
    async fn gather_enhancements(
        &self,
        ctx: &OperationContext,
        document: &DocumentPath,
        parsed: &ParsedDocument,
        synthesis: &SynthesisContext,
    ) -> EnhancedValues {
        let Some(enhancer) = &self.enhancer else {
            return EnhancedValues::none();
        };

        let existing = &parsed.metadata;
        let directory = synthesis.parent_dir.clone();
        let base = |kind: SuggestionKind| {
            EnhancementContext::new(kind, document.as_str())
                .with_directory(directory.clone())
                .with_title(
                    existing
                        .title()
                        .or_else(|| markdown::first_title_heading(&parsed.body)),
                )
                .with_description(existing.description())
        };

        let mut values = EnhancedValues::none();

        match existing.truthy("description") {
            None => {
                let request = base(SuggestionKind::Description {
                    target_length: self.description_target_length,
                });
                if let Some(Suggestion::Description(text)) =
                    self.try_suggest(ctx, enhancer, &parsed.body, &request).await
                {
                    values.description = Some(text);
                }
            }
            // Authored descriptions are never replaced, only flagged
            Some(Value::String(description))
                if description.chars().count() < self.min_description_length =>
            {
                warn!(
                    "{}: description shorter than {} characters kept as authored",
                    document, self.min_description_length
                );
            }
            Some(_) => {}
        }

        if existing.keywords().is_none() {
            let seeds = self
                .synthesizer
                .table()
                .seed_keywords(directory.as_deref())
                .to_vec();
            let request = base(SuggestionKind::Keywords { seeds });
            if let Some(Suggestion::Keywords(keywords)) =
                self.try_suggest(ctx, enhancer, &parsed.body, &request).await
            {
                values.keywords = Some(keywords);
            }
        }

        if existing.structured_data_type().is_none() {
            let expected = self
                .synthesizer
                .table()
                .classify(directory.as_deref(), &synthesis.file_name);
            let request = base(SuggestionKind::StructuredType { expected });
            if let Some(Suggestion::StructuredType(kind)) =
                self.try_suggest(ctx, enhancer, &parsed.body, &request).await
            {
                values.structured_type = Some(kind);
            }
        }

        values
    }

    async fn try_suggest(
        &self,
        ctx: &OperationContext,
        enhancer: &Arc<dyn Enhancer>,
        text: &str,
        request: &EnhancementContext,
    ) -> Option<Suggestion> {
        match enhancer.suggest(text, request).await {
            Ok(suggestion) => Some(suggestion),
            Err(e) => {
                let kind = match &request.kind {
                    SuggestionKind::Description { .. } => "description",
                    SuggestionKind::Keywords { .. } => "keywords",
                    SuggestionKind::StructuredType { .. } => "structured_type",
                    SuggestionKind::Analysis => "analysis",
                    SuggestionKind::Translation { .. } => "translation",
                };
                warn!("{} ({}): {}", enhancer.name(), kind, e);
                log_operation(
                    ctx,
                    &Operation::EnhancementFailed {
                        document: request.document.clone(),
                        kind: kind.to_string(),
                    },
                    &Ok(()),
                );
                None
            }
        }
    }

    async fn request_analysis(
        &self,
        ctx: &OperationContext,
        document: &DocumentPath,
        text: &str,
    ) -> Option<String> {
        let enhancer = self.enhancer.as_ref()?;
        let request = EnhancementContext::new(SuggestionKind::Analysis, document.as_str());
        match self.try_suggest(ctx, enhancer, text, &request).await {
            Some(Suggestion::Analysis(analysis)) => Some(analysis),
            _ => None,
        }
    }

    /// Rewrite every `keywords` field into list form
    pub async fn fix_keywords(&self, target: &Path) -> Result<FixKeywordsResult> {
        validate_target(target)?;
        let ctx = OperationContext::new("fix_keywords");
        let mut result = FixKeywordsResult::default();

        for path in discover_documents(target) {
            let document = DocumentPath::relative_to(&path, target);
            result.counters.seen += 1;

            match fix_keywords_in_file(&path).await {
                Ok(Some(fix)) => {
                    if fix != KeywordFix::AlreadyCanonical {
                        info!("Fixed keywords ({:?}): {}", fix, document);
                    }
                    result.counters.succeeded += 1;
                    result.fixes.push((document, fix));
                }
                Ok(None) => {
                    log_operation(
                        &ctx,
                        &Operation::DocumentSkipped {
                            document: document.to_string(),
                            reason: "no usable front-block".to_string(),
                        },
                        &Ok(()),
                    );
                    result.counters.skipped += 1;
                }
                Err(e) => {
                    warn!("Failed to fix keywords in {}: {:#}", document, e);
                    result.counters.failed += 1;
                }
            }
        }

        info!(
            "Keyword repair finished: {} succeeded, {} skipped, {} failed",
            result.counters.succeeded, result.counters.skipped, result.counters.failed
        );
        Ok(result)
    }

    /// Translate one document through the enhancer into `<stem>_<lang>.md`
    pub async fn translate(&self, options: TranslateOptions) -> Result<PathBuf> {
        if validate_target(&options.file)? != TargetKind::File {
            bail!(ValidationError::InvalidInput {
                field: "path".to_string(),
                reason: "translation only supports a single file".to_string(),
            });
        }
        let enhancer = self
            .enhancer
            .as_ref()
            .ok_or_else(|| anyhow!("translation requires a configured enhancer"))?;

        let text = tokio::fs::read_to_string(&options.file)
            .await
            .with_context(|| format!("Failed to read {}", options.file.display()))?;

        let request = EnhancementContext::new(
            SuggestionKind::Translation {
                source_lang: options.source_lang.clone(),
                target_lang: options.target_lang.clone(),
            },
            options.file.display().to_string(),
        )
        .with_directory(parent_dir_name(&options.file));

        let translated = match enhancer.suggest(&text, &request).await? {
            Suggestion::Translation(translated) => translated,
            other => bail!("unexpected suggestion for translation: {:?}", other),
        };

        let stem = options
            .file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = options
            .output_dir
            .join(format!("{}_{}.md", stem, options.target_lang));
        write_atomic(&output, &translated).await?;
        info!("Translation written: {}", output.display());
        Ok(output)
    }
}

/// `None` when the document has no usable front-block
async fn fix_keywords_in_file(path: &Path) -> Result<Option<KeywordFix>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let Ok(mut parsed) = parse_document(&text) else {
        return Ok(None);
    };

    let fix = match parsed.metadata.get("keywords") {
        Some(Value::Sequence(_)) => return Ok(Some(KeywordFix::AlreadyCanonical)),
        Some(value) => {
            let keywords = Keywords::from_value(value).unwrap_or_default();
            parsed.metadata.insert("keywords", keywords.to_value());
            KeywordFix::Converted
        }
        None => {
            parsed.metadata.insert("keywords", Keywords::new().to_value());
            KeywordFix::AddedEmpty
        }
    };

    let rendered = render_document(&parsed.metadata, &parsed.body)?;
    write_atomic(path, &rendered).await?;
    Ok(Some(fix))
}
