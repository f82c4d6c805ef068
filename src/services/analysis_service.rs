// AnalysisService - runs the issue detector over a file or directory
//
// Documents are visited in file-name order so duplicate detection is
// reproducible; reports are optional so the full pipeline can reuse this.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::SeoConfig;
use crate::issue_detector::{CorpusStatistics, DocumentReport, IssueDetector};
use crate::observability::{log_operation, Operation, OperationContext, RunCounters};
use crate::reports::{write_reports, ReportPaths};
use crate::types::DocumentPath;
use crate::validation::target::validate_target;

use super::discover_documents;

/// Options for an analysis pass
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub target: PathBuf,
    /// Where CSV reports go; `None` skips report writing
    pub output_dir: Option<PathBuf>,
}

/// Result of an analysis pass
#[derive(Debug, Clone)]
pub struct AnalyzeResult {
    pub stats: CorpusStatistics,
    pub reports: Vec<DocumentReport>,
    pub counters: RunCounters,
    pub report_paths: Option<ReportPaths>,
}

/// Service for corpus-wide SEO auditing
pub struct AnalysisService {
    detector: IssueDetector,
}

impl AnalysisService {
    pub fn new(config: &SeoConfig) -> Self {
        Self {
            detector: IssueDetector::new(config.analysis.clone()),
        }
    }

    /// Analyse every Markdown document under the target.
    ///
    /// Fails only when the target itself is unusable or reports cannot be written.
    pub async fn analyze(&self, options: AnalyzeOptions) -> Result<AnalyzeResult> {
        validate_target(&options.target)?;
        let ctx = OperationContext::new("analyze");

        let mut stats = CorpusStatistics::new();
        let mut reports = Vec::new();
        let mut counters = RunCounters::default();

        info!("Analyzing SEO status: {}", options.target.display());
        for path in discover_documents(&options.target) {
            counters.seen += 1;
            match self
                .analyze_path(&ctx, &mut stats, &path, &options.target)
                .await
            {
                Ok(report) if report.skipped => {
                    counters.skipped += 1;
                    reports.push(report);
                }
                Ok(report) => {
                    counters.succeeded += 1;
                    reports.push(report);
                }
                Err(e) => {
                    log_operation(
                        &ctx,
                        &Operation::DocumentFailed {
                            document: DocumentPath::relative_to(&path, &options.target).to_string(),
                        },
                        &Err(e),
                    );
                    counters.failed += 1;
                }
            }
        }

        let report_paths = match &options.output_dir {
            Some(dir) => Some(write_reports(&stats, dir).await?),
            None => None,
        };

        info!(
            "Found {} SEO issue(s) across {} file(s); {} analyzed, {} skipped",
            stats.total_issues(),
            stats.document_issues().len(),
            stats.documents_analyzed(),
            counters.skipped
        );

        Ok(AnalyzeResult {
            stats,
            reports,
            counters,
            report_paths,
        })
    }

    async fn analyze_path(
        &self,
        ctx: &OperationContext,
        stats: &mut CorpusStatistics,
        path: &Path,
        root: &Path,
    ) -> Result<DocumentReport> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let document = DocumentPath::relative_to(path, root);
        let report = self.detector.analyze(stats, &document, &text);

        let op = if report.skipped {
            Operation::DocumentSkipped {
                document: document.to_string(),
                reason: report
                    .issues
                    .first()
                    .map(|kind| kind.label().to_string())
                    .unwrap_or_default(),
            }
        } else {
            Operation::DocumentAnalyzed {
                document: document.to_string(),
                issue_count: report.issues.len(),
            }
        };
        log_operation(ctx, &op, &Ok(()));

        Ok(report)
    }
}
