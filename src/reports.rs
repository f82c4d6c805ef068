// Reports - tabular and JSON renderings of detector state
// Rows are built from a CorpusStatistics snapshot; writing is whole-file.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::issue_detector::CorpusStatistics;
use crate::path_utils::write_atomic;
use crate::types::{DocumentPath, IssueKind};

pub const ISSUE_SUMMARY_FILE: &str = "seo_stats.csv";
pub const ISSUE_DETAIL_FILE: &str = "seo_issues.csv";
pub const KEYWORD_FILE: &str = "keywords_stats.csv";
pub const RUN_SUMMARY_FILE: &str = "optimization_report.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueSummaryRow {
    pub kind: IssueKind,
    pub count: usize,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueDetailRow {
    pub document: DocumentPath,
    pub kind: IssueKind,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordRow {
    pub keyword: String,
    pub count: usize,
}

/// One row per reported kind, most frequent first
pub fn issue_summary_rows(stats: &CorpusStatistics) -> Vec<IssueSummaryRow> {
    let mut rows: Vec<IssueSummaryRow> = stats
        .issue_counts()
        .iter()
        .map(|(kind, count)| IssueSummaryRow {
            kind: *kind,
            count: *count,
            label: kind.label(),
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// One row per (document, issue), documents in path order
pub fn issue_detail_rows(stats: &CorpusStatistics) -> Vec<IssueDetailRow> {
    let mut documents: Vec<(&DocumentPath, &Vec<IssueKind>)> =
        stats.document_issues().iter().collect();
    documents.sort_by(|a, b| a.0.cmp(b.0));

    documents
        .into_iter()
        .flat_map(|(document, issues)| {
            issues.iter().map(move |kind| IssueDetailRow {
                document: document.clone(),
                kind: *kind,
                label: kind.label(),
            })
        })
        .collect()
}

pub fn keyword_rows(stats: &CorpusStatistics) -> Vec<KeywordRow> {
    stats
        .ranked_keywords()
        .into_iter()
        .map(|(keyword, count)| KeywordRow {
            keyword: keyword.to_string(),
            count,
        })
        .collect()
}

/// Quote a CSV field when it contains a separator, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line(fields: &[&str]) -> String {
    let mut line = fields
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

pub fn render_issue_summary(rows: &[IssueSummaryRow]) -> String {
    let mut csv = csv_line(&["issue_type", "count", "description"]);
    for row in rows {
        csv.push_str(&csv_line(&[row.kind.as_str(), &row.count.to_string(), row.label]));
    }
    csv
}

pub fn render_issue_detail(rows: &[IssueDetailRow]) -> String {
    let mut csv = csv_line(&["file_path", "issue_type", "description"]);
    for row in rows {
        csv.push_str(&csv_line(&[row.document.as_str(), row.kind.as_str(), row.label]));
    }
    csv
}

pub fn render_keywords(rows: &[KeywordRow]) -> String {
    let mut csv = csv_line(&["keyword", "count"]);
    for row in rows {
        csv.push_str(&csv_line(&[&row.keyword, &row.count.to_string()]));
    }
    csv
}

/// Record of one full optimization run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub timestamp: String,
    pub duration_secs: f64,
    pub target: String,
    pub enhancer_enabled: bool,
    pub preview_mode: bool,
    pub seo_issues: usize,
    /// Documents that went through the checklist (structural skips excluded)
    pub files_analyzed: usize,
    pub files_with_issues: usize,
    pub documents_updated: usize,
    pub documents_failed: usize,
    pub output_dir: String,
}

pub fn render_run_summary(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("Failed to serialize run summary")
}

/// Files produced by [`write_reports`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub issue_summary: PathBuf,
    pub issue_detail: PathBuf,
    pub keywords: PathBuf,
}

/// Write the three CSV reports into `output_dir`, creating it if needed
pub async fn write_reports(stats: &CorpusStatistics, output_dir: &Path) -> Result<ReportPaths> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create report directory {}", output_dir.display()))?;

    let paths = ReportPaths {
        issue_summary: output_dir.join(ISSUE_SUMMARY_FILE),
        issue_detail: output_dir.join(ISSUE_DETAIL_FILE),
        keywords: output_dir.join(KEYWORD_FILE),
    };

    write_atomic(&paths.issue_summary, &render_issue_summary(&issue_summary_rows(stats))).await?;
    write_atomic(&paths.issue_detail, &render_issue_detail(&issue_detail_rows(stats))).await?;
    write_atomic(&paths.keywords, &render_keywords(&keyword_rows(stats))).await?;

    info!(
        "SEO reports written to {}: {} issue(s) across {} file(s)",
        output_dir.display(),
        stats.total_issues(),
        stats.document_issues().len()
    );
    Ok(paths)
}

pub async fn write_run_summary(summary: &RunSummary, output_dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create report directory {}", output_dir.display()))?;
    let path = output_dir.join(RUN_SUMMARY_FILE);
    write_atomic(&path, &render_run_summary(summary)?).await?;
    Ok(path)
}
