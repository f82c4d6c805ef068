// Issue Detector - rule-based SEO checklist over parsed documents
// Corpus-wide state (seen titles/descriptions, keyword tally, per-kind counters)
// lives in an explicit CorpusStatistics accumulator owned by the caller.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::frontmatter::{parse_document, FrontmatterError, MetadataRecord};
use crate::pure::markdown;
use crate::types::{DocumentPath, IssueKind, Keywords};

/// Accumulated state of one analysis run.
///
/// Create one per run; nothing is shared between runs.
#[derive(Debug, Clone, Default)]
pub struct CorpusStatistics {
    seen_titles: HashSet<String>,
    seen_descriptions: HashSet<String>,
    keyword_frequencies: IndexMap<String, usize>,
    issue_counts: IndexMap<IssueKind, usize>,
    document_issues: IndexMap<DocumentPath, Vec<IssueKind>>,
    documents_seen: usize,
    documents_analyzed: usize,
}

impl CorpusStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, document: &DocumentPath, kind: IssueKind) {
        *self.issue_counts.entry(kind).or_insert(0) += 1;
        self.document_issues
            .entry(document.clone())
            .or_default()
            .push(kind);
    }

    /// Number of times `kind` was reported across the corpus
    pub fn issue_count(&self, kind: IssueKind) -> usize {
        self.issue_counts.get(&kind).copied().unwrap_or(0)
    }

    /// Per-kind counters in first-reported order
    pub fn issue_counts(&self) -> &IndexMap<IssueKind, usize> {
        &self.issue_counts
    }

    pub fn total_issues(&self) -> usize {
        self.issue_counts.values().sum()
    }

    /// Issues of one document, in detection order
    pub fn issues_for(&self, document: &DocumentPath) -> &[IssueKind] {
        self.document_issues
            .get(document)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Documents with at least one issue, in processing order
    pub fn document_issues(&self) -> &IndexMap<DocumentPath, Vec<IssueKind>> {
        &self.document_issues
    }

    /// Keyword tally in first-seen order
    pub fn keyword_frequencies(&self) -> &IndexMap<String, usize> {
        &self.keyword_frequencies
    }

    /// Keyword tally sorted by count, descending; ties keep first-seen order
    pub fn ranked_keywords(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .keyword_frequencies
            .iter()
            .map(|(keyword, count)| (keyword.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Every document handed to the detector, skipped ones included
    pub fn documents_seen(&self) -> usize {
        self.documents_seen
    }

    /// Documents that had a usable front-block and went through the checklist
    pub fn documents_analyzed(&self) -> usize {
        self.documents_analyzed
    }
}

/// Outcome of analysing a single document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub document: DocumentPath,
    pub issues: Vec<IssueKind>,
    /// The document had no usable front-block and was not checked further
    pub skipped: bool,
}

impl DocumentReport {
    pub fn has(&self, kind: IssueKind) -> bool {
        self.issues.contains(&kind)
    }
}

/// Applies the SEO checklist using the configured bounds
#[derive(Debug, Clone)]
pub struct IssueDetector {
    config: AnalysisConfig,
}

impl Default for IssueDetector {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl IssueDetector {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse raw document text, updating the corpus accumulator.
    ///
    /// Documents without a usable front-block get a single structural issue
    /// and no other checks.
    pub fn analyze(
        &self,
        stats: &mut CorpusStatistics,
        document: &DocumentPath,
        text: &str,
    ) -> DocumentReport {
        stats.documents_seen += 1;
        let mut issues = Vec::new();

        let parsed = match parse_document(text) {
            Ok(parsed) => parsed,
            Err(err) => {
                let kind = match err {
                    FrontmatterError::Missing => IssueKind::MissingFrontmatter,
                    FrontmatterError::Invalid { .. } => IssueKind::InvalidFrontmatter,
                };
                debug!("Skipping {}: {}", document, err);
                stats.record(document, kind);
                return DocumentReport {
                    document: document.clone(),
                    issues: vec![kind],
                    skipped: true,
                };
            }
        };

        stats.documents_analyzed += 1;
        self.check_metadata(stats, &parsed.metadata, &mut issues);
        self.check_body(&parsed.body, &mut issues);

        for kind in &issues {
            stats.record(document, *kind);
        }

        debug!("Analyzed {}: {} issue(s)", document, issues.len());
        DocumentReport {
            document: document.clone(),
            issues,
            skipped: false,
        }
    }

    fn check_metadata(
        &self,
        stats: &mut CorpusStatistics,
        metadata: &MetadataRecord,
        issues: &mut Vec<IssueKind>,
    ) {
        match metadata.title() {
            None => issues.push(IssueKind::MissingTitle),
            Some(title) => {
                if stats.seen_titles.contains(&title) {
                    issues.push(IssueKind::DuplicateTitle);
                }
                stats.seen_titles.insert(title);
            }
        }

        match metadata.description() {
            None => issues.push(IssueKind::MissingDescription),
            Some(description) => {
                let length = description.chars().count();
                if length < self.config.min_description_length {
                    issues.push(IssueKind::ShortDescription);
                } else if length > self.config.max_description_length {
                    issues.push(IssueKind::LongDescription);
                }

                if stats.seen_descriptions.contains(&description) {
                    issues.push(IssueKind::DuplicateDescription);
                }
                stats.seen_descriptions.insert(description);
            }
        }

        match metadata.truthy("keywords").and_then(Keywords::from_value) {
            None => issues.push(IssueKind::MissingKeywords),
            Some(keywords) => {
                if keywords.len() < self.config.min_keywords_count {
                    issues.push(IssueKind::FewKeywords);
                } else if keywords.len() > self.config.max_keywords_count {
                    issues.push(IssueKind::ManyKeywords);
                }

                for keyword in keywords.iter() {
                    *stats
                        .keyword_frequencies
                        .entry(keyword.to_string())
                        .or_insert(0) += 1;
                }
            }
        }

        if metadata.truthy("structuredData").is_none() {
            issues.push(IssueKind::MissingStructuredData);
        }

        if metadata.truthy("datePublished").is_none() || metadata.truthy("dateModified").is_none()
        {
            issues.push(IssueKind::MissingDates);
        }
    }

    fn check_body(&self, body: &str, issues: &mut Vec<IssueKind>) {
        if markdown::has_image_without_alt(body) {
            issues.push(IssueKind::MissingAltText);
        }

        let internal_links = markdown::internal_link_targets(body).len();
        if internal_links == 0 {
            issues.push(IssueKind::NoInternalLinks);
        } else if internal_links < self.config.min_internal_links {
            issues.push(IssueKind::FewInternalLinks);
        }

        if markdown::subheadings(body).is_empty() {
            issues.push(IssueKind::NoHeadings);
        }

        if markdown::has_long_paragraph(body, self.config.max_paragraph_length) {
            issues.push(IssueKind::LongParagraphs);
        }

        if markdown::content_density(body) < self.config.min_content_length {
            issues.push(IssueKind::LowContentDensity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Body that passes every body check
    fn healthy_body() -> String {
        format!(
            "## Section\n\n{}\n\n[one](./one.md) and [two](../two.md)\n",
            "文".repeat(220)
        )
    }

    fn document(front: &str) -> String {
        format!("---\n{front}---\n{}", healthy_body())
    }

    fn complete_front(title: &str, description: &str) -> String {
        format!(
            "title: {title}\ndescription: {description}\nkeywords: a, b, c\nstructuredData:\n  type: Article\ndatePublished: '2024-01-01T00:00:00Z'\ndateModified: '2024-01-02T00:00:00Z'\n"
        )
    }

    #[test]
    fn test_complete_document_has_no_issues() {
        let detector = IssueDetector::default();
        let mut stats = CorpusStatistics::new();
        let description = "d".repeat(80);
        let report = detector.analyze(
            &mut stats,
            &DocumentPath::new("a.md"),
            &document(&complete_front("A", &description)),
        );
        assert_eq!(report.issues, Vec::<IssueKind>::new());
        assert_eq!(stats.documents_analyzed(), 1);
        assert_eq!(stats.total_issues(), 0);
    }

    #[test]
    fn test_description_length_bounds() {
        let detector = IssueDetector::default();
        for (length, expected) in [
            (49, Some(IssueKind::ShortDescription)),
            (50, None),
            (160, None),
            (161, Some(IssueKind::LongDescription)),
        ] {
            let mut stats = CorpusStatistics::new();
            let description = "x".repeat(length);
            let report = detector.analyze(
                &mut stats,
                &DocumentPath::new("d.md"),
                &document(&complete_front("T", &description)),
            );
            let flagged: Vec<_> = report
                .issues
                .iter()
                .filter(|k| {
                    matches!(k, IssueKind::ShortDescription | IssueKind::LongDescription)
                })
                .copied()
                .collect();
            assert_eq!(flagged, expected.into_iter().collect::<Vec<_>>(), "length {length}");
        }
    }

    #[test]
    fn test_keyword_count_bounds_and_tally() {
        let detector = IssueDetector::default();
        let mut stats = CorpusStatistics::new();
        let cases = [
            ("a, b", Some(IssueKind::FewKeywords)),
            ("a, b, c", None),
            ("k1,k2,k3,k4,k5,k6,k7,k8,k9,k10,k11", Some(IssueKind::ManyKeywords)),
        ];
        for (i, (keywords, expected)) in cases.iter().enumerate() {
            let text = format!("---\ntitle: t{i}\nkeywords: {keywords}\n---\n");
            let report = detector.analyze(&mut stats, &DocumentPath::new(format!("{i}.md")), &text);
            assert_eq!(report.has(IssueKind::FewKeywords), *expected == Some(IssueKind::FewKeywords));
            assert_eq!(report.has(IssueKind::ManyKeywords), *expected == Some(IssueKind::ManyKeywords));
        }
        assert_eq!(stats.keyword_frequencies().get("a"), Some(&2));
        assert_eq!(stats.ranked_keywords()[0], ("a", 2));
    }

    #[test]
    fn test_trailing_comma_does_not_count_as_keyword() {
        let detector = IssueDetector::default();
        let mut stats = CorpusStatistics::new();
        let report = detector.analyze(
            &mut stats,
            &DocumentPath::new("t.md"),
            "---\nkeywords: a, b,\n---\n",
        );
        assert!(report.has(IssueKind::FewKeywords));
        assert_eq!(stats.keyword_frequencies().len(), 2);
        assert!(stats.keyword_frequencies().get("").is_none());
    }

    #[test]
    fn test_keyword_list_form_is_accepted() {
        let detector = IssueDetector::default();
        let mut stats = CorpusStatistics::new();
        let text = "---\nkeywords:\n  - 十神\n  - 命理\n  - 八字\n---\n";
        let report = detector.analyze(&mut stats, &DocumentPath::new("k.md"), text);
        assert!(!report.has(IssueKind::MissingKeywords));
        assert!(!report.has(IssueKind::FewKeywords));
        assert_eq!(stats.keyword_frequencies().len(), 3);
    }

    #[test]
    fn test_duplicate_title_flags_only_second() {
        let detector = IssueDetector::default();
        let mut stats = CorpusStatistics::new();
        let first = detector.analyze(&mut stats, &DocumentPath::new("1.md"), "---\ntitle: Same\n---\n");
        let second = detector.analyze(&mut stats, &DocumentPath::new("2.md"), "---\ntitle: Same\n---\n");
        assert!(!first.has(IssueKind::DuplicateTitle));
        assert!(second.has(IssueKind::DuplicateTitle));
        assert_eq!(stats.issue_count(IssueKind::DuplicateTitle), 1);
        assert!(!stats.issues_for(&DocumentPath::new("1.md")).contains(&IssueKind::DuplicateTitle));
    }

    #[test]
    fn test_structural_failures_skip_other_checks() {
        let detector = IssueDetector::default();
        let mut stats = CorpusStatistics::new();
        let missing = detector.analyze(&mut stats, &DocumentPath::new("m.md"), "# no front block");
        let invalid = detector.analyze(&mut stats, &DocumentPath::new("i.md"), "---\n: [\n---\n");
        assert_eq!(missing.issues, vec![IssueKind::MissingFrontmatter]);
        assert_eq!(invalid.issues, vec![IssueKind::InvalidFrontmatter]);
        assert!(missing.skipped && invalid.skipped);
        assert_eq!(stats.documents_seen(), 2);
        assert_eq!(stats.documents_analyzed(), 0);
    }

    #[test]
    fn test_empty_front_block_reports_missing_fields() {
        let detector = IssueDetector::default();
        let mut stats = CorpusStatistics::new();
        let report = detector.analyze(&mut stats, &DocumentPath::new("e.md"), "---\n---\n");
        for kind in [
            IssueKind::MissingTitle,
            IssueKind::MissingDescription,
            IssueKind::MissingKeywords,
            IssueKind::MissingStructuredData,
            IssueKind::MissingDates,
            IssueKind::NoInternalLinks,
            IssueKind::NoHeadings,
            IssueKind::LowContentDensity,
        ] {
            assert!(report.has(kind), "expected {kind}");
        }
        assert!(!report.has(IssueKind::MissingAltText));
    }

    #[test]
    fn test_one_date_missing_is_enough() {
        let detector = IssueDetector::default();
        let mut stats = CorpusStatistics::new();
        let report = detector.analyze(
            &mut stats,
            &DocumentPath::new("d.md"),
            "---\ndatePublished: '2024-01-01T00:00:00Z'\n---\n",
        );
        assert!(report.has(IssueKind::MissingDates));
    }

    #[test]
    fn test_body_checks() {
        let detector = IssueDetector::default();
        let mut stats = CorpusStatistics::new();
        let body = format!(
            "![](a.png) ![](b.png)\n\n[only](./x.md)\n\n{}\n",
            "长".repeat(301)
        );
        let report = detector.analyze(&mut stats, &DocumentPath::new("b.md"), &format!("---\n---\n{body}"));
        assert_eq!(
            report.issues.iter().filter(|k| **k == IssueKind::MissingAltText).count(),
            1
        );
        assert!(report.has(IssueKind::FewInternalLinks));
        assert!(!report.has(IssueKind::NoInternalLinks));
        assert!(report.has(IssueKind::NoHeadings));
        assert!(report.has(IssueKind::LongParagraphs));
        assert!(!report.has(IssueKind::LowContentDensity));
    }

    #[test]
    fn test_content_density_boundary() {
        let detector = IssueDetector::default();
        for (chars, flagged) in [(199, true), (200, false)] {
            let mut stats = CorpusStatistics::new();
            let text = format!("---\n---\n**{}**\n", "a".repeat(chars));
            let report = detector.analyze(&mut stats, &DocumentPath::new("c.md"), &text);
            assert_eq!(report.has(IssueKind::LowContentDensity), flagged, "{chars} chars");
        }
    }

    #[test]
    fn test_counters_match_document_lists() {
        let detector = IssueDetector::default();
        let mut stats = CorpusStatistics::new();
        detector.analyze(&mut stats, &DocumentPath::new("1.md"), "---\n---\n");
        detector.analyze(&mut stats, &DocumentPath::new("2.md"), "nothing");
        let listed: usize = stats.document_issues().values().map(Vec::len).sum();
        assert_eq!(listed, stats.total_issues());
    }
}
