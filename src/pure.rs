// Pure Functions - Content Heuristics
// Deterministic, side-effect free functions over Markdown body text.
// Both the issue detector and the frontmatter synthesizer are built on these.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Markdown surface scanning - images, links, headings, paragraphs, density
pub mod markdown {
    use super::*;

    static IMAGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"!\[(.*?)\]\((.*?)\)").expect("Failed to compile image regex")
    });

    static LINK_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("Failed to compile link regex")
    });

    static SUBHEADING_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?m)^##+ (.+)$").expect("Failed to compile subheading regex")
    });

    static TITLE_HEADING_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?m)^# (.+)$").expect("Failed to compile title heading regex")
    });

    static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\n\s*\n").expect("Failed to compile paragraph break regex")
    });

    static SYNTAX_MARKERS: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"#+ |\*\*|\*|_|`|!\[.*?\]\(.*?\)|\[.*?\]\(.*?\)")
            .expect("Failed to compile markdown syntax regex")
    });

    /// An inline image reference `![alt](target)`
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ImageRef<'a> {
        pub alt: &'a str,
        pub target: &'a str,
    }

    pub fn image_refs(body: &str) -> Vec<ImageRef<'_>> {
        IMAGE_PATTERN
            .captures_iter(body)
            .filter_map(|caps| {
                Some(ImageRef {
                    alt: caps.get(1)?.as_str(),
                    target: caps.get(2)?.as_str(),
                })
            })
            .collect()
    }

    /// True as soon as one image has an empty alt text
    pub fn has_image_without_alt(body: &str) -> bool {
        image_refs(body).iter().any(|image| image.alt.is_empty())
    }

    /// Targets of link references that do not point at `http...` URLs.
    /// Image references are not links.
    pub fn internal_link_targets(body: &str) -> Vec<&str> {
        LINK_PATTERN
            .captures_iter(body)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                if body[..whole.start()].ends_with('!') {
                    return None;
                }
                let target = caps.get(2)?.as_str().trim();
                (!target.starts_with("http")).then_some(target)
            })
            .collect()
    }

    /// Text of every h2-or-deeper heading line
    pub fn subheadings(body: &str) -> Vec<&str> {
        SUBHEADING_PATTERN
            .captures_iter(body)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim_end()))
            .collect()
    }

    /// Text of the first `# ` heading line
    pub fn first_title_heading(body: &str) -> Option<String> {
        TITLE_HEADING_PATTERN
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|title| !title.is_empty())
    }

    /// Split on blank-line boundaries
    pub fn paragraphs(body: &str) -> Vec<&str> {
        PARAGRAPH_BREAK.split(body).collect()
    }

    /// Whether any prose paragraph (not a heading or image block) exceeds `max_chars`
    pub fn has_long_paragraph(body: &str, max_chars: usize) -> bool {
        paragraphs(body).into_iter().any(|paragraph| {
            let trimmed = paragraph.trim();
            trimmed.chars().count() > max_chars
                && !trimmed.starts_with('#')
                && !trimmed.starts_with('!')
        })
    }

    /// Body with heading, emphasis, code, image and link syntax removed
    pub fn strip_syntax(body: &str) -> String {
        SYNTAX_MARKERS.replace_all(body, "").into_owned()
    }

    /// Characters of plain text left after stripping syntax and trimming
    pub fn content_density(body: &str) -> usize {
        strip_syntax(body).trim().chars().count()
    }
}

/// Description extraction from the first prose paragraph
pub mod description {
    use super::*;

    static HEADING_MARKER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"#+ ").expect("Failed to compile heading marker regex"));

    static IMAGE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("Failed to compile image regex")
    });

    static LINK: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("Failed to compile link regex")
    });

    static EMPHASIS: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"[*_]{1,2}([^*_]+)[*_]{1,2}").expect("Failed to compile emphasis regex")
    });

    /// Marker appended to truncated descriptions
    pub const ELLIPSIS: &str = "...";

    /// Remove heading markers, images, link syntax (keeping link text) and emphasis
    pub fn plain_text(body: &str) -> String {
        let text = HEADING_MARKER.replace_all(body, "");
        let text = IMAGE.replace_all(&text, "");
        let text = LINK.replace_all(&text, "$1");
        EMPHASIS.replace_all(&text, "$1").into_owned()
    }

    /// First non-empty paragraph of the plain text, truncated to `max_chars`
    /// with [`ELLIPSIS`] appended when cut. Empty when nothing qualifies.
    pub fn generate(body: &str, max_chars: usize) -> String {
        let text = plain_text(body);
        markdown::paragraphs(&text)
            .into_iter()
            .map(str::trim)
            .find(|paragraph| !paragraph.is_empty() && !paragraph.starts_with("---"))
            .map(|paragraph| truncate_chars(paragraph, max_chars))
            .unwrap_or_default()
    }

    pub fn truncate_chars(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            return text.to_string();
        }
        let mut truncated: String = text.chars().take(max_chars).collect();
        truncated.push_str(ELLIPSIS);
        truncated
    }
}

/// Frequency-based keyword extraction
pub mod keywords {
    use super::*;

    /// Runs of 2-5 CJK ideographs
    static CJK_TERM: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"[\x{4e00}-\x{9fff}]{2,5}").expect("Failed to compile CJK term regex")
    });

    /// Occurrence count of every candidate term, in first-seen order
    pub fn term_frequencies(body: &str) -> IndexMap<&str, usize> {
        let mut frequencies: IndexMap<&str, usize> = IndexMap::new();
        for term in CJK_TERM.find_iter(body) {
            *frequencies.entry(term.as_str()).or_insert(0) += 1;
        }
        frequencies
    }

    /// Up to `limit` most frequent terms; ties keep first-seen order
    pub fn extract(body: &str, limit: usize) -> Vec<String> {
        let mut ranked: Vec<(&str, usize)> = term_frequencies(body).into_iter().collect();
        // sort_by is stable, so equal counts stay in first-seen order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(limit)
            .map(|(term, _)| term.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_alt_detection() {
        assert!(markdown::has_image_without_alt("text ![](a.png) more"));
        assert!(!markdown::has_image_without_alt("![logo](a.png)"));
        assert!(!markdown::has_image_without_alt("no images here"));
    }

    #[test]
    fn test_internal_links_skip_http_and_images() {
        let body = "[a](./a.md) [b](https://x.io) ![img](pic.png) [c](../c)";
        assert_eq!(markdown::internal_link_targets(body), vec!["./a.md", "../c"]);
    }

    #[test]
    fn test_subheadings_require_two_hashes_and_space() {
        let body = "# Title\n## Section\n###Bad\n### Deep\n";
        assert_eq!(markdown::subheadings(body), vec!["Section", "Deep"]);
    }

    #[test]
    fn test_first_title_heading() {
        assert_eq!(
            markdown::first_title_heading("intro\n# 比肩\n## sub").as_deref(),
            Some("比肩")
        );
        assert_eq!(markdown::first_title_heading("## only sub"), None);
    }

    #[test]
    fn test_long_paragraph_ignores_headings_and_images() {
        let long = "x".repeat(301);
        assert!(markdown::has_long_paragraph(&format!("short\n\n{long}"), 300));
        assert!(!markdown::has_long_paragraph(&format!("# {long}"), 300));
        assert!(!markdown::has_long_paragraph(&format!("![a]({long})"), 300));
        assert!(!markdown::has_long_paragraph(&"y".repeat(300), 300));
    }

    #[test]
    fn test_content_density_strips_syntax() {
        assert_eq!(markdown::content_density("## **ab** `c` [link](x) ![i](y)"), 4);
        assert_eq!(markdown::content_density("  _a_  "), 1);
    }

    #[test]
    fn test_description_from_first_paragraph() {
        let body = "# 标题\n\n这是**第一段**，包含[链接](a.md)。\n\n第二段";
        assert_eq!(description::generate(body, 150), "标题");

        let body = "\n\n![](cover.png)\n\n这是**第一段**，包含[链接](a.md)。\n\n第二段";
        assert_eq!(description::generate(body, 150), "这是第一段，包含链接。");
    }

    #[test]
    fn test_description_truncation() {
        let body = "字".repeat(151);
        let generated = description::generate(&body, 150);
        assert_eq!(generated.chars().count(), 153);
        assert!(generated.ends_with(description::ELLIPSIS));

        assert_eq!(description::generate(&"字".repeat(150), 150).chars().count(), 150);
        assert_eq!(description::generate("   \n\n  ", 150), "");
    }

    #[test]
    fn test_keyword_extraction_ranks_by_frequency_then_first_seen() {
        let body = "甲木 乙木 乙木 丙火 丙火 丁火";
        assert_eq!(keywords::extract(body, 2), vec!["乙木", "丙火"]);
        assert_eq!(keywords::extract(body, 10).len(), 4);
        assert!(keywords::extract("plain ascii only", 5).is_empty());
    }
}
