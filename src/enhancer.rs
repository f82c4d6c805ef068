// Completion Enhancer - language-model implementation of the Enhancer contract
// One POST per suggestion against a completions endpoint; no retries.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::EnhancerConfig;
use crate::contracts::{
    EnhancementContext, EnhancementError, Enhancer, Suggestion, SuggestionKind,
};
use crate::types::{Keywords, StructuredDataType};

/// Sampling parameters fixed by the completions deployment
const TOP_P: f32 = 0.95;

static KEYWORD_LEADING_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^a-zA-Z0-9\x{4e00}-\x{9fff},]+").expect("Failed to compile keyword prefix regex")
});

static KEYWORD_TRAILING_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-zA-Z0-9\x{4e00}-\x{9fff},]+$").expect("Failed to compile keyword suffix regex")
});

static JSON_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("Failed to compile JSON fence regex")
});

/// Per-kind request budget: (max input chars, max tokens, temperature).
/// Description and keyword requests use the configured temperature.
fn request_budget(kind: &SuggestionKind, config: &EnhancerConfig) -> (usize, u32, f32) {
    match kind {
        SuggestionKind::Description { .. } => (2000, 200, config.temperature),
        SuggestionKind::Keywords { .. } => (2000, 200, config.temperature),
        SuggestionKind::StructuredType { .. } => (1500, 1000, 0.3),
        SuggestionKind::Analysis => (3000, 1500, 0.5),
        SuggestionKind::Translation { .. } => (4000, config.max_tokens.max(4000), 0.3),
    }
}

fn head_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// Build the completion prompt for one request
pub fn build_prompt(text: &str, context: &EnhancementContext, input_limit: usize) -> String {
    let content = head_chars(text, input_limit);
    match &context.kind {
        SuggestionKind::Description { target_length } => format!(
            "Write an engaging SEO meta description of about {target_length} characters for the content below. \
             Include its key terms and keep the language of the content.\n\n\
             Content:\n{content}\n\n\
             Return only the description text."
        ),
        SuggestionKind::Keywords { seeds } => format!(
            "Suggest 5-8 SEO keywords that are highly relevant to the content below.\n\n\
             Content:\n{content}\n\n\
             Base keywords (include where relevant): {}\n\n\
             Return only the keywords, separated by commas.",
            seeds.join(", ")
        ),
        SuggestionKind::StructuredType { expected } => format!(
            "Produce JSON-LD structured data of type {expected} for the content below.\n\n\
             Content:\n{content}\n\n\
             Title: {}\nDescription: {}\nDocument: {}\n\n\
             Return only valid JSON.",
            context.title.as_deref().unwrap_or("unknown"),
            context.description.as_deref().unwrap_or("unknown"),
            context.document
        ),
        SuggestionKind::Analysis => format!(
            "Review the SEO of the content below and give concrete, actionable improvements covering \
             content quality, keyword usage, heading structure, internal links, depth and readability.\n\n\
             Content:\n{content}\n\nDocument: {}",
            context.document
        ),
        SuggestionKind::Translation {
            source_lang,
            target_lang,
        } => format!(
            "Translate the following {source_lang} content into {target_lang}, keeping the Markdown \
             formatting and structure intact.\n\n\
             Content:\n{content}\n\n\
             Return only the translated content."
        ),
    }
}

/// Strip decoration around a comma-separated keyword answer
pub fn clean_keyword_list(raw: &str) -> Keywords {
    let trimmed = KEYWORD_LEADING_NOISE.replace(raw.trim(), "");
    let trimmed = KEYWORD_TRAILING_NOISE.replace(&trimmed, "");
    // Models sometimes answer with full-width commas
    Keywords::parse_joined(&trimmed.replace('，', ","))
}

/// Read `@type` from a JSON-LD answer, fenced or bare
pub fn parse_structured_type(raw: &str) -> Result<StructuredDataType, EnhancementError> {
    let json = JSON_FENCE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw)
        .trim();

    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| EnhancementError::MalformedResponse(format!("invalid JSON-LD: {e}")))?;

    let type_name = value
        .get("@type")
        .and_then(|t| t.as_str())
        .unwrap_or("Article");
    Ok(StructuredDataType::parse(type_name))
}

/// Turn completion text into the suggestion the context asked for
pub fn interpret(text: &str, kind: &SuggestionKind) -> Result<Suggestion, EnhancementError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(EnhancementError::MalformedResponse(
            "empty completion".to_string(),
        ));
    }

    match kind {
        SuggestionKind::Description { .. } => {
            Ok(Suggestion::Description(text.trim_matches('"').trim().to_string()))
        }
        SuggestionKind::Keywords { .. } => {
            let keywords = clean_keyword_list(text);
            if keywords.is_empty() {
                return Err(EnhancementError::MalformedResponse(
                    "no keywords in completion".to_string(),
                ));
            }
            Ok(Suggestion::Keywords(keywords))
        }
        SuggestionKind::StructuredType { .. } => {
            parse_structured_type(text).map(Suggestion::StructuredType)
        }
        SuggestionKind::Analysis => Ok(Suggestion::Analysis(text.to_string())),
        SuggestionKind::Translation { .. } => Ok(Suggestion::Translation(text.to_string())),
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

/// Completions-endpoint enhancer with bearer authentication
#[derive(Debug)]
pub struct CompletionEnhancer {
    config: EnhancerConfig,
    client: reqwest::Client,
    api_key: String,
}

impl CompletionEnhancer {
    /// Requires an API key; the request timeout comes from the config
    pub fn new(config: EnhancerConfig) -> Result<Self, EnhancementError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| EnhancementError::Unavailable("no API key configured".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EnhancementError::Transport(e.to_string()))?;

        Ok(Self {
            config,
            client,
            api_key,
        })
    }

    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, EnhancementError> {
        let request = CompletionRequest {
            prompt,
            max_tokens,
            temperature,
            top_p: TOP_P,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        };

        let response = self
            .client
            .post(&self.config.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| EnhancementError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnhancementError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| EnhancementError::MalformedResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| EnhancementError::MalformedResponse("no choices".to_string()))
    }
}

#[async_trait]
impl Enhancer for CompletionEnhancer {
    async fn suggest(
        &self,
        text: &str,
        context: &EnhancementContext,
    ) -> Result<Suggestion, EnhancementError> {
        let (input_limit, max_tokens, temperature) = request_budget(&context.kind, &self.config);
        let prompt = build_prompt(text, context, input_limit);

        debug!(
            "Requesting {:?} suggestion for {}",
            context.kind, context.document
        );
        let completion = self.complete(&prompt, max_tokens, temperature).await?;
        interpret(&completion, &context.kind)
    }

    fn name(&self) -> &str {
        "completion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_keyword_list_strips_decoration() {
        let keywords = clean_keyword_list("**十神, 比肩 , 命理学.**\n");
        assert_eq!(keywords.as_slice(), &["十神", "比肩", "命理学"]);

        let keywords = clean_keyword_list("- 天干，地支，干支");
        assert_eq!(keywords.as_slice(), &["天干", "地支", "干支"]);
    }

    #[test]
    fn test_parse_structured_type_fenced_and_bare() {
        let fenced = "Here you go:\n```json\n{\"@context\": \"https://schema.org\", \"@type\": \"DefinedTerm\"}\n```";
        assert_eq!(
            parse_structured_type(fenced).unwrap(),
            StructuredDataType::DefinedTerm
        );
        assert_eq!(
            parse_structured_type("{\"name\": \"x\"}").unwrap(),
            StructuredDataType::Article
        );
        assert!(matches!(
            parse_structured_type("not json"),
            Err(EnhancementError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_interpret_rejects_empty_completion() {
        assert!(interpret("   ", &SuggestionKind::Analysis).is_err());
        assert_eq!(
            interpret("\"A short summary.\"", &SuggestionKind::Description { target_length: 150 })
                .unwrap(),
            Suggestion::Description("A short summary.".to_string())
        );
    }

    #[test]
    fn test_prompt_truncates_content() {
        let context = EnhancementContext::new(
            SuggestionKind::Keywords {
                seeds: vec!["命理".to_string()],
            },
            "十神/比肩.md",
        );
        let prompt = build_prompt(&"字".repeat(5000), &context, 2000);
        assert_eq!(prompt.matches('字').count(), 2000);
        assert!(prompt.contains("Base keywords (include where relevant): 命理"));
        assert!(!prompt.contains("Existing keywords"));
    }

    #[test]
    fn test_configured_temperature_drives_text_requests() {
        let config = EnhancerConfig {
            temperature: 0.2,
            ..EnhancerConfig::default()
        };
        let description = SuggestionKind::Description { target_length: 150 };
        let keywords = SuggestionKind::Keywords { seeds: vec![] };
        assert_eq!(request_budget(&description, &config).2, 0.2);
        assert_eq!(request_budget(&keywords, &config).2, 0.2);
        assert_eq!(request_budget(&SuggestionKind::Analysis, &config).2, 0.5);
    }

    #[test]
    fn test_missing_api_key_is_unavailable() {
        let config = EnhancerConfig {
            api_key: None,
            ..EnhancerConfig::default()
        };
        assert!(matches!(
            CompletionEnhancer::new(config),
            Err(EnhancementError::Unavailable(_))
        ));
    }
}
