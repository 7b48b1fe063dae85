//! Anthropic Messages API client and keyword reply parsing

use super::{build_client, send_json, AdapterResult, TextGenerator};
use crate::config::AiConfig;
use crate::error::{AdapterFailure, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A keyword suggestion with model-estimated metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordIdea {
    pub keyword: String,
    #[serde(default, alias = "searchVolume")]
    pub search_volume: f64,
    /// 0-100
    #[serde(default)]
    pub difficulty: f64,
    /// 0-100
    #[serde(default)]
    pub relevance: f64,
}

/// Outermost `[...]` span of a reply, compiled once
fn json_array_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\[[\s\S]*\]").ok())
        .as_ref()
}

/// Extract the first JSON array in a model reply and decode it as keyword ideas
pub fn parse_keyword_ideas(reply: &str) -> AdapterResult<Vec<KeywordIdea>> {
    let Some(re) = json_array_pattern() else {
        return Err(AdapterFailure::Decode("keyword array pattern".to_string()));
    };
    let Some(array) = re.find(reply) else {
        return Ok(Vec::new());
    };
    let ideas: Vec<KeywordIdea> = serde_json::from_str(array.as_str())?;
    Ok(ideas
        .into_iter()
        .filter(|idea| !idea.keyword.trim().is_empty())
        .collect())
}

/// Normalize a single-phrase reply: trimmed, quotes removed
pub fn clean_phrase(reply: &str) -> String {
    reply
        .trim()
        .chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect::<String>()
        .trim()
        .to_string()
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Anthropic Messages API client
pub struct AnthropicClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(config: &AiConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> AdapterResult<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: max_tokens.min(self.max_tokens),
            temperature,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        debug!(model = %self.model, max_tokens = request.max_tokens, "Requesting completion");
        let response: MessagesResponse = send_json(
            self.client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request),
        )
        .await?;

        let text: String = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(AdapterFailure::Decode("empty completion".to_string()));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> AnthropicClient {
        let config = AiConfig {
            endpoint: format!("{}/v1/messages", server.uri()),
            ..AiConfig::default()
        };
        AnthropicClient::new(&config, "sk-test".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_generate_joins_text_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(json!({"max_tokens": 50})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "emergency "}, {"type": "text", "text": "plumber"}]
            })))
            .mount(&server)
            .await;

        let text = client(&server).generate("keyword?", 50, 0.3).await.unwrap();
        assert_eq!(text, "emergency plumber");
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client(&server).generate("hi", 10, 0.5).await.unwrap_err();
        assert_eq!(err, AdapterFailure::RateLimited);
    }

    #[test]
    fn test_parse_keyword_ideas_from_chatty_reply() {
        let reply = r#"Here you go:
[
  {"keyword": "blocked drain plumber", "searchVolume": 880, "difficulty": 35, "relevance": 90},
  {"keyword": "hot water repair", "searchVolume": 1200, "difficulty": 62, "relevance": 70}
]
Let me know if you need more."#;
        let ideas = parse_keyword_ideas(reply).unwrap();
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[0].search_volume, 880.0);
        assert_eq!(ideas[1].difficulty, 62.0);
    }

    #[test]
    fn test_parse_keyword_ideas_without_array() {
        assert!(parse_keyword_ideas("no idea, sorry").unwrap().is_empty());
        assert!(parse_keyword_ideas("[not json]").is_err());
    }

    #[test]
    fn test_array_pattern_is_compiled_once() {
        let first = json_array_pattern().unwrap();
        let second = json_array_pattern().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_clean_phrase() {
        assert_eq!(clean_phrase("  \"emergency plumber\"\n"), "emergency plumber");
        assert_eq!(clean_phrase("'seo'"), "seo");
    }
}
