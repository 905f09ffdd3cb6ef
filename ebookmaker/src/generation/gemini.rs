//! Gemini `generateContent` REST client

use super::prompts::{system_instruction, user_prompt};
use super::{GenerationClient, GenerationError, GenerationKind, GenerationRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API base URL (without the `/models/...` suffix)
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl Content {
    fn text(text: String, role: Option<&str>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part { text: Some(text) }],
        }
    }
}

/// HTTP client for the Gemini API
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
    api_key: String,
}

impl GeminiClient {
    /// Create a client
    ///
    /// An empty key is accepted here; every call then fails with
    /// [`GenerationError::MissingCredential`].
    pub fn new(config: GeminiConfig, api_key: impl Into<String>) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Other(e.to_string()))?;
        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    fn body(request: &GenerationRequest) -> GenerateContentRequest {
        let generation_config = (request.kind == GenerationKind::ChapterTitles).then(|| GenerationConfig {
            response_mime_type: "application/json",
            response_schema: serde_json::json!({
                "type": "ARRAY",
                "items": { "type": "STRING" }
            }),
        });
        GenerateContentRequest {
            system_instruction: Content::text(system_instruction(request.style), None),
            contents: vec![Content::text(user_prompt(request), Some("user"))],
            generation_config,
        }
    }

    /// Send one request and return the concatenated candidate text
    async fn send(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        if self.api_key.trim().is_empty() {
            return Err(GenerationError::MissingCredential);
        }

        log::debug!("Requesting {:?} from {}", request.kind, self.config.model);

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::body(request))
            .send()
            .await
            .map_err(|e| {
                // The URL carries the key; keep it out of messages
                let e = e.without_url();
                if e.is_timeout() {
                    GenerationError::Other(format!("Request timed out: {}", e))
                } else {
                    GenerationError::classify(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::classify(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Other(format!("Invalid response: {}", e)))?;
        Ok(extract_text(body))
    }
}

fn extract_text(body: GenerateContentResponse) -> String {
    body.candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Parse a JSON array of strings; malformed output yields an empty list
pub fn parse_title_list(text: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(text.trim()) {
        Ok(titles) => titles,
        Err(e) => {
            log::warn!("Chapter title list was not a JSON string array: {}", e);
            Vec::new()
        }
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.send(request).await
    }

    async fn generate_list(&self, request: &GenerationRequest) -> Result<Vec<String>, GenerationError> {
        let text = self.send(request).await?;
        Ok(parse_title_list(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::EbookStyle;

    #[test]
    fn test_request_body_shape() {
        let request = GenerationRequest::new(GenerationKind::ChapterTitles, "Foto", EbookStyle::Santai)
            .with_count(2);
        let json = serde_json::to_value(GeminiClient::body(&request)).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert!(json["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("'kamu'"));
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "ARRAY");

        let request = GenerationRequest::new(GenerationKind::Title, "Foto", EbookStyle::Santai);
        let json = serde_json::to_value(GeminiClient::body(&request)).unwrap();
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Halo "},{"text":"dunia"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(body), "Halo dunia");

        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_text(empty), "");
    }

    #[test]
    fn test_title_list_parsing() {
        assert_eq!(parse_title_list("[\"A\", \"B\"]"), vec!["A", "B"]);
        assert!(parse_title_list("Bab 1: A\nBab 2: B").is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = GeminiClient::new(GeminiConfig::default(), "").unwrap();
        let request = GenerationRequest::new(GenerationKind::Title, "Foto", EbookStyle::Santai);
        assert_eq!(
            client.generate_text(&request).await,
            Err(GenerationError::MissingCredential)
        );
    }
}
