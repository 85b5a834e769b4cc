use crate::http::build_client;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SYSTEM_PROMPT: &str = r#"
You write marketplace listing copy. Given product facts, respond with a JSON
object {"title": string, "description": string}. The title must stay under 80
characters and keep the product's brand and model when known. Output JSON only.
"#;

#[derive(Debug, Clone)]
pub struct ContentConfig {
    pub gateway_url: Option<String>,
    pub api_key: Option<String>,
    pub function_name: Option<String>,
    pub model: Option<String>,
}

impl ContentConfig {
    pub fn from_env() -> Self {
        Self {
            gateway_url: std::env::var("CONTENT_GATEWAY_URL").ok(),
            api_key: std::env::var("CONTENT_API_KEY").ok(),
            function_name: std::env::var("CONTENT_FUNCTION").ok(),
            model: std::env::var("CONTENT_MODEL").ok(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content gateway not configured")]
    Disabled,
    #[error("http error: {0}")]
    Http(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Facts handed to the generator; everything it may draw on and nothing else.
#[derive(Debug, Clone, Serialize)]
pub struct ProductFacts<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub features: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'a str>,
    pub category_name: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedContent {
    pub title: String,
    pub description: String,
}

pub struct ContentClient {
    http: Client,
    config: ContentConfig,
}

impl ContentClient {
    pub fn new(config: ContentConfig) -> Self {
        Self {
            http: build_client(),
            config,
        }
    }

    /// Rewrite title/description from product facts. Any failure here is the
    /// caller's cue to keep the catalog text.
    pub async fn rewrite(
        &self,
        facts: &ProductFacts<'_>,
    ) -> Result<GeneratedContent, ContentError> {
        let Some(gateway) = self
            .config
            .gateway_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        else {
            return Err(ContentError::Disabled);
        };

        let body = InferenceRequest {
            function_name: self
                .config
                .function_name
                .clone()
                .unwrap_or_else(|| "listing_copy".to_string()),
            model_name: self.config.model.clone(),
            input: InferenceInput {
                messages: vec![
                    InferenceMessage {
                        role: "system".into(),
                        content: SYSTEM_PROMPT.trim().to_string(),
                    },
                    InferenceMessage {
                        role: "user".into(),
                        content: serde_json::to_string(facts)
                            .map_err(|err| ContentError::InvalidResponse(err.to_string()))?,
                    },
                ],
            },
        };

        let mut request = self.http.post(format!("{gateway}/inference")).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.header("X-API-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| ContentError::Http(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ContentError::Http(format!("HTTP {}", response.status())));
        }

        let payload: InferenceResponse = response
            .json()
            .await
            .map_err(|err| ContentError::InvalidResponse(err.to_string()))?;

        let text = payload
            .content
            .into_iter()
            .find(|item| item.r#type == "text")
            .map(|item| item.text)
            .ok_or_else(|| ContentError::InvalidResponse("missing text".into()))?;

        let cleaned = strip_markdown_fence(&text);
        let generated: GeneratedContent = serde_json::from_str(&cleaned)
            .map_err(|err| ContentError::InvalidResponse(err.to_string()))?;

        if generated.title.trim().is_empty() || generated.description.trim().is_empty() {
            return Err(ContentError::InvalidResponse("empty title or description".into()));
        }
        Ok(generated)
    }
}

fn strip_markdown_fence(input: &str) -> String {
    let trimmed = input.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut body = Vec::new();
    for line in trimmed.lines().skip(1) {
        if line.trim_start().starts_with("```") {
            break;
        }
        body.push(line);
    }
    body.join("\n")
}

#[derive(Debug, Serialize)]
struct InferenceRequest {
    function_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_name: Option<String>,
    input: InferenceInput,
}

#[derive(Debug, Serialize)]
struct InferenceInput {
    messages: Vec<InferenceMessage>,
}

#[derive(Debug, Serialize)]
struct InferenceMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    content: Vec<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    r#type: String,
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_stripping_handles_plain_and_fenced_json() {
        let plain = r#"{"title":"A","description":"B"}"#;
        assert_eq!(strip_markdown_fence(plain), plain);
        let fenced = "```json\n{\"title\":\"A\",\"description\":\"B\"}\n```";
        assert_eq!(strip_markdown_fence(fenced), plain);
    }

    #[tokio::test]
    async fn unconfigured_client_reports_disabled() {
        let client = ContentClient::new(ContentConfig {
            gateway_url: None,
            api_key: None,
            function_name: None,
            model: None,
        });
        let facts = ProductFacts {
            title: "Widget",
            description: "A widget",
            features: &[],
            brand: None,
            model: None,
            color: None,
            category_name: "Collectibles",
        };
        let err = client.rewrite(&facts).await.expect_err("disabled");
        assert!(matches!(err, ContentError::Disabled));
    }
}
