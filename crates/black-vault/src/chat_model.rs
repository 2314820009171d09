//! ChatModel — wraps the remote chat/completion service used by the Enricher,
//! IntentParser, and Consolidator (§6). Callers that request `json_mode` still
//! get a raw string back; JSON validity is the caller's problem, consistent
//! with the spec's "parse failure is non-fatal" policy (§7).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, prompt: &str, json_mode: bool) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Calls an Ollama-compatible `/api/generate` endpoint.
pub struct HttpChatModel {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl HttpChatModel {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("failed to build reqwest client");

        Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ChatModel for HttpChatModel {
    async fn generate(&self, prompt: &str, json_mode: bool) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: if json_mode { Some("json") } else { None },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::LLMParseError(format!("request to {} failed: {}", self.endpoint, e)))?;

        if !response.status().is_success() {
            return Err(Error::LLMParseError(format!(
                "chat service returned {}",
                response.status()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::LLMParseError(format!("invalid chat response: {}", e)))?;

        Ok(parsed.response)
    }
}

/// Extract the first top-level `{...}` object from a chat model reply.
/// LLMs routinely wrap JSON in prose or markdown code fences even when asked
/// for `format: json`; callers should run replies through this before
/// `serde_json::from_str`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0i32;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_from_prose_wrapper() {
        let text = "Sure, here you go:\n```json\n{\"a\": 1}\n```\nHope that helps.";
        assert_eq!(extract_json_object(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn extracts_nested_object() {
        let text = "{\"a\": {\"b\": 2}}";
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn none_when_no_braces() {
        assert_eq!(extract_json_object("no json here"), None);
    }
}
