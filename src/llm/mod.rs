use std::env;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Client;
use serde::Deserialize;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Client for the external generative-language API. Construction never
/// fails; an unconfigured client reports `is_configured() == false` and
/// callers surface that as a service-unavailable condition.
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    config: LlmConfig,
}

#[derive(Clone)]
struct LlmConfig {
    api_key: Option<String>,
    model: String,
}

impl LlmClient {
    /// Build a client using environment variables.
    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY").ok();
        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Self {
            http: Client::new(),
            config: LlmConfig { api_key, model },
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Execute a single-prompt generation request and return the model's
    /// text output.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let Some(api_key) = self.config.api_key.as_ref() else {
            bail!("GEMINI_API_KEY is not configured but required for generation requests");
        };

        let payload = serde_json::json!({
            "contents": [
                {
                    "parts": [
                        { "text": prompt }
                    ]
                }
            ],
        });

        let url = format!("{API_BASE}/{}:generateContent", self.config.model);
        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("failed to read response body")?;
        let body: serde_json::Value = serde_json::from_str(&response_text).with_context(|| {
            let preview = if response_text.len() > 500 {
                format!("{}...", &response_text[..500])
            } else {
                response_text.clone()
            };
            format!("failed to parse generation response as JSON. Response body: {preview}")
        })?;

        if !status.is_success() {
            bail!("generation call failed with status {}: {}", status, body);
        }

        extract_text(&body)
            .ok_or_else(|| anyhow!("unexpected generation response payload: {}", body))
    }
}

/// Pull the concatenated candidate text out of a generateContent payload.
fn extract_text(value: &serde_json::Value) -> Option<String> {
    let payload: GenerateContentPayload = serde_json::from_value(value.clone()).ok()?;

    let text = payload
        .candidates
        .into_iter()
        .flat_map(|candidate| candidate.content.parts)
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() { None } else { Some(text) }
}

#[derive(Debug, Deserialize)]
struct GenerateContentPayload {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_candidate_text() {
        let body = serde_json::json!({
            "candidates": [
                {
                    "content": {
                        "parts": [
                            { "text": "Part one. " },
                            { "text": "Part two." }
                        ]
                    }
                }
            ]
        });

        assert_eq!(extract_text(&body).as_deref(), Some("Part one. Part two."));
    }

    #[test]
    fn missing_candidates_yield_none() {
        assert_eq!(extract_text(&serde_json::json!({})), None);
        assert_eq!(extract_text(&serde_json::json!({"candidates": []})), None);
    }

    #[test]
    fn blank_text_yields_none() {
        let body = serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": "  \n" } ] } }
            ]
        });
        assert_eq!(extract_text(&body), None);
    }
}
