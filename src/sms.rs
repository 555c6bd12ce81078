//! SMS Draft Generation
//!
//! Calls an external text-generation HTTP API to draft a notification
//! message for a household. Completely separate from the recommendation
//! engine: a failure here surfaces as an upstream error on the endpoint
//! and never touches a stored amount.

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};

const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent";

/// Client for the external text-generation API
#[derive(Debug, Clone)]
pub struct SmsClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl SmsClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Build from `SMS_API_KEY` / `SMS_API_URL`; None when no key is set
    ///
    /// A missing key only disables the drafting endpoint, nothing else.
    pub fn from_env() -> Option<Self> {
        let api_key = match std::env::var("SMS_API_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!("SMS_API_KEY not set; SMS drafting endpoint disabled");
                return None;
            }
        };
        let endpoint =
            std::env::var("SMS_API_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        Some(Self::new(endpoint, api_key))
    }

    /// Generate one SMS draft from a prompt
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}?key={}", self.endpoint, self.api_key);
        let payload = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Failed to reach text-generation API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Text-generation API returned {}: {}", status, body);
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse text-generation response")?;

        extract_candidate_text(&body)
    }
}

/// Pull the first candidate's text out of the response body
fn extract_candidate_text(body: &Value) -> Result<String> {
    let text = body
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.pointer("/content/parts/0/text"))
        .and_then(|t| t.as_str());

    match text {
        Some(t) if !t.trim().is_empty() => Ok(t.trim().to_string()),
        _ => bail!("Text-generation response contained no candidates"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_candidate_text() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "  Mahal na pamilya, ligtas po kayo.  " }] }
            }]
        });
        assert_eq!(
            extract_candidate_text(&body).unwrap(),
            "Mahal na pamilya, ligtas po kayo."
        );
    }

    #[test]
    fn test_extract_rejects_empty_response() {
        assert!(extract_candidate_text(&json!({})).is_err());
        assert!(extract_candidate_text(&json!({"candidates": []})).is_err());
        assert!(extract_candidate_text(&json!({
            "candidates": [{"content": {"parts": [{"text": "   "}]}}]
        }))
        .is_err());
    }
}
