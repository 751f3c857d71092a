use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{LlmClient, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_gemini_api_key()?.to_string();
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout_secs = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build Gemini http client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
        })
    }

    // Frame questions so the model stays informative rather than advisory.
    fn contextual_prompt(question: &str) -> String {
        format!(
            "As a personal financial information assistant, provide a concise, \
informative analysis of the following question, based on general public \
knowledge. Avoid direct investment advice and speculative predictions.\n\
Question: {question}"
        )
    }

    async fn generate_once(&self, prompt: &str) -> anyhow::Result<GenerateContentResponse> {
        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", HeaderValue::from_str(&self.api_key)?);

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let req = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Gemini response body")?;

        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<serde_json::Value>(&text).ok();
            return Err(LlmDiagnosticsError {
                provider: Provider::Gemini,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        serde_json::from_str::<GenerateContentResponse>(&text)
            .with_context(|| format!("failed to decode Gemini response: {text}"))
    }

    fn response_text(res: &GenerateContentResponse) -> anyhow::Result<String> {
        let text = res
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmDiagnosticsError {
                provider: Provider::Gemini,
                stage: "empty_response",
                detail: "response contained no candidate text".to_string(),
                raw_output: None,
                raw_response_json: serde_json::to_value(res).ok(),
            }
            .into());
        }

        Ok(text)
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn ask(&self, question: &str) -> anyhow::Result<String> {
        let prompt = Self::contextual_prompt(question);
        let res = self.generate_once(&prompt).await?;
        Self::response_text(&res)
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_candidate_text() {
        let v = json!({
            "candidates": [
                {
                    "content": {
                        "parts": [
                            {"text": "Semiconductor demand "},
                            {"text": "remains cyclical."}
                        ],
                        "role": "model"
                    },
                    "finishReason": "STOP"
                }
            ],
            "usageMetadata": {"promptTokenCount": 12}
        });

        let res: GenerateContentResponse = serde_json::from_value(v).unwrap();
        let text = GeminiClient::response_text(&res).unwrap();
        assert_eq!(text, "Semiconductor demand remains cyclical.");
    }

    #[test]
    fn empty_candidates_is_an_error() {
        let res: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        let err = GeminiClient::response_text(&res).unwrap_err();
        assert!(err.downcast_ref::<LlmDiagnosticsError>().is_some());
    }

    #[test]
    fn contextual_prompt_carries_the_question() {
        let prompt = GeminiClient::contextual_prompt("Outlook for the semiconductor sector?");
        assert!(prompt.ends_with("Question: Outlook for the semiconductor sector?"));
        assert!(prompt.contains("Avoid direct investment advice"));
    }
}
