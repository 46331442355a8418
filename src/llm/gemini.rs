use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ChatModel, ChatPrompt, LlmError, MAX_OUTPUT_TOKENS, TEMPERATURE};

const DISABLED_SAFETY_CATEGORIES: [&str; 2] = [
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
];

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Build a client from configuration.
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        let http = Client::builder()
            .user_agent("arogyam/chat")
            .build()
            .map_err(|error| LlmError::ProviderUnavailable(error.to_string()))?;
        Ok(Self {
            http,
            base_url: config.gemini_url.clone(),
            model: config.gemini_model.clone(),
            api_key: config.gemini_api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn request_body(prompt: &ChatPrompt) -> Value {
        let safety_settings: Vec<Value> = DISABLED_SAFETY_CATEGORIES
            .iter()
            .map(|category| json!({ "category": category, "threshold": "BLOCK_NONE" }))
            .collect();

        json!({
            "systemInstruction": { "parts": [{ "text": prompt.system }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt.user }] }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            },
            "safetySettings": safety_settings,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_answer(self) -> Result<String, LlmError> {
        if let Some(reason) = self
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
        {
            return Err(LlmError::GenerationFailed(format!(
                "prompt blocked by provider: {reason}"
            )));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response contained no candidates".into()))?;
        let finish_reason = candidate.finish_reason;
        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        let answer = text.trim();
        if answer.is_empty() {
            return Err(LlmError::InvalidResponse(format!(
                "candidate carried no text (finish reason: {})",
                finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(answer.to_string())
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn generate(&self, prompt: ChatPrompt) -> Result<String, LlmError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(&prompt))
            .send()
            .await
            .map_err(|error| {
                LlmError::ProviderUnavailable(format!(
                    "failed to reach Gemini at {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::GenerationFailed(format!(
                "Gemini returned {status}: {body}"
            )));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|error| {
            LlmError::InvalidResponse(format!("failed to decode Gemini response: {error}"))
        })?;
        let answer = body.into_answer()?;
        tracing::debug!(model = %self.model, chars = answer.len(), "Gemini answer received");
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use httpmock::{Method::POST, MockServer};

    const ENDPOINT: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

    fn prompt() -> ChatPrompt {
        ChatPrompt {
            system: "Be brief. CONTEXT: Drink water. LANGUAGE: en".into(),
            user: "How much water?".into(),
        }
    }

    #[tokio::test]
    async fn sends_fixed_generation_settings() {
        let server = MockServer::start_async().await;
        let client = GeminiClient::new(&test_config(&server.base_url())).unwrap();

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(ENDPOINT)
                    .header("x-goog-api-key", "gm-test")
                    .json_body_partial(
                        r#"{
                            "generationConfig": { "maxOutputTokens": 1000 },
                            "safetySettings": [
                                { "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_NONE" },
                                { "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_NONE" }
                            ],
                            "contents": [{ "role": "user", "parts": [{ "text": "How much water?" }] }]
                        }"#,
                    );
                then.status(200).json_body(json!({
                    "candidates": [{
                        "content": { "role": "model", "parts": [{ "text": "About two litres " }, { "text": "a day." }] },
                        "finishReason": "STOP"
                    }]
                }));
            })
            .await;

        let answer = client.generate(prompt()).await.expect("answer");

        mock.assert_async().await;
        assert_eq!(answer, "About two litres a day.");
    }

    #[test]
    fn request_body_carries_system_instruction_and_temperature() {
        let body = GeminiClient::request_body(&prompt());
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "Be brief. CONTEXT: Drink water. LANGUAGE: en"
        );
        let temperature = body["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.2).abs() < 1e-6);
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start_async().await;
        let client = GeminiClient::new(&test_config(&server.base_url())).unwrap();

        server
            .mock_async(|when, then| {
                when.method(POST).path(ENDPOINT);
                then.status(429).body("quota exceeded");
            })
            .await;

        let error = client.generate(prompt()).await.expect_err("error status");
        assert!(
            matches!(error, LlmError::GenerationFailed(message) if message.contains("429") && message.contains("quota"))
        );
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        assert!(matches!(
            response.into_answer(),
            Err(LlmError::GenerationFailed(message)) if message.contains("SAFETY")
        ));
    }

    #[test]
    fn empty_candidate_is_invalid() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "MAX_TOKENS" }]
        }))
        .unwrap();
        assert!(matches!(
            response.into_answer(),
            Err(LlmError::InvalidResponse(message)) if message.contains("MAX_TOKENS")
        ));
    }
}
