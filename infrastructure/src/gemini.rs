use crate::config::Config;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use domain::error::ChatError;
use domain::prompt::{GenerationSettings, InferenceProvider, Prompt, PromptPart};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::types::Result;
use std::sync::Arc;

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_k: u32,
    top_p: f64,
    max_output_tokens: u32,
}

impl From<GenerationSettings> for GenerationConfig {
    fn from(settings: GenerationSettings) -> Self {
        Self {
            temperature: settings.temperature,
            top_k: settings.top_k,
            top_p: settings.top_p,
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// HTTP client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Arc<Client>,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Arc::new(Client::new()),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    // The key travels as a query parameter, so this URL must never be logged.
    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

fn build_request(prompt: &Prompt) -> GenerateContentRequest {
    let parts = prompt
        .parts
        .iter()
        .map(|part| match part {
            PromptPart::Text(text) => Part::Text { text: text.clone() },
            PromptPart::Image { mime_type, bytes } => Part::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.clone(),
                    data: BASE64_STANDARD.encode(bytes),
                },
            },
        })
        .collect();
    GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts,
        }],
        generation_config: prompt.settings.into(),
    }
}

// Concatenates the text parts of the first candidate; later candidates are
// alternative generations, not continuation.
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let parts = response.candidates.into_iter().next()?.content?.parts;
    let text: String = parts.into_iter().filter_map(|part| part.text).collect();
    (!text.is_empty()).then_some(text)
}

impl InferenceProvider for GeminiClient {
    fn infer(&self, prompt: &Prompt) -> impl std::future::Future<Output = Result<String>> + Send {
        async move {
            let request = build_request(prompt);
            tracing::debug!(
                model = %self.model,
                parts = request.contents[0].parts.len(),
                "sending generateContent request"
            );
            let response = self
                .client
                .post(self.endpoint())
                .json(&request)
                .send()
                .await
                .map_err(|err| ChatError::InferenceFailed {
                    status: None,
                    reason: err.to_string(),
                })?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ChatError::InferenceFailed {
                    status: Some(status.as_u16()),
                    reason: format!("HTTP {status}: {body}"),
                }
                .into());
            }
            let parsed: GenerateContentResponse =
                response
                    .json()
                    .await
                    .map_err(|err| ChatError::InferenceFailed {
                        status: None,
                        reason: format!("malformed response body: {err}"),
                    })?;
            extract_text(parsed).ok_or_else(|| {
                ChatError::InferenceFailed {
                    status: None,
                    reason: "response contained no candidate text".to_string(),
                }
                .into()
            })
        }
    }
}
