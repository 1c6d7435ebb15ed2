//! Thin Gemini transport. One request in, raw text (or a classified
//! failure) out; no retries, no parsing. Timeouts are enforced by the
//! invoker layer in [`crate::invoker`].

use std::future::Future;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{EsgExtractError, Result};
use crate::invoker::TextModel;
use crate::prompt::Instruction;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl TextModel for GeminiClient {
    fn generate(
        &self,
        instruction: &Instruction,
    ) -> impl Future<Output = Result<String>> + Send {
        self.generate_content(instruction)
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default = "user_role")]
    role: String,
    parts: Vec<Part>,
}

fn user_role() -> String {
    "user".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "topP")]
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_model(api_key, DEFAULT_MODEL)
    }

    pub fn with_model(api_key: String, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    /// Sends one instruction and returns the model's raw text. Connectivity,
    /// authentication, quota and length failures all surface as
    /// `TransportError`; a well-formed response with no text is
    /// `EmptyResponse`.
    pub async fn generate_content(&self, instruction: &Instruction) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let payload = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: instruction.user.clone(),
                }],
            }],
            system_instruction: Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: instruction.system.clone(),
                }],
            },
            // Settings tuned for extraction: low temperature, JSON output.
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                temperature: 0.2,
                top_k: 32,
                top_p: 0.9,
            },
        };

        let res = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EsgExtractError::TransportError(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let err_text = res
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            return Err(EsgExtractError::TransportError(format!(
                "Gemini API error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse = res
            .json()
            .await
            .map_err(|e| EsgExtractError::TransportError(e.to_string()))?;

        let text = body
            .candidates
            .and_then(|mut c| {
                if c.is_empty() {
                    None
                } else {
                    c.swap_remove(0).content
                }
            })
            .and_then(|content| content.parts.into_iter().next())
            .map(|part| part.text)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(EsgExtractError::EmptyResponse);
        }
        Ok(text)
    }
}
