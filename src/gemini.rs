//! Gemini API client for the concierge
//!
//! Implements the responder traits over `generateContent`. Each conversation
//! keeps its own turn history and resends it with the persona on every turn.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::concierge::{Conversation, Persona, Responder};
use crate::config::{AppConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::error::EstateError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> crate::Result<Self> {
        Self::with_endpoint(api_key, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL)
    }

    pub fn from_config(config: &AppConfig) -> crate::Result<Self> {
        Self::with_endpoint(
            config.gemini_api_key.clone(),
            &config.gemini_base_url,
            &config.gemini_model,
        )
    }

    pub fn with_endpoint(api_key: String, base_url: &str, model: &str) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!(
                "{}/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                model
            ),
        })
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Generate the next model turn for `contents`
    async fn generate(
        &self,
        contents: &[Content],
        persona: &Persona,
    ) -> crate::Result<Option<String>> {
        let request = GeminiRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: persona.temperature,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: persona.instruction.clone(),
                }],
            },
        };

        info!("Calling Gemini API ({} turns)", contents.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                EstateError::Upstream(format!("Gemini API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error response ({}): {}", status, error_text);
            return Err(EstateError::Upstream(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            EstateError::Upstream(format!("Gemini parse error: {}", e))
        })?;

        Ok(gemini_response.text())
    }
}

/// Completed exchanges a conversation resends upstream by default
pub const DEFAULT_HISTORY_TURNS: usize = 20;

/// Responder backed by the Gemini API
pub struct GeminiResponder {
    client: Arc<GeminiClient>,
    history_turns: usize,
}

impl GeminiResponder {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client: Arc::new(client),
            history_turns: DEFAULT_HISTORY_TURNS,
        }
    }

    /// Keep only the latest `turns` user/model exchanges in each conversation
    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns;
        self
    }
}

#[async_trait]
impl Responder for GeminiResponder {
    async fn create_conversation(
        &self,
        persona: &Persona,
    ) -> crate::Result<Box<dyn Conversation>> {
        if !self.client.has_api_key() {
            return Err(EstateError::Config("GEMINI_API_KEY not configured".to_string()));
        }

        Ok(Box::new(GeminiConversation {
            client: Arc::clone(&self.client),
            persona: persona.clone(),
            history: Vec::new(),
            history_turns: self.history_turns,
        }))
    }
}

/// One chat with its accumulated user/model history
pub struct GeminiConversation {
    client: Arc<GeminiClient>,
    persona: Persona,
    history: Vec<Content>,
    history_turns: usize,
}

impl GeminiConversation {
    /// Completed exchanges currently remembered
    pub fn turn_count(&self) -> usize {
        self.history.len() / 2
    }

    /// Drop the oldest exchanges beyond the limit. History holds whole
    /// user/model pairs, so it still opens with a user turn.
    fn trim_history(&mut self) {
        let keep = self.history_turns * 2;
        if self.history.len() > keep {
            let excess = self.history.len() - keep;
            self.history.drain(..excess);
        }
    }
}

#[async_trait]
impl Conversation for GeminiConversation {
    async fn turn(&mut self, text: &str) -> crate::Result<Option<String>> {
        let mut contents = self.history.clone();
        contents.push(Content::new(ROLE_USER, text));

        let reply = self.client.generate(&contents, &self.persona).await?;

        // History only advances on a complete exchange, so a failed or empty
        // turn can be retried without leaving a dangling user message.
        if let Some(answer) = &reply {
            contents.push(Content::new(ROLE_MODEL, answer));
            self.history = contents;
            self.trim_history();
            debug!("Gemini conversation now holds {} turns", self.turn_count());
        }

        Ok(reply)
    }
}

const ROLE_USER: &str = "user";
const ROLE_MODEL: &str = "model";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: &'a [Content],
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn new(role: &str, text: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate, if there is any
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
