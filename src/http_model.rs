//! [`LanguageModel`] over an OpenAI-compatible chat completions endpoint.
//!
//! Each session pins a system preamble; prompts are sent as independent
//! two-message conversations. Local servers such as Ollama or llama.cpp
//! expose this format, as do most hosted providers.

use crate::error::ModelError;
use crate::session::{LanguageModel, PromptSession, SessionConfig};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpModelConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for HttpModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:11434/v1/chat/completions".to_string(),
            model: "llama3.2".to_string(),
            api_key: None,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Clone)]
pub struct HttpModel {
    client: reqwest::Client,
    config: HttpModelConfig,
}

impl HttpModel {
    pub fn new(config: HttpModelConfig) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }
}

impl LanguageModel for HttpModel {
    type Session = HttpSession;

    async fn create_session(&self, config: &SessionConfig) -> Result<HttpSession, ModelError> {
        debug!(endpoint = %self.config.endpoint, model = %self.config.model, "opening http session");
        Ok(HttpSession {
            client: self.client.clone(),
            config: self.config.clone(),
            system_prompt: config.system_prompt.clone(),
            destroyed: AtomicBool::new(false),
        })
    }
}

pub struct HttpSession {
    client: reqwest::Client,
    config: HttpModelConfig,
    system_prompt: String,
    destroyed: AtomicBool,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl PromptSession for HttpSession {
    async fn prompt(&self, input: &str) -> Result<String, ModelError> {
        if self.destroyed.load(Ordering::Acquire) {
            return Err(ModelError::InvalidSession("session destroyed".into()));
        }
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: input,
                },
            ],
            stream: false,
        };
        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(classify_failure(status, text));
        }
        extract_content(&text)
    }

    async fn destroy(&self) -> Result<(), ModelError> {
        self.destroyed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Maps a non-success status onto the failure taxonomy the fallback policy
/// understands.
fn classify_failure(status: u16, body: String) -> ModelError {
    let lowered = body.to_lowercase();
    match status {
        415 | 422 => ModelError::UnsupportedInput(body),
        400 if lowered.contains("unsupported") || lowered.contains("language") => {
            ModelError::UnsupportedInput(body)
        }
        410 => ModelError::InvalidSession(body),
        _ => ModelError::Api { status, body },
    }
}

fn extract_content(body: &str) -> Result<String, ModelError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|err| ModelError::Parse(err.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| ModelError::Parse("response contained no choices".into()))
}
