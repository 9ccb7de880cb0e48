//! The `OpenAIClient` struct implements `ClientWrapper` for any OpenAI-compatible Chat
//! Completions endpoint, capturing the assistant reply and the token usage of each call.
//!
//! # Key Features
//!
//! - **send_message(...)**: posts the whole transcript with the model, temperature and
//!   max tokens from [`CompletionOptions`].
//! - **Attachments**: turns carrying [`MediaRef`](crate::attachment::MediaRef)s are sent as
//!   multi-part content with base64 `data:` URLs.
//! - **Error classification**: HTTP 408 and client timeouts are `Timeout`, 429 is
//!   `RateLimited`, undecodable bodies are `Malformed`, everything else is `Unknown`.
//! - **Inspect Usage**: every reply carries its own `usage`; `get_last_usage()` returns the
//!   most recent one.
//!
//! # Example
//!
//! ```rust,no_run
//! use agentcrew::clients::openai::{Model, OpenAIClient};
//! use agentcrew::{ClientWrapper, CompletionOptions, Turn};
//!
//! #[tokio::main]
//! async fn main() {
//!     let secret_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
//!     let client = OpenAIClient::new_with_model_enum(&secret_key, Model::GPT41Nano);
//!
//!     let reply = client
//!         .send_message(
//!             &[Turn::system("You are an assistant."), Turn::user("Hello!")],
//!             &CompletionOptions::default(),
//!         )
//!         .await;
//!     match reply {
//!         Ok(turn) => println!("Assistant: {}", turn.content),
//!         Err(e) => eprintln!("{}", e),
//!     }
//!     if let Some(usage) = client.get_last_usage().await {
//!         println!("Tokens: input {}, output {}", usage.input_tokens, usage.output_tokens);
//!     }
//! }
//! ```

use crate::agentcrew::client_wrapper::{ClientWrapper, CompletionOptions, Turn, TokenUsage};
use crate::agentcrew::clients::http_pool::get_http_client;
use crate::agentcrew::error::BackendError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Model identifiers commonly used with the crew.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    /// `gpt-4o` – Omni model with text + image inputs.
    GPT4o,
    /// `gpt-4o-mini` – cost effective GPT-4o derivative.
    GPT4oMini,
    /// `gpt-3.5-turbo` – legacy chat model.
    GPT35Turbo,
    /// `gpt-4.1` – general availability GPT-4.1.
    GPT41,
    /// `gpt-4.1-mini` – reduced cost GPT-4.1 tier.
    GPT41Mini,
    /// `gpt-4.1-nano` – ultra low cost GPT-4.1 derivative.
    GPT41Nano,
}

/// Convert a [`Model`] variant into the string identifier expected by the REST API.
pub fn model_to_string(model: Model) -> String {
    match model {
        Model::GPT4o => "gpt-4o".to_string(),
        Model::GPT4oMini => "gpt-4o-mini".to_string(),
        Model::GPT35Turbo => "gpt-3.5-turbo".to_string(),
        Model::GPT41 => "gpt-4.1".to_string(),
        Model::GPT41Mini => "gpt-4.1-mini".to_string(),
        Model::GPT41Nano => "gpt-4.1-nano".to_string(),
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, PartialEq)]
struct WireMessage {
    role: &'static str,
    content: WireContent,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize, PartialEq)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
    #[serde(default)]
    total_tokens: usize,
}

/// Client wrapper for OpenAI-compatible Chat Completions APIs.
pub struct OpenAIClient {
    http: reqwest::Client,
    secret_key: String,
    /// Full `.../chat/completions` URL.
    endpoint: String,
    /// Model name that will be injected into each request.
    model: String,
    /// Storage for the token usage returned by the most recent request.
    token_usage: Mutex<Option<TokenUsage>>,
}

impl OpenAIClient {
    /// Construct a new client using the provided API key and [`Model`] variant.
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_string(secret_key, &model_to_string(model))
    }

    /// Construct a new client using the provided API key and explicit model name.
    pub fn new_with_model_string(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, DEFAULT_BASE_URL)
    }

    /// Construct a client targeting a custom OpenAI compatible base URL, such as a local
    /// inference server (`http://localhost:8000/v1`).
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        OpenAIClient {
            http: get_http_client(base),
            secret_key: secret_key.to_string(),
            endpoint: format!("{}/chat/completions", base),
            model: model_name.to_string(),
            token_usage: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Map a non-success HTTP status to a backend error.
fn classify_status(status: StatusCode, body: &str) -> BackendError {
    let message = format!("HTTP {}: {}", status.as_u16(), truncate(body, 300));
    match status {
        StatusCode::REQUEST_TIMEOUT => BackendError::timeout(message),
        StatusCode::TOO_MANY_REQUESTS => BackendError::rate_limited(message),
        _ => BackendError::unknown(message),
    }
}

fn classify_transport(err: &reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::timeout(err.to_string())
    } else {
        BackendError::unknown(err.to_string())
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

async fn encode_turn(turn: &Turn) -> WireMessage {
    let role = turn.role.as_str();
    if turn.attachments.is_empty() {
        return WireMessage {
            role,
            content: WireContent::Text(turn.content.to_string()),
        };
    }

    let mut parts = vec![ContentPart::Text {
        text: turn.content.to_string(),
    }];
    for media in &turn.attachments {
        match media.read_bytes().await {
            Ok(bytes) => parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:{};base64,{}", media.mime_type(), BASE64.encode(bytes)),
                },
            }),
            Err(e) => log::warn!(
                "agentcrew::openai: skipping attachment '{}': {}",
                media.filename(),
                e
            ),
        }
    }
    WireMessage {
        role,
        content: WireContent::Parts(parts),
    }
}

fn decode_reply(body: &str) -> Result<(String, Option<TokenUsage>), BackendError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::malformed(format!("undecodable completion: {}", e)))?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| BackendError::malformed("completion has no message content"))?;
    let usage = parsed.usage.map(|u| TokenUsage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });
    Ok((content, usage))
}

#[async_trait]
impl ClientWrapper for OpenAIClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_message(
        &self,
        messages: &[Turn],
        options: &CompletionOptions,
    ) -> Result<Turn, BackendError> {
        let mut wire = Vec::with_capacity(messages.len());
        for turn in messages {
            wire.push(encode_turn(turn).await);
        }
        let request = ChatRequest {
            model: &self.model,
            messages: wire,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.secret_key)
            .timeout(options.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| classify_transport(&e))?;
        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        let (content, usage) = decode_reply(&body)?;
        *self.token_usage.lock().await = usage;
        Ok(Turn::assistant(content).with_usage(usage))
    }

    async fn get_last_usage(&self) -> Option<TokenUsage> {
        *self.token_usage.lock().await
    }
}
