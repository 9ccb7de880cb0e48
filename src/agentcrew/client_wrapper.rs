use crate::agentcrew::attachment::MediaRef;
use crate::agentcrew::error::BackendError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// A ClientWrapper is a wrapper around a specific completion service.
/// It provides a common interface to interact with the LLMs.
/// It does not keep track of the conversation, for that the orchestrator keeps one
/// ConversationHistory per agent and replays it through the ClientWrapper on every call.
// src/agentcrew/client_wrapper.rs

/// Represents the possible roles for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    // set by the developer to steer the model's responses
    System,
    // a message sent by a human user, or another agent's reply relayed as input
    User,
    // lets the model know the content was generated as a response to a user message
    Assistant,
}

impl Role {
    /// Wire name used by OpenAI-compatible chat APIs.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// How many tokens were spent on prompt vs. completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

/// One message in a conversation.
#[derive(Debug, Clone)]
pub struct Turn {
    /// The role associated with the turn.
    pub role: Role,
    /// The actual content of the turn. `Arc<str>` so relaying and history copies are cheap.
    pub content: Arc<str>,
    /// Media sent alongside the content. Usually empty.
    pub attachments: Vec<MediaRef>,
    /// When the turn was created.
    pub timestamp: DateTime<Utc>,
    /// Tokens spent producing this reply, when the backend reports them.
    pub usage: Option<TokenUsage>,
}

impl Turn {
    pub fn new(role: Role, content: impl AsRef<str>) -> Self {
        Self {
            role,
            content: Arc::from(content.as_ref()),
            attachments: Vec::new(),
            timestamp: Utc::now(),
            usage: None,
        }
    }

    pub fn system(content: impl AsRef<str>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl AsRef<str>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl AsRef<str>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_attachments(mut self, attachments: Vec<MediaRef>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_usage(mut self, usage: Option<TokenUsage>) -> Self {
        self.usage = usage;
        self
    }

    /// Copy this turn's content into a fresh user turn, as when one agent's reply
    /// becomes another agent's input. Attachments are not carried over.
    pub fn relay(&self) -> Turn {
        Turn {
            role: Role::User,
            content: Arc::clone(&self.content),
            attachments: Vec::new(),
            timestamp: Utc::now(),
            usage: None,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Timestamps and usage are bookkeeping, not identity.
impl PartialEq for Turn {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role
            && self.content == other.content
            && self.attachments == other.attachments
    }
}

/// Per-call parameters forwarded to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound for a single backend call, enforced by the agent.
    pub timeout: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Trait defining the interface to a chat completion service.
///
/// This is the only I/O boundary of the orchestration core: turns in, one assistant turn out.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Model identifier injected into each request.
    fn model_name(&self) -> &str;

    /// Send the full transcript and get the assistant's reply.
    ///
    /// Backends that report token usage should attach it with [`Turn::with_usage`].
    async fn send_message(
        &self,
        messages: &[Turn],
        options: &CompletionOptions,
    ) -> Result<Turn, BackendError>;

    /// Hook to retrieve usage from the *last* send_message() call.
    /// Default impl returns None so stub clients don't have to track anything.
    async fn get_last_usage(&self) -> Option<TokenUsage> {
        None
    }
}
