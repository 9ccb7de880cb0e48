//! Agents.
//!
//! An [`Agent`] is an immutable identity: a name, role instructions, an optional set of
//! [`Capability`]s and an optional [`PromptTemplate`] that frames every input it receives.
//! It holds no client and no transcript. Both are supplied per call: the shared
//! [`ModelContext`] says *how* to reach the model, and the caller's
//! [`ConversationHistory`] says *what* has been said so far.
//!
//! ```rust,no_run
//! use agentcrew::{Agent, ModelContext, Turn};
//! use agentcrew::clients::openai::OpenAIClient;
//! use std::sync::Arc;
//!
//! # async {
//! let context = ModelContext::new(Arc::new(OpenAIClient::new_with_model_string("key", "gpt-4o")));
//! let agent = Agent::new("Closure Agent", "You help people find emotional closure.")
//!     .with_input_template("Help create emotional closure based on:\nUser's feelings: {input}");
//!
//! let mut history = agent.fresh_history();
//! let reply = agent
//!     .respond_and_record(&context, &mut history, Turn::user("I keep replaying our last call"))
//!     .await?;
//! println!("{}", reply.content);
//! # Ok::<(), agentcrew::UpstreamError>(())
//! # };
//! ```

use crate::agentcrew::client_wrapper::{ClientWrapper, CompletionOptions, Role, Turn};
use crate::agentcrew::conversation::ConversationHistory;
use crate::agentcrew::error::{BackendError, UpstreamError};
use crate::agentcrew::event::{AgentEvent, EventHandler};
use crate::agentcrew::prompt::PromptTemplate;
use crate::agentcrew::tools::{
    capability_manual, find_capability, parse_tool_call, Capability, ToolError,
};
use std::fmt;
use std::sync::Arc;

/// Follow-up calls an agent may make in one turn to act on `tool_call` directives.
pub const MAX_TOOL_ROUNDS: usize = 3;

/// Everything an agent needs to reach the model, shared by the whole crew.
#[derive(Clone)]
pub struct ModelContext {
    pub client: Arc<dyn ClientWrapper>,
    pub options: CompletionOptions,
    pub event_handler: Option<Arc<dyn EventHandler>>,
}

impl ModelContext {
    pub fn new(client: Arc<dyn ClientWrapper>) -> Self {
        Self {
            client,
            options: CompletionOptions::default(),
            event_handler: None,
        }
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    async fn emit(&self, event: AgentEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_agent_event(&event).await;
        }
    }
}

impl fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelContext")
            .field("model", &self.client.model_name())
            .field("options", &self.options)
            .field("event_handler", &self.event_handler.is_some())
            .finish()
    }
}

/// A named identity with role instructions.
#[derive(Debug, Clone)]
pub struct Agent {
    name: String,
    instructions: Arc<str>,
    capabilities: Vec<Capability>,
    input_template: Option<PromptTemplate>,
}

impl Agent {
    pub fn new(name: impl Into<String>, instructions: impl AsRef<str>) -> Self {
        Self {
            name: name.into(),
            instructions: Arc::from(instructions.as_ref()),
            capabilities: Vec::new(),
            input_template: None,
        }
    }

    /// Build the instructions from separate lines, joined with `\n`.
    pub fn from_lines<I, S>(name: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = lines
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self::new(name, joined)
    }

    pub fn with_capability(mut self, capability: impl Into<Capability>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    pub fn with_input_template(mut self, template: impl Into<PromptTemplate>) -> Self {
        self.input_template = Some(template.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn input_template(&self) -> Option<&PromptTemplate> {
        self.input_template.as_ref()
    }

    /// The system turn that opens this agent's transcripts: its instructions, followed by
    /// the capability manual when it has capabilities.
    pub fn system_turn(&self) -> Turn {
        if self.capabilities.is_empty() {
            Turn::system(&*self.instructions)
        } else {
            Turn::system(format!(
                "{}\n\n{}",
                self.instructions,
                capability_manual(&self.capabilities)
            ))
        }
    }

    /// A new transcript holding only [`system_turn`](Agent::system_turn).
    pub fn fresh_history(&self) -> ConversationHistory {
        let mut history = ConversationHistory::new();
        history.push(self.system_turn());
        history
    }

    /// Apply the input template, if any. Attachments ride along untouched.
    pub fn prepare_input(&self, input: Turn) -> Turn {
        match &self.input_template {
            Some(template) => Turn {
                content: Arc::from(template.render(&input.content)),
                ..input
            },
            None => input,
        }
    }

    /// Produce one assistant turn in reply to `input`, given what has been said so far.
    ///
    /// Sends `history ++ [input']` where `input'` is the templated input. `history` is not
    /// modified. Agents with capabilities may make up to [`MAX_TOOL_ROUNDS`] follow-up calls
    /// when the model asks for a tool. Agents without capabilities make exactly one call.
    ///
    /// # Errors
    ///
    /// An [`UpstreamError`] naming this agent when a call fails or exceeds
    /// `context.options.timeout`. No retries happen here.
    pub async fn respond(
        &self,
        context: &ModelContext,
        history: &ConversationHistory,
        input: Turn,
    ) -> Result<Turn, UpstreamError> {
        let (_, reply) = self.exchange(context, history, input).await?;
        Ok(reply)
    }

    /// Like [`respond`](Agent::respond), then append `input'` and the reply to `history`.
    /// On failure `history` is left exactly as it was.
    pub async fn respond_and_record(
        &self,
        context: &ModelContext,
        history: &mut ConversationHistory,
        input: Turn,
    ) -> Result<Turn, UpstreamError> {
        let (sent, reply) = self.exchange(context, history, input).await?;
        history.push(sent);
        history.push(reply.clone());
        Ok(reply)
    }

    async fn exchange(
        &self,
        context: &ModelContext,
        history: &ConversationHistory,
        input: Turn,
    ) -> Result<(Turn, Turn), UpstreamError> {
        debug_assert_eq!(input.role, Role::User, "agent input must be a user turn");
        debug_assert_ne!(
            history.last_role(),
            Some(Role::User),
            "history must not end with an unanswered user turn"
        );

        let sent = self.prepare_input(input);
        let mut request: Vec<Turn> = history.turns().to_vec();
        request.push(sent.clone());

        let mut round = 1;
        let mut reply = self.call(context, &request, round).await?;
        if self.capabilities.is_empty() {
            return Ok((sent, reply));
        }

        let mut tool_rounds = 0;
        while let Some(tool_call) = parse_tool_call(&reply.content) {
            if tool_rounds >= MAX_TOOL_ROUNDS {
                log::warn!(
                    "agentcrew::agent: '{}' hit the tool round limit ({}), returning last reply",
                    self.name,
                    MAX_TOOL_ROUNDS
                );
                break;
            }
            tool_rounds += 1;

            let (feedback, success) = match find_capability(&self.capabilities, &tool_call.name) {
                Some(capability) => match capability.invoke(&tool_call.parameters).await {
                    Ok(output) => (
                        format!(
                            "Tool '{}' executed successfully. Result: {}",
                            tool_call.name, output
                        ),
                        true,
                    ),
                    Err(err) => (
                        format!("Tool '{}' failed. Error: {}", tool_call.name, err),
                        false,
                    ),
                },
                None => (
                    format!(
                        "Tool execution error: {}",
                        ToolError::UnknownTool(tool_call.name.clone())
                    ),
                    false,
                ),
            };
            log::debug!(
                "agentcrew::agent: '{}' ran tool '{}' (success: {})",
                self.name,
                tool_call.name,
                success
            );
            context
                .emit(AgentEvent::ToolInvoked {
                    agent_name: self.name.clone(),
                    tool_name: tool_call.name,
                    success,
                })
                .await;

            request.push(reply);
            request.push(Turn::user(feedback));
            round += 1;
            reply = self.call(context, &request, round).await?;
        }

        Ok((sent, reply))
    }

    async fn call(
        &self,
        context: &ModelContext,
        request: &[Turn],
        round: usize,
    ) -> Result<Turn, UpstreamError> {
        context
            .emit(AgentEvent::CallStarted {
                agent_name: self.name.clone(),
                round,
                history_len: request.len(),
            })
            .await;
        log::debug!(
            "agentcrew::agent: '{}' sending {} turns to {} (round {})",
            self.name,
            request.len(),
            context.client.model_name(),
            round
        );

        let timeout = context.options.timeout;
        let outcome = tokio::time::timeout(
            timeout,
            context.client.send_message(request, &context.options),
        )
        .await;

        let result = match outcome {
            Ok(Ok(reply)) => Ok(Turn {
                role: Role::Assistant,
                ..reply
            }),
            Ok(Err(err)) => Err(UpstreamError::from_backend(&self.name, err)),
            Err(_) => Err(UpstreamError::from_backend(
                &self.name,
                BackendError::timeout(format!("no reply within {:?}", timeout)),
            )),
        };

        match &result {
            Ok(reply) => {
                // The shared last-usage slot can be overwritten by a concurrent sibling call.
                let tokens_used = match reply.usage {
                    Some(usage) => Some(usage),
                    None => context.client.get_last_usage().await,
                };
                context
                    .emit(AgentEvent::CallCompleted {
                        agent_name: self.name.clone(),
                        round,
                        response_length: reply.content.len(),
                        tokens_used,
                    })
                    .await;
            }
            Err(err) => {
                log::error!("agentcrew::agent: {}", err);
                context
                    .emit(AgentEvent::CallFailed {
                        agent_name: self.name.clone(),
                        round,
                        error: err.clone(),
                    })
                    .await;
            }
        }
        result
    }
}
