//! # agentcrew
//!
//! agentcrew drives a small crew of LLM agents through deterministic turn-taking policies
//! over any OpenAI-compatible chat completion API.
//!
//! The crate provides:
//!
//! * **Agents**: [`Agent`] is an immutable identity (name, role instructions, optional
//!   [`tools::Capability`]s and input template). It is bound to a shared [`ModelContext`]
//!   at call time and answers with [`Agent::respond`].
//! * **Orchestration**: [`Orchestrator`] runs a roster of agents under an
//!   [`OrchestrationPolicy`]. `Independent` fans out concurrently, `RoundRobin` relays each
//!   reply to the next agent, and `FixedSequence` follows a script of templated steps. A
//!   [`TerminationCondition`] ends sequential runs on a stop phrase or a turn ceiling.
//! * **Transcripts**: [`ConversationHistory`] is the append-only record replayed to the
//!   model on every call, one per agent.
//! * **Human in the loop**: [`Orchestrator::converse`] reads from an
//!   [`input_source::InputSource`] (console or in-process queue).
//! * **Attachments**: [`attachment::AttachmentIngestor`] stages uploaded images in temp
//!   files that disappear once no turn references them.
//! * **Configuration**: [`CrewConfig`] describes a whole crew in JSON.
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use agentcrew::clients::openai::{Model, OpenAIClient};
//! use agentcrew::{Agent, ModelContext, Orchestrator, Turn};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     agentcrew::init_logger();
//!
//!     let api_key = std::env::var("OPENAI_API_KEY")?;
//!     let client = Arc::new(OpenAIClient::new_with_model_enum(&api_key, Model::GPT4oMini));
//!
//!     let mut crew = Orchestrator::new(ModelContext::new(client));
//!     crew.add_agent(Agent::new("Optimist", "Find the bright side. One sentence."))?;
//!     crew.add_agent(Agent::new("Realist", "State the facts plainly. One sentence."))?;
//!
//!     let outcome = crew.run_independent(Turn::user("I lost my job today.")).await?;
//!     for (name, turn) in outcome.successes() {
//!         println!("{}: {}", name, turn.content);
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once, driven by `RUST_LOG`.
///
/// Does nothing if the application already installed a logger.
///
/// ```rust
/// agentcrew::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::try_init();
    });
}

// Import the top-level `agentcrew` module.
pub mod agentcrew;

// Re-exporting key items for easier external access.
pub use agentcrew::agent;
pub use agentcrew::agent::{Agent, ModelContext, MAX_TOOL_ROUNDS};
pub use agentcrew::attachment;
pub use agentcrew::attachment::{AttachmentIngestor, MediaRef};
pub use agentcrew::client_wrapper;
pub use agentcrew::client_wrapper::{ClientWrapper, CompletionOptions, Role, TokenUsage, Turn};
pub use agentcrew::clients;
pub use agentcrew::config;
pub use agentcrew::config::CrewConfig;
pub use agentcrew::conversation::ConversationHistory;
pub use agentcrew::error;
pub use agentcrew::error::{
    AttachmentError, BackendError, CrewError, Result, UpstreamError, UpstreamErrorKind,
};
pub use agentcrew::event;
pub use agentcrew::event::{AgentEvent, EventHandler, OrchestrationEvent};
pub use agentcrew::input_source;
pub use agentcrew::input_source::{ConsoleInput, InputSource, QueueInput};
pub use agentcrew::orchestration;
pub use agentcrew::orchestration::{
    AgentOutcome, AgentTurn, IndependentOutcome, OrchestrationPolicy, Orchestrator, RetryPolicy,
    Run, RunOutcome, RunState, SequenceOutcome, SequenceStep,
};
pub use agentcrew::prompt::PromptTemplate;
pub use agentcrew::termination::{StopMatch, TerminationCondition, TerminationReason};
pub use agentcrew::tools;

pub use tokio_util::sync::CancellationToken;
