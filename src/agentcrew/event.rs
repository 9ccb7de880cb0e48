//! Agent and orchestration events.
//!
//! Implement [`EventHandler`] to watch a crew work: backend round-trips, capability
//! invocations, retries, and run boundaries. Both methods default to no-ops, so override
//! only what you need. A handler is shared as `Arc<dyn EventHandler>`. Agents get it through
//! [`ModelContext`](crate::ModelContext), and the orchestrator through
//! [`Orchestrator::with_event_handler`](crate::Orchestrator::with_event_handler).
//!
//! ```rust,no_run
//! use agentcrew::event::{AgentEvent, EventHandler, OrchestrationEvent};
//! use async_trait::async_trait;
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl EventHandler for Printer {
//!     async fn on_agent_event(&self, event: &AgentEvent) {
//!         if let AgentEvent::CallCompleted { agent_name, response_length, .. } = event {
//!             println!("{} replied ({} chars)", agent_name, response_length);
//!         }
//!     }
//!     async fn on_orchestration_event(&self, event: &OrchestrationEvent) {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

use crate::agentcrew::client_wrapper::TokenUsage;
use crate::agentcrew::error::UpstreamError;
use crate::agentcrew::termination::TerminationReason;
use async_trait::async_trait;
use std::time::Duration;

/// Emitted by an [`Agent`](crate::Agent) while it produces one turn.
///
/// ```text
/// CallStarted { round: 1 }
/// CallCompleted { round: 1 }
/// (reply holds a tool_call directive)
///   ToolInvoked
///   CallStarted { round: 2 }
///   CallCompleted { round: 2 }
/// ```
#[derive(Debug, Clone)]
pub enum AgentEvent {
    CallStarted {
        agent_name: String,
        /// 1 for the initial call, then one more per capability round.
        round: usize,
        /// Number of turns sent.
        history_len: usize,
    },
    CallCompleted {
        agent_name: String,
        round: usize,
        response_length: usize,
        tokens_used: Option<TokenUsage>,
    },
    CallFailed {
        agent_name: String,
        round: usize,
        error: UpstreamError,
    },
    ToolInvoked {
        agent_name: String,
        tool_name: String,
        success: bool,
    },
}

/// Emitted by the [`Orchestrator`](crate::Orchestrator).
#[derive(Debug, Clone)]
pub enum OrchestrationEvent {
    RunStarted {
        policy: String,
        agent_count: usize,
    },
    TurnCompleted {
        /// 1-based count of turns produced in this run.
        turn_index: usize,
        agent_name: String,
        response_length: usize,
    },
    AgentFailed {
        error: UpstreamError,
    },
    RetryScheduled {
        agent_name: String,
        attempt: u32,
        delay: Duration,
    },
    RunTerminated {
        reason: TerminationReason,
        turns: usize,
    },
}

/// Receives events from agents and the orchestrator.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_agent_event(&self, _event: &AgentEvent) {}

    async fn on_orchestration_event(&self, _event: &OrchestrationEvent) {}
}
