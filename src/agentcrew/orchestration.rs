//! Multi-agent turn-taking.
//!
//! An [`Orchestrator`] owns an ordered roster of [`Agent`]s and a shared [`ModelContext`].
//! It drives them through one of three deterministic [`OrchestrationPolicy`]s:
//!
//! - **Independent**: every agent answers the seed once, from a fresh transcript,
//!   concurrently. One [`AgentOutcome`] per agent, in roster order. A failing agent never
//!   takes its siblings down.
//! - **RoundRobin**: agents take turns in roster order. Each reply, relabelled as a user
//!   turn, becomes the next agent's input.
//! - **FixedSequence**: a scripted list of `(agent, template)` steps. Each step's template
//!   is filled with the previous step's reply (the seed for the first step).
//!
//! Sequential policies are lazy: [`Orchestrator::start`] returns a [`Run`] that produces one
//! turn per [`Run::next_turn`] call, and a [`TerminationCondition`] (stop phrase or turn
//! ceiling) is checked after every turn. [`Orchestrator::converse`] puts a human in the
//! loop through an [`InputSource`].
//!
//! # Example
//!
//! ```rust,no_run
//! use agentcrew::{Agent, ModelContext, Orchestrator, OrchestrationPolicy, TerminationCondition, Turn};
//! use agentcrew::clients::openai::OpenAIClient;
//! use std::sync::Arc;
//!
//! # async {
//! let context = ModelContext::new(Arc::new(OpenAIClient::new_with_model_string("key", "gpt-4o-mini")));
//! let mut crew = Orchestrator::new(context);
//! crew.add_agent(Agent::new("Agent A", "You are a curious philosopher."))?;
//! crew.add_agent(Agent::new("Agent B", "You are a skeptical scientist."))?;
//!
//! let outcome = crew
//!     .start(
//!         OrchestrationPolicy::RoundRobin,
//!         Turn::user("Hey Agent B, let's chat!"),
//!         TerminationCondition::new(4).with_stop_phrases(["goodbye"]),
//!     )?
//!     .collect()
//!     .await?;
//! for t in &outcome.turns {
//!     println!("{}: {}", t.agent_name, t.turn.content);
//! }
//! # Ok::<(), agentcrew::CrewError>(())
//! # };
//! ```

use crate::agentcrew::agent::{Agent, ModelContext};
use crate::agentcrew::client_wrapper::{Role, Turn};
use crate::agentcrew::conversation::ConversationHistory;
use crate::agentcrew::error::{CrewError, Result, UpstreamError, UpstreamErrorKind};
use crate::agentcrew::event::{EventHandler, OrchestrationEvent};
use crate::agentcrew::input_source::InputSource;
use crate::agentcrew::prompt::PromptTemplate;
use crate::agentcrew::termination::{TerminationCondition, TerminationReason};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Retries applied by the orchestrator to `Timeout` and `RateLimited` failures only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry; doubled for every further attempt.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff.saturating_mul(factor)
    }
}

/// One scripted step of a [`OrchestrationPolicy::FixedSequence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceStep {
    /// Position of the agent in the roster.
    pub agent_index: usize,
    /// Framing for the previous reply (or the seed, for the first step).
    pub template: PromptTemplate,
}

impl SequenceStep {
    pub fn new(agent_index: usize, template: impl Into<PromptTemplate>) -> Self {
        Self {
            agent_index,
            template: template.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestrationPolicy {
    Independent,
    RoundRobin,
    FixedSequence { steps: Vec<SequenceStep> },
}

impl OrchestrationPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            OrchestrationPolicy::Independent => "independent",
            OrchestrationPolicy::RoundRobin => "round_robin",
            OrchestrationPolicy::FixedSequence { .. } => "fixed_sequence",
        }
    }
}

/// A turn produced during a run, attributed to its agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentTurn {
    pub agent_name: String,
    pub turn: Turn,
}

/// Where a sequential run is.
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    /// No turn requested yet.
    Idle,
    /// The roster entry at this index produces the next turn.
    AwaitingAgent(usize),
    /// Absorbing.
    Terminated(TerminationReason),
}

/// Result of a drained RoundRobin, FixedSequence or converse run.
#[derive(Debug, Clone)]
pub struct SequenceOutcome {
    pub turns: Vec<AgentTurn>,
    pub reason: TerminationReason,
    /// Final transcripts, one per roster entry.
    pub histories: Vec<ConversationHistory>,
}

/// One agent's answer under the Independent policy.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub agent_name: String,
    pub result: std::result::Result<Turn, UpstreamError>,
}

/// Results of an Independent run, one per roster entry, in roster order.
#[derive(Debug, Clone)]
pub struct IndependentOutcome {
    pub results: Vec<AgentOutcome>,
}

impl IndependentOutcome {
    pub fn get(&self, agent_name: &str) -> Option<&AgentOutcome> {
        self.results.iter().find(|r| r.agent_name == agent_name)
    }

    pub fn successes(&self) -> impl Iterator<Item = (&str, &Turn)> {
        self.results
            .iter()
            .filter_map(|r| r.result.as_ref().ok().map(|t| (r.agent_name.as_str(), t)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &UpstreamError> {
        self.results.iter().filter_map(|r| r.result.as_ref().err())
    }
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Sequence(SequenceOutcome),
    Independent(IndependentOutcome),
}

impl RunOutcome {
    pub fn into_sequence(self) -> Option<SequenceOutcome> {
        match self {
            RunOutcome::Sequence(outcome) => Some(outcome),
            RunOutcome::Independent(_) => None,
        }
    }

    pub fn into_independent(self) -> Option<IndependentOutcome> {
        match self {
            RunOutcome::Independent(outcome) => Some(outcome),
            RunOutcome::Sequence(_) => None,
        }
    }
}

enum CallOutcome {
    Replied(Turn),
    Failed(UpstreamError),
    /// Cancelled while waiting to retry `last_error`.
    Cancelled { last_error: UpstreamError },
}

/// Call `agent`, retrying retryable failures per `retry`. The backoff sleep is
/// cancellation-aware; the call itself is not interrupted.
async fn respond_with_retry(
    agent: &Agent,
    context: &ModelContext,
    retry: &RetryPolicy,
    cancellation: &CancellationToken,
    history: &mut ConversationHistory,
    input: &Turn,
) -> CallOutcome {
    let mut attempt = 0;
    loop {
        let err = match agent
            .respond_and_record(context, history, input.clone())
            .await
        {
            Ok(reply) => return CallOutcome::Replied(reply),
            Err(err) => err,
        };
        if !err.kind.is_retryable() || attempt >= retry.max_retries {
            return CallOutcome::Failed(err);
        }

        attempt += 1;
        let delay = retry.delay_for(attempt);
        log::warn!(
            "agentcrew::orchestration: '{}' failed ({}), retry {}/{} in {:?}",
            agent.name(),
            err.kind,
            attempt,
            retry.max_retries,
            delay
        );
        if let Some(handler) = &context.event_handler {
            handler
                .on_orchestration_event(&OrchestrationEvent::RetryScheduled {
                    agent_name: agent.name().to_string(),
                    attempt,
                    delay,
                })
                .await;
        }
        tokio::select! {
            _ = cancellation.cancelled() => return CallOutcome::Cancelled { last_error: err },
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Drives a roster of agents through a policy.
pub struct Orchestrator {
    context: ModelContext,
    agents: Vec<Agent>,
    retry: RetryPolicy,
    cancellation: CancellationToken,
}

impl Orchestrator {
    pub fn new(context: ModelContext) -> Self {
        Self {
            context,
            agents: Vec::new(),
            retry: RetryPolicy::default(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Observe `token` before every turn and during retry backoff.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Receive orchestration events. The handler is also installed on the shared context,
    /// so agent events reach it too.
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.context.event_handler = Some(handler);
        self
    }

    /// Append `agent` to the roster.
    ///
    /// # Errors
    ///
    /// [`CrewError::Configuration`] if an agent with the same name is already present.
    pub fn add_agent(&mut self, agent: Agent) -> Result<()> {
        if self.agents.iter().any(|a| a.name() == agent.name()) {
            return Err(CrewError::config(format!(
                "an agent named '{}' is already in the roster",
                agent.name()
            )));
        }
        self.agents.push(agent);
        Ok(())
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name() == name)
    }

    pub fn context(&self) -> &ModelContext {
        &self.context
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// One fresh transcript per roster entry.
    pub fn fresh_histories(&self) -> Vec<ConversationHistory> {
        self.agents.iter().map(Agent::fresh_history).collect()
    }

    async fn emit(&self, event: OrchestrationEvent) {
        if let Some(handler) = &self.context.event_handler {
            handler.on_orchestration_event(&event).await;
        }
    }

    fn validate_roster(&self) -> Result<()> {
        if self.agents.is_empty() {
            return Err(CrewError::config("the orchestrator has no agents"));
        }
        Ok(())
    }

    fn validate_seed(seed: &Turn) -> Result<()> {
        if seed.role != Role::User {
            return Err(CrewError::config(format!(
                "the seed must be a user turn, got {:?}",
                seed.role
            )));
        }
        Ok(())
    }

    fn validate_termination(termination: &TerminationCondition) -> Result<()> {
        if termination.max_turns() == 0 {
            return Err(CrewError::config("max_turns must be at least 1"));
        }
        Ok(())
    }

    fn validate_steps(&self, steps: &[SequenceStep]) -> Result<()> {
        if steps.is_empty() {
            return Err(CrewError::config("a fixed sequence needs at least one step"));
        }
        if let Some((k, step)) = steps
            .iter()
            .enumerate()
            .find(|(_, s)| s.agent_index >= self.agents.len())
        {
            return Err(CrewError::config(format!(
                "step {} refers to agent {} but the roster has {} agents",
                k,
                step.agent_index,
                self.agents.len()
            )));
        }
        Ok(())
    }

    /// Run `policy` to completion.
    ///
    /// # Errors
    ///
    /// [`CrewError::Configuration`] before any backend call for an invalid setup.
    /// [`CrewError::Upstream`] if a sequential run hits a non-recoverable backend failure.
    /// [`CrewError::Cancelled`] if an Independent run is cancelled before dispatch.
    pub async fn run(
        &self,
        policy: OrchestrationPolicy,
        seed: Turn,
        termination: TerminationCondition,
    ) -> Result<RunOutcome> {
        Self::validate_termination(&termination)?;
        match policy {
            OrchestrationPolicy::Independent => {
                self.run_independent(seed).await.map(RunOutcome::Independent)
            }
            policy => self
                .start(policy, seed, termination)?
                .collect()
                .await
                .map(RunOutcome::Sequence),
        }
    }

    /// Every agent answers `seed` once, concurrently, each from a fresh transcript.
    pub async fn run_independent(&self, seed: Turn) -> Result<IndependentOutcome> {
        self.validate_roster()?;
        Self::validate_seed(&seed)?;
        if self.cancellation.is_cancelled() {
            return Err(CrewError::Cancelled);
        }

        log::info!(
            "agentcrew::orchestration: independent run over {} agents",
            self.agents.len()
        );
        self.emit(OrchestrationEvent::RunStarted {
            policy: OrchestrationPolicy::Independent.label().to_string(),
            agent_count: self.agents.len(),
        })
        .await;

        let handles: Vec<_> = self
            .agents
            .iter()
            .map(|agent| {
                let agent = agent.clone();
                let context = self.context.clone();
                let retry = self.retry.clone();
                let cancellation = self.cancellation.clone();
                let seed = seed.clone();
                tokio::spawn(async move {
                    let mut history = agent.fresh_history();
                    match respond_with_retry(
                        &agent,
                        &context,
                        &retry,
                        &cancellation,
                        &mut history,
                        &seed,
                    )
                    .await
                    {
                        CallOutcome::Replied(reply) => Ok(reply),
                        CallOutcome::Failed(err) => Err(err),
                        CallOutcome::Cancelled { last_error } => Err(last_error),
                    }
                })
            })
            .collect();

        let joined = join_all(handles).await;

        let mut results = Vec::with_capacity(self.agents.len());
        for (agent, joined) in self.agents.iter().zip(joined) {
            let result = joined.unwrap_or_else(|join_err| {
                Err(UpstreamError {
                    agent_name: agent.name().to_string(),
                    kind: UpstreamErrorKind::Unknown,
                    cause: format!("agent task did not complete: {}", join_err),
                })
            });
            if let Err(err) = &result {
                self.emit(OrchestrationEvent::AgentFailed { error: err.clone() })
                    .await;
            }
            results.push(AgentOutcome {
                agent_name: agent.name().to_string(),
                result,
            });
        }

        Ok(IndependentOutcome { results })
    }

    /// Begin a RoundRobin or FixedSequence run with fresh transcripts.
    pub fn start(
        &self,
        policy: OrchestrationPolicy,
        seed: Turn,
        termination: TerminationCondition,
    ) -> Result<Run<'_>> {
        self.validate_roster()?;
        self.start_with_histories(policy, seed, termination, self.fresh_histories())
    }

    /// Begin a run that continues existing transcripts, e.g. the same pair of agents
    /// moving on to the next topic. `histories` must hold one entry per roster agent, in
    /// roster order.
    pub fn start_with_histories(
        &self,
        policy: OrchestrationPolicy,
        seed: Turn,
        termination: TerminationCondition,
        histories: Vec<ConversationHistory>,
    ) -> Result<Run<'_>> {
        self.validate_roster()?;
        Self::validate_seed(&seed)?;
        Self::validate_termination(&termination)?;
        if histories.len() != self.agents.len() {
            return Err(CrewError::config(format!(
                "expected {} histories, got {}",
                self.agents.len(),
                histories.len()
            )));
        }
        if let Some(k) = histories
            .iter()
            .position(|h| h.last_role() == Some(Role::User))
        {
            return Err(CrewError::config(format!(
                "history {} ends with an unanswered user turn",
                k
            )));
        }

        let plan = match policy {
            OrchestrationPolicy::Independent => {
                return Err(CrewError::config(
                    "the independent policy is not sequential; use run_independent",
                ))
            }
            OrchestrationPolicy::RoundRobin => Plan::RoundRobin,
            OrchestrationPolicy::FixedSequence { steps } => {
                self.validate_steps(&steps)?;
                Plan::Steps(steps)
            }
        };

        Ok(Run {
            orchestrator: self,
            plan,
            termination,
            histories,
            pending: seed,
            produced: 0,
            state: RunState::Idle,
        })
    }

    /// Human-in-the-loop chat.
    ///
    /// Reads one input from `source` at a time. An input matching a stop phrase ends the
    /// conversation. Otherwise the input goes to the first agent and each reply is relayed to
    /// the next agent in roster order, with `on_turn` called for every reply. Transcripts
    /// persist across inputs. Ends when the source closes, a stop phrase is seen, the turn
    /// ceiling is reached, or the cancellation token fires.
    pub async fn converse<S, F>(
        &self,
        source: &mut S,
        termination: &TerminationCondition,
        mut on_turn: F,
    ) -> Result<SequenceOutcome>
    where
        S: InputSource + ?Sized,
        F: FnMut(&AgentTurn),
    {
        self.validate_roster()?;
        Self::validate_termination(termination)?;

        let mut histories = self.fresh_histories();
        let mut turns: Vec<AgentTurn> = Vec::new();
        self.emit(OrchestrationEvent::RunStarted {
            policy: "converse".to_string(),
            agent_count: self.agents.len(),
        })
        .await;

        let reason = 'conversation: loop {
            if self.cancellation.is_cancelled() {
                break TerminationReason::Cancelled;
            }
            let input = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => break 'conversation TerminationReason::Cancelled,
                input = source.next_input() => input,
            };
            let Some(text) = input else {
                break TerminationReason::InputClosed;
            };
            if text.trim().is_empty() {
                continue;
            }
            if let Some(phrase) = termination.matched_phrase_in(&text) {
                break TerminationReason::StopPhrase(phrase.to_string());
            }

            let mut current = Turn::user(text);
            for (index, agent) in self.agents.iter().enumerate() {
                if self.cancellation.is_cancelled() {
                    break 'conversation TerminationReason::Cancelled;
                }
                match respond_with_retry(
                    agent,
                    &self.context,
                    &self.retry,
                    &self.cancellation,
                    &mut histories[index],
                    &current,
                )
                .await
                {
                    CallOutcome::Replied(reply) => {
                        current = reply.relay();
                        let turn = AgentTurn {
                            agent_name: agent.name().to_string(),
                            turn: reply,
                        };
                        on_turn(&turn);
                        self.emit(OrchestrationEvent::TurnCompleted {
                            turn_index: turns.len() + 1,
                            agent_name: turn.agent_name.clone(),
                            response_length: turn.turn.content.len(),
                        })
                        .await;
                        let check = termination.check(&turn.turn, turns.len() + 1);
                        turns.push(turn);
                        if let Some(reason) = check {
                            break 'conversation reason;
                        }
                    }
                    CallOutcome::Failed(err) => {
                        self.emit(OrchestrationEvent::AgentFailed { error: err.clone() })
                            .await;
                        self.emit(OrchestrationEvent::RunTerminated {
                            reason: TerminationReason::Failed(err.clone()),
                            turns: turns.len(),
                        })
                        .await;
                        return Err(CrewError::Upstream(err));
                    }
                    CallOutcome::Cancelled { .. } => {
                        break 'conversation TerminationReason::Cancelled;
                    }
                }
            }
        };

        log::info!(
            "agentcrew::orchestration: conversation ended after {} turns ({})",
            turns.len(),
            reason
        );
        self.emit(OrchestrationEvent::RunTerminated {
            reason: reason.clone(),
            turns: turns.len(),
        })
        .await;

        Ok(SequenceOutcome {
            turns,
            reason,
            histories,
        })
    }
}

enum Plan {
    RoundRobin,
    Steps(Vec<SequenceStep>),
}

/// A lazily produced RoundRobin or FixedSequence run.
///
/// Each [`next_turn`](Run::next_turn) makes exactly one agent turn (plus any retries) and
/// then checks the termination condition. Once terminated, `next_turn` keeps returning
/// `None`.
pub struct Run<'a> {
    orchestrator: &'a Orchestrator,
    plan: Plan,
    termination: TerminationCondition,
    histories: Vec<ConversationHistory>,
    /// Seed, then the latest reply relabelled as a user turn.
    pending: Turn,
    produced: usize,
    state: RunState,
}

impl<'a> Run<'a> {
    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn turns_produced(&self) -> usize {
        self.produced
    }

    pub fn histories(&self) -> &[ConversationHistory] {
        &self.histories
    }

    pub fn into_histories(self) -> Vec<ConversationHistory> {
        self.histories
    }

    fn assignment(&self) -> (usize, Turn) {
        match &self.plan {
            Plan::RoundRobin => (
                self.produced % self.orchestrator.agents.len(),
                self.pending.clone(),
            ),
            Plan::Steps(steps) => {
                let step = &steps[self.produced];
                let input = Turn {
                    content: Arc::from(step.template.render(&self.pending.content)),
                    ..self.pending.clone()
                };
                (step.agent_index, input)
            }
        }
    }

    fn next_agent_index(&self) -> Option<usize> {
        match &self.plan {
            Plan::RoundRobin => Some(self.produced % self.orchestrator.agents.len()),
            Plan::Steps(steps) => steps.get(self.produced).map(|s| s.agent_index),
        }
    }

    async fn finish(&mut self, reason: TerminationReason) {
        log::info!(
            "agentcrew::orchestration: run terminated after {} turns ({})",
            self.produced,
            reason
        );
        self.orchestrator
            .emit(OrchestrationEvent::RunTerminated {
                reason: reason.clone(),
                turns: self.produced,
            })
            .await;
        self.state = RunState::Terminated(reason);
    }

    /// Produce the next turn, or `None` once the run has terminated.
    ///
    /// A backend failure is yielded once as `Some(Err(..))`, after which the run is
    /// terminated with [`TerminationReason::Failed`].
    pub async fn next_turn(&mut self) -> Option<Result<AgentTurn>> {
        if let RunState::Terminated(_) = self.state {
            return None;
        }
        let orchestrator = self.orchestrator;

        if self.state == RunState::Idle {
            log::info!(
                "agentcrew::orchestration: {} run over {} agents",
                self.policy_label(),
                orchestrator.agents.len()
            );
            orchestrator
                .emit(OrchestrationEvent::RunStarted {
                    policy: self.policy_label().to_string(),
                    agent_count: orchestrator.agents.len(),
                })
                .await;
        }

        if orchestrator.cancellation.is_cancelled() {
            self.finish(TerminationReason::Cancelled).await;
            return None;
        }

        let (agent_index, input) = self.assignment();
        self.state = RunState::AwaitingAgent(agent_index);
        let agent = &orchestrator.agents[agent_index];

        let outcome = respond_with_retry(
            agent,
            &orchestrator.context,
            &orchestrator.retry,
            &orchestrator.cancellation,
            &mut self.histories[agent_index],
            &input,
        )
        .await;

        match outcome {
            CallOutcome::Replied(reply) => {
                self.produced += 1;
                orchestrator
                    .emit(OrchestrationEvent::TurnCompleted {
                        turn_index: self.produced,
                        agent_name: agent.name().to_string(),
                        response_length: reply.content.len(),
                    })
                    .await;
                self.pending = reply.relay();

                if let Some(reason) = self.termination_after(&reply) {
                    self.finish(reason).await;
                } else if let Some(next) = self.next_agent_index() {
                    self.state = RunState::AwaitingAgent(next);
                }

                Some(Ok(AgentTurn {
                    agent_name: agent.name().to_string(),
                    turn: reply,
                }))
            }
            CallOutcome::Failed(err) => {
                orchestrator
                    .emit(OrchestrationEvent::AgentFailed { error: err.clone() })
                    .await;
                self.finish(TerminationReason::Failed(err.clone())).await;
                Some(Err(CrewError::Upstream(err)))
            }
            CallOutcome::Cancelled { .. } => {
                self.finish(TerminationReason::Cancelled).await;
                None
            }
        }
    }

    // Stop phrase, then natural end of a script, then the turn ceiling.
    fn termination_after(&self, reply: &Turn) -> Option<TerminationReason> {
        if let Some(phrase) = self.termination.matched_phrase(reply) {
            return Some(TerminationReason::StopPhrase(phrase.to_string()));
        }
        if let Plan::Steps(steps) = &self.plan {
            if self.produced >= steps.len() {
                return Some(TerminationReason::SequenceComplete);
            }
        }
        if self.termination.turn_limit_reached(self.produced) {
            return Some(TerminationReason::TurnLimit);
        }
        None
    }

    fn policy_label(&self) -> &'static str {
        match self.plan {
            Plan::RoundRobin => OrchestrationPolicy::RoundRobin.label(),
            Plan::Steps(_) => "fixed_sequence",
        }
    }

    /// Drain the run.
    ///
    /// # Errors
    ///
    /// [`CrewError::Upstream`] if any turn failed.
    pub async fn collect(mut self) -> Result<SequenceOutcome> {
        let mut turns = Vec::new();
        while let Some(turn) = self.next_turn().await {
            turns.push(turn?);
        }
        let RunState::Terminated(reason) = self.state else {
            return Err(CrewError::config("run stopped without a termination reason"));
        };
        Ok(SequenceOutcome {
            turns,
            reason,
            histories: self.histories,
        })
    }
}
