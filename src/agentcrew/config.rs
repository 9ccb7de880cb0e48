//! Static crew configuration.
//!
//! [`CrewConfig`] describes a whole crew in one JSON document: model settings, termination,
//! retries and the ordered agent roster. Every field except `model` and `agents` has a
//! default. Credentials are deliberately absent; the caller supplies the client.
//!
//! ```rust
//! use agentcrew::CrewConfig;
//!
//! let config = CrewConfig::from_json_str(r#"{
//!     "model": "gpt-4o-mini",
//!     "stop_phrases": ["exit", "quit", "bye", "goodbye"],
//!     "stop_match": "exact",
//!     "agents": [
//!         {"name": "Assistant", "instructions": ["You are a helpful assistant.", "Keep it short."]}
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(config.max_turns, 10);
//! assert_eq!(config.agents[0].instructions.text(), "You are a helpful assistant.\nKeep it short.");
//! ```

use crate::agentcrew::agent::{Agent, ModelContext};
use crate::agentcrew::client_wrapper::{ClientWrapper, CompletionOptions};
use crate::agentcrew::clients::openai::OpenAIClient;
use crate::agentcrew::error::{CrewError, Result};
use crate::agentcrew::orchestration::{Orchestrator, RetryPolicy};
use crate::agentcrew::prompt::PromptTemplate;
use crate::agentcrew::termination::{StopMatch, TerminationCondition};
use crate::agentcrew::tools::CapabilityKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_turns() -> usize {
    10
}

fn default_max_retries() -> u32 {
    1
}

fn default_backoff_ms() -> u64 {
    500
}

/// Agent instructions, either one string or a list of lines joined with `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instructions {
    Text(String),
    Lines(Vec<String>),
}

impl Instructions {
    pub fn text(&self) -> String {
        match self {
            Instructions::Text(text) => text.clone(),
            Instructions::Lines(lines) => lines.join("\n"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub instructions: Instructions,
    #[serde(default)]
    pub capabilities: Vec<CapabilityKind>,
    #[serde(default)]
    pub input_template: Option<PromptTemplate>,
}

impl AgentConfig {
    pub fn build(&self) -> Agent {
        let mut agent = Agent::new(self.name.clone(), self.instructions.text());
        for kind in &self.capabilities {
            agent = agent.with_capability(*kind);
        }
        if let Some(template) = &self.input_template {
            agent = agent.with_input_template(template.clone());
        }
        agent
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

/// A crew, as loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewConfig {
    pub model: String,
    /// OpenAI-compatible endpoint; the OpenAI API when absent.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub stop_phrases: Vec<String>,
    #[serde(default)]
    pub stop_match: StopMatch,
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    #[serde(default)]
    pub retry: RetryConfig,
    pub agents: Vec<AgentConfig>,
}

impl CrewConfig {
    /// Parse and validate.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CrewConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("agentcrew::config: loading {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(CrewError::config("model must not be empty"));
        }
        if self.agents.is_empty() {
            return Err(CrewError::config("at least one agent is required"));
        }
        let mut seen = HashSet::new();
        for agent in &self.agents {
            if agent.name.trim().is_empty() {
                return Err(CrewError::config("agent names must not be empty"));
            }
            if !seen.insert(agent.name.as_str()) {
                return Err(CrewError::config(format!(
                    "duplicate agent name '{}'",
                    agent.name
                )));
            }
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(CrewError::config(format!(
                "temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(CrewError::config("max_tokens must be at least 1"));
        }
        if self.timeout_secs == 0 {
            return Err(CrewError::config("timeout_secs must be at least 1"));
        }
        if self.max_turns == 0 {
            return Err(CrewError::config("max_turns must be at least 1"));
        }
        Ok(())
    }

    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn termination(&self) -> TerminationCondition {
        TerminationCondition::new(self.max_turns)
            .with_stop_phrases(&self.stop_phrases)
            .with_stop_match(self.stop_match)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry.max_retries,
            backoff: Duration::from_millis(self.retry.backoff_ms),
        }
    }

    /// The same crew settings with a roster of just `agent_name`.
    ///
    /// The agent's input template is dropped, since it frames a relay from agents that are
    /// no longer present.
    pub fn solo(&self, agent_name: &str) -> Result<CrewConfig> {
        let agent = self
            .agents
            .iter()
            .find(|a| a.name == agent_name)
            .ok_or_else(|| CrewError::config(format!("no agent named '{}'", agent_name)))?;
        Ok(CrewConfig {
            agents: vec![AgentConfig {
                input_template: None,
                ..agent.clone()
            }],
            ..self.clone()
        })
    }

    pub fn build_agents(&self) -> Vec<Agent> {
        self.agents.iter().map(AgentConfig::build).collect()
    }

    /// An OpenAI-compatible client for this config's model and endpoint.
    pub fn openai_client(&self, api_key: &str) -> OpenAIClient {
        match &self.base_url {
            Some(base_url) => OpenAIClient::new_with_base_url(api_key, &self.model, base_url),
            None => OpenAIClient::new_with_model_string(api_key, &self.model),
        }
    }

    /// Validate, then assemble an orchestrator with the roster in configured order.
    pub fn build_orchestrator(&self, client: Arc<dyn ClientWrapper>) -> Result<Orchestrator> {
        self.validate()?;
        let context = ModelContext::new(client).with_options(self.completion_options());
        let mut orchestrator = Orchestrator::new(context).with_retry_policy(self.retry_policy());
        for agent in self.build_agents() {
            orchestrator.add_agent(agent)?;
        }
        Ok(orchestrator)
    }
}
