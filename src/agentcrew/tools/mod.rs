//! Agent capabilities.
//!
//! The set is closed: an agent can be granted the [`Calculator`] and/or [`WebSearch`], and
//! nothing else. Each capability takes one typed parameter and produces a typed output. Both
//! are described to the model in a short manual appended to the agent's system turn.
//!
//! A model requests a capability by replying with
//! `{"tool_call": {"name": "calculator", "parameters": {"expression": "2+2"}}}`. The agent
//! runs it and feeds the result back as text. Failures are reported to the model the same
//! way and never abort the turn.
//!
//! ```rust
//! use agentcrew::tools::{Capability, ToolOutput};
//! use serde_json::json;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let out = rt
//!     .block_on(Capability::calculator().invoke(&json!({"expression": "sqrt(16) + 1"})))
//!     .unwrap();
//! assert_eq!(out, ToolOutput::Number(5.0));
//! ```

pub mod calculator;
pub mod web_search;

pub use calculator::{Calculator, CalculatorError, CalculatorResult};
pub use web_search::{SearchHit, SearchResult, WebSearch};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Capability failure, reported back to the model as text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid parameters for '{tool}': {reason}")]
    InvalidParameters { tool: String, reason: String },

    #[error(transparent)]
    Calculator(#[from] CalculatorError),

    #[error("search failed: {0}")]
    Search(String),
}

impl ToolError {
    pub fn invalid(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        ToolError::InvalidParameters {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

/// Configuration-level name of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Calculator,
    WebSearch,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalculatorInput {
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebSearchInput {
    pub query: String,
}

/// What a capability produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Number(f64),
    Search(SearchResult),
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolOutput::Number(n) => write!(f, "{}", n),
            ToolOutput::Search(result) => write!(f, "{}", result),
        }
    }
}

/// A capability an agent may invoke during a turn.
#[derive(Debug, Clone)]
pub enum Capability {
    Calculator(Calculator),
    WebSearch(WebSearch),
}

impl Capability {
    pub fn calculator() -> Self {
        Capability::Calculator(Calculator::new())
    }

    pub fn web_search() -> Self {
        Capability::WebSearch(WebSearch::new())
    }

    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::Calculator(_) => CapabilityKind::Calculator,
            Capability::WebSearch(_) => CapabilityKind::WebSearch,
        }
    }

    /// Name the model uses in a `tool_call` directive.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::Calculator(_) => "calculator",
            Capability::WebSearch(_) => "web_search",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Capability::Calculator(_) => {
                "Evaluates arithmetic: + - * / % ^, parentheses, pi, e, sqrt, abs, floor, ceil, \
                 round, ln, log, log2, exp, sin, cos, tan, min, max, sum, mean."
            }
            Capability::WebSearch(_) => {
                "Looks up a short factual summary and related links for a query."
            }
        }
    }

    fn parameter(&self) -> (&'static str, &'static str) {
        match self {
            Capability::Calculator(_) => ("expression", "the arithmetic expression"),
            Capability::WebSearch(_) => ("query", "what to look up"),
        }
    }

    /// Decode `parameters` into this capability's typed input and run it.
    pub async fn invoke(&self, parameters: &Value) -> Result<ToolOutput, ToolError> {
        match self {
            Capability::Calculator(calc) => {
                let input: CalculatorInput = decode_input(self.name(), parameters)?;
                Ok(ToolOutput::Number(calc.evaluate(&input.expression)?))
            }
            Capability::WebSearch(search) => {
                let input: WebSearchInput = decode_input(self.name(), parameters)?;
                Ok(ToolOutput::Search(search.search(&input.query).await?))
            }
        }
    }
}

impl From<CapabilityKind> for Capability {
    fn from(kind: CapabilityKind) -> Self {
        match kind {
            CapabilityKind::Calculator => Capability::calculator(),
            CapabilityKind::WebSearch => Capability::web_search(),
        }
    }
}

fn decode_input<T: DeserializeOwned>(tool: &str, parameters: &Value) -> Result<T, ToolError> {
    serde_json::from_value(parameters.clone()).map_err(|e| ToolError::invalid(tool, e.to_string()))
}

/// Look up the capability a directive names.
pub fn find_capability<'a>(capabilities: &'a [Capability], name: &str) -> Option<&'a Capability> {
    capabilities.iter().find(|c| c.name() == name)
}

/// The text appended to an agent's system turn describing its capabilities. Empty when the
/// agent has none.
pub fn capability_manual(capabilities: &[Capability]) -> String {
    if capabilities.is_empty() {
        return String::new();
    }
    let mut manual = String::from("You have access to the following tools:\n");
    for capability in capabilities {
        let (param, param_doc) = capability.parameter();
        manual.push_str(&format!(
            "- {}: {}\n  Parameters:\n    - {} (string): {}\n",
            capability.name(),
            capability.description(),
            param,
            param_doc
        ));
    }
    manual.push_str(
        "\nTo use a tool, respond with a JSON object in the following format:\n\
         {\"tool_call\": {\"name\": \"tool_name\", \"parameters\": {...}}}\n\
         After tool execution, I'll provide the result and you can continue.\n",
    );
    manual
}

/// A parsed `tool_call` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub parameters: Value,
}

/// Find the first `{"tool_call": {...}}` object in a reply, matching braces to locate its end.
pub fn parse_tool_call(response: &str) -> Option<ToolCall> {
    let start = response.find("{\"tool_call\"")?;
    let mut depth = 0usize;
    let mut end = None;
    for (offset, ch) in response[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    end = Some(start + offset + ch.len_utf8());
                    break;
                }
            }
            _ => {}
        }
    }

    let parsed: Value = serde_json::from_str(&response[start..end?]).ok()?;
    let call = parsed.get("tool_call")?;
    let name = call.get("name")?.as_str()?;
    let parameters = call.get("parameters")?;
    Some(ToolCall {
        name: name.to_string(),
        parameters: parameters.clone(),
    })
}
