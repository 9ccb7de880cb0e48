//! When a run stops.

use crate::agentcrew::client_wrapper::Turn;
use crate::agentcrew::error::UpstreamError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a stop phrase is compared against a turn's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopMatch {
    /// The phrase appears anywhere in the content (case-insensitive).
    #[default]
    Contains,
    /// The whole trimmed content equals the phrase (case-insensitive), like a console
    /// user typing `bye` on its own.
    Exact,
}

/// Stop phrases plus a turn ceiling, whichever fires first.
///
/// ```rust
/// use agentcrew::{TerminationCondition, Turn};
///
/// let cond = TerminationCondition::new(4).with_stop_phrases(["Goodbye"]);
/// assert_eq!(cond.matched_phrase(&Turn::assistant("ok, GOODBYE then")), Some("goodbye"));
/// assert!(cond.turn_limit_reached(4));
/// assert!(!cond.turn_limit_reached(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationCondition {
    stop_phrases: Vec<String>,
    stop_match: StopMatch,
    max_turns: usize,
}

impl TerminationCondition {
    /// A condition that only stops on the turn ceiling.
    pub fn new(max_turns: usize) -> Self {
        Self {
            stop_phrases: Vec::new(),
            stop_match: StopMatch::Contains,
            max_turns,
        }
    }

    pub fn with_stop_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    pub fn with_stop_match(mut self, stop_match: StopMatch) -> Self {
        self.stop_match = stop_match;
        self
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn stop_phrases(&self) -> &[String] {
        &self.stop_phrases
    }

    /// The configured phrase that `text` triggers, if any.
    pub fn matched_phrase_in(&self, text: &str) -> Option<&str> {
        let normalized = text.trim().to_lowercase();
        self.stop_phrases
            .iter()
            .find(|phrase| match self.stop_match {
                StopMatch::Contains => normalized.contains(phrase.as_str()),
                StopMatch::Exact => normalized == **phrase,
            })
            .map(String::as_str)
    }

    pub fn matched_phrase(&self, turn: &Turn) -> Option<&str> {
        self.matched_phrase_in(&turn.content)
    }

    pub fn turn_limit_reached(&self, produced: usize) -> bool {
        produced >= self.max_turns
    }

    /// Evaluate after the `produced`-th turn. Stop phrases win over the ceiling when both hold.
    pub fn check(&self, latest: &Turn, produced: usize) -> Option<TerminationReason> {
        if let Some(phrase) = self.matched_phrase(latest) {
            return Some(TerminationReason::StopPhrase(phrase.to_string()));
        }
        if self.turn_limit_reached(produced) {
            return Some(TerminationReason::TurnLimit);
        }
        None
    }
}

/// Why a run reached its terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// The latest turn contained one of the configured stop phrases.
    StopPhrase(String),
    /// The turn ceiling was reached.
    TurnLimit,
    /// A fixed sequence ran every step.
    SequenceComplete,
    /// The caller cancelled; no further turns were issued.
    Cancelled,
    /// The human input source closed.
    InputClosed,
    /// A backend call failed and the run aborted.
    Failed(UpstreamError),
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::StopPhrase(p) => write!(f, "stop phrase '{}'", p),
            TerminationReason::TurnLimit => f.write_str("turn limit reached"),
            TerminationReason::SequenceComplete => f.write_str("sequence complete"),
            TerminationReason::Cancelled => f.write_str("cancelled"),
            TerminationReason::InputClosed => f.write_str("input closed"),
            TerminationReason::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}
