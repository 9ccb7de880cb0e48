//! Per-agent conversation transcripts.
//!
//! A [`ConversationHistory`] is the literal sequence replayed to the model on every call, so
//! insertion order matters and nothing is ever removed or rewritten. The only mutator is
//! [`push`](ConversationHistory::push).
//!
//! ```rust
//! use agentcrew::{ConversationHistory, Role, Turn};
//!
//! let mut history = ConversationHistory::with_system_prompt("You are terse.");
//! let before = history.clone();
//! history.push(Turn::user("hi"));
//! history.push(Turn::assistant("hello"));
//!
//! assert_eq!(history.last_role(), Some(Role::Assistant));
//! assert!(before.is_prefix_of(&history));
//! ```

use crate::agentcrew::client_wrapper::{Role, Turn};

/// Append-only ordered transcript owned by one agent slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// A history holding a single system turn.
    pub fn with_system_prompt(prompt: impl AsRef<str>) -> Self {
        Self {
            turns: vec![Turn::system(prompt)],
        }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn last_role(&self) -> Option<Role> {
        self.turns.last().map(|t| t.role)
    }

    /// `true` when every turn of `self` appears, in order, at the start of `other`.
    pub fn is_prefix_of(&self, other: &ConversationHistory) -> bool {
        self.turns.len() <= other.turns.len()
            && self.turns.iter().zip(other.turns.iter()).all(|(a, b)| a == b)
    }

    /// Rough size of the transcript in tokens, for logging.
    pub fn estimated_tokens(&self) -> usize {
        self.turns.iter().map(estimate_turn_token_count).sum()
    }
}

impl<'a> IntoIterator for &'a ConversationHistory {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

/// Estimates the number of tokens in a string.
/// Uses an approximate formula: one token per 4 characters.
fn estimate_token_count(text: &str) -> usize {
    (text.len() / 4).max(1)
}

/// Estimates the number of tokens in a Turn, including role annotations.
fn estimate_turn_token_count(turn: &Turn) -> usize {
    // Assuming the role adds some fixed number of tokens, e.g., 1 token
    1 + estimate_token_count(&turn.content)
}
