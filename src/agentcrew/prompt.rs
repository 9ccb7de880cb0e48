//! Prompt framing with a single substitution slot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The one placeholder a [`PromptTemplate`] understands.
pub const INPUT_SLOT: &str = "{input}";

/// Prompt text with an optional `{input}` slot.
///
/// Every occurrence of the slot is replaced by the same value. A template without the slot
/// is sent verbatim, whatever the input.
///
/// ```rust
/// use agentcrew::PromptTemplate;
///
/// let t = PromptTemplate::new("Help create emotional closure based on:\nUser's feelings: {input}");
/// assert!(t.has_slot());
/// assert_eq!(
///     t.render("I miss them"),
///     "Help create emotional closure based on:\nUser's feelings: I miss them"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn has_slot(&self) -> bool {
        self.text.contains(INPUT_SLOT)
    }

    pub fn render(&self, input: &str) -> String {
        self.text.replace(INPUT_SLOT, input)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<&str> for PromptTemplate {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for PromptTemplate {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
