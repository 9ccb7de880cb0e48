//! Where human input comes from in [`Orchestrator::converse`](crate::Orchestrator::converse).

use async_trait::async_trait;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;

/// A stream of human messages. `None` means the source is closed for good.
#[async_trait]
pub trait InputSource: Send {
    async fn next_input(&mut self) -> Option<String>;
}

/// Reads lines from stdin, printing a prompt before each one.
pub struct ConsoleInput {
    prompt: String,
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for ConsoleInput {
    fn default() -> Self {
        Self::new("You: ")
    }
}

#[async_trait]
impl InputSource for ConsoleInput {
    async fn next_input(&mut self) -> Option<String> {
        print!("{}", self.prompt);
        // Best effort; a failed flush only delays the prompt.
        let _ = std::io::stdout().flush();
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(e) => {
                log::error!("agentcrew::input_source: stdin read failed: {}", e);
                None
            }
        }
    }
}

/// Messages pushed from elsewhere in the process, e.g. a web handler or a test.
pub struct QueueInput {
    receiver: mpsc::Receiver<String>,
}

impl QueueInput {
    pub fn new(receiver: mpsc::Receiver<String>) -> Self {
        Self { receiver }
    }

    /// A bounded queue and its sending half. Dropping every sender closes the input.
    pub fn channel(capacity: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl InputSource for QueueInput {
    async fn next_input(&mut self) -> Option<String> {
        self.receiver.recv().await
    }
}
