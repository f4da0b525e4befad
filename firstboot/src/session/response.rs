//! Response type for command exchanges.

use std::time::Duration;

/// Output of one command exchange.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was sent (empty for a bare wait).
    pub command: String,

    /// What the session returned: the consumed slice for telnet, the
    /// whole retained transcript for shell sessions.
    pub output: String,

    /// Text received since the command was written.
    pub reply: String,

    /// The prompt text that matched.
    pub prompt: String,

    /// Index of the matching pattern in the prompt set.
    pub prompt_index: usize,

    /// Time taken to execute the command.
    pub elapsed: Duration,
}

impl Response {
    /// Create a new response.
    pub fn new(
        command: impl Into<String>,
        output: impl Into<String>,
        reply: impl Into<String>,
        prompt: impl Into<String>,
        prompt_index: usize,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            reply: reply.into(),
            prompt: prompt.into(),
            prompt_index,
            elapsed,
        }
    }

    /// Check if the reply contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.reply.contains(pattern)
    }

    /// Get the reply lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.reply.lines()
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.output)
    }
}
