//! Scripted chat lines, said once or on a loop.

use std::time::Duration;

use afkbot_protocol::WorldCommand;
use tokio::time::{self, Instant};

use crate::config::ChatMessages;

/// Says the configured lines for one session.
///
/// In repeat mode the script owns a single timer slot, polled by the
/// session loop through [`next_due`](Self::next_due). The first line is
/// said one full delay after [`start`](Self::start).
#[derive(Debug)]
pub struct ChatScript {
    messages: Vec<String>,
    repeat: bool,
    delay: Duration,
    next_index: usize,
    deadline: Option<Instant>,
}

impl ChatScript {
    pub fn new(settings: &ChatMessages) -> Self {
        Self {
            messages: settings.messages.clone(),
            repeat: settings.repeat,
            delay: Duration::from_secs(settings.repeat_delay),
            next_index: 0,
            deadline: None,
        }
    }

    /// Returns the lines to say right away. In repeat mode that's none;
    /// the repeat timer is armed instead.
    pub fn start(&mut self) -> Vec<WorldCommand> {
        if self.messages.is_empty() {
            return Vec::new();
        }
        if self.repeat {
            self.next_index = 0;
            // A delay too large to represent leaves the timer unarmed.
            self.deadline = Instant::now().checked_add(self.delay);
            tracing::debug!(
                lines = self.messages.len(),
                delay_secs = self.delay.as_secs(),
                "chat script repeating"
            );
            return Vec::new();
        }
        self.messages.iter().map(WorldCommand::chat).collect()
    }

    /// Resolves when the next repeated line is due; pends forever when
    /// nothing is armed.
    pub async fn next_due(&self) {
        match self.deadline {
            Some(at) => time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    }

    /// Takes the line that is due and re-arms the timer.
    pub fn on_due(&mut self) -> Option<WorldCommand> {
        let deadline = self.deadline?;
        let line = self.messages.get(self.next_index)?;
        let command = WorldCommand::chat(line);
        self.next_index = (self.next_index + 1) % self.messages.len();
        self.deadline = deadline.checked_add(self.delay);
        Some(command)
    }

    pub fn stop(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }
}
