//! Phrase classes used to read the server's handshake replies.
//!
//! Auth plugins answer in free-form chat, and that chat is shared with
//! everything else on the server. A reply is recognised by
//! case-insensitive substring match against a fixed phrase list per step.
//! Success phrases are checked before failure phrases, so a line like
//! "You were already registered" counts as a successful registration.

use std::fmt;

/// One step of the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Register,
    Login,
}

/// Why the server refused a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The server doesn't know the command (no auth plugin, or a
    /// different syntax).
    InvalidCommand,
    InvalidPassword,
    NotRegistered,
}

/// What a chat line means for the step that is waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(Rejection),
}

const REGISTER_ACCEPTED: &[&str] = &[
    "successfully registered",
    "registered successfully",
    "already registered",
];

const REGISTER_REJECTED: &[(&str, Rejection)] =
    &[("invalid command", Rejection::InvalidCommand)];

const LOGIN_ACCEPTED: &[&str] = &[
    "successfully logged in",
    "logged in successfully",
    "login successful",
];

const LOGIN_REJECTED: &[(&str, Rejection)] = &[
    ("invalid password", Rejection::InvalidPassword),
    ("not registered", Rejection::NotRegistered),
];

impl Step {
    /// The chat command that performs this step.
    pub fn command(self, secret: &str) -> String {
        match self {
            Self::Register => format!("/register {secret} {secret}"),
            Self::Login => format!("/login {secret}"),
        }
    }

    /// Classifies a chat line, or returns `None` when the line says
    /// nothing decisive about this step.
    pub fn classify(self, message: &str) -> Option<Verdict> {
        let (accepted, rejected) = match self {
            Self::Register => (REGISTER_ACCEPTED, REGISTER_REJECTED),
            Self::Login => (LOGIN_ACCEPTED, LOGIN_REJECTED),
        };
        let lower = message.to_lowercase();

        if accepted.iter().any(|phrase| lower.contains(phrase)) {
            return Some(Verdict::Accepted);
        }
        rejected
            .iter()
            .find(|(phrase, _)| lower.contains(phrase))
            .map(|(_, rejection)| Verdict::Rejected(*rejection))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register => f.write_str("registration"),
            Self::Login => f.write_str("login"),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCommand => f.write_str("invalid command"),
            Self::InvalidPassword => f.write_str("invalid password"),
            Self::NotRegistered => f.write_str("not registered"),
        }
    }
}
