//! Error types for the auth handshake.

use crate::{Rejection, Step};

/// Errors that end a handshake.
///
/// A timeout is NOT an error: a step that hears nothing decisive within
/// its reply window is assumed to have succeeded (see
/// [`StepOutcome::Assumed`](crate::StepOutcome::Assumed)).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The configured secret was empty. Checked before anything is sent.
    #[error("auth secret must not be empty")]
    EmptySecret,

    /// The server answered a step with a failure phrase.
    #[error("{step} failed: {rejection}. Message: {message:?}")]
    Rejected {
        step: Step,
        rejection: Rejection,
        /// The chat line that carried the failure phrase.
        message: String,
    },

    /// The session stopped delivering chat while a step was waiting.
    #[error("chat stream closed while waiting for {0} reply")]
    ChatClosed(Step),

    /// The session stopped accepting outbound commands.
    #[error("connection gone before {0} command could be sent")]
    Disconnected(Step),
}
