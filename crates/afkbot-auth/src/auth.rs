//! The register-then-login handshake, driven entirely over chat.
//!
//! Servers without online-mode accounts usually run an auth plugin that
//! freezes new players until they type `/register <pw> <pw>` and then
//! `/login <pw>`. The plugin answers in ordinary chat, so the bot has to:
//!
//! 1. Listen to chat (a [`ChatFeed`] carrying all other traffic too).
//! 2. Send exactly one command for the current step.
//! 3. Settle on the FIRST of: a success phrase, a failure phrase, or the
//!    reply window running out.
//!
//! # Fail open
//!
//! Plugins word their replies differently, and some say nothing at all.
//! A step that hears nothing decisive within [`REPLY_TIMEOUT`] is treated
//! as a success ([`StepOutcome::Assumed`]) so the bot never hangs on an
//! unrecognised plugin. Only an explicit failure phrase fails a step.
//!
//! # Subscription lifetime
//!
//! Each step subscribes to the feed and drops its receiver before the
//! step returns, whichever way it settles. Nothing accumulates across
//! steps or across reconnects. The receiver is unbounded, so however much
//! chat arrives before the step is polled again, no line is skipped.

use std::time::Duration;

use afkbot_protocol::{ChatLine, WorldCommand};
use tokio::sync::{mpsc, watch};

use crate::{AuthError, AuthState, ChatFeed, Step, Verdict};

/// How long a step waits for a decisive reply before assuming success.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(8);

/// How a step succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The server sent a success phrase.
    Confirmed,
    /// Nothing decisive arrived within the reply window.
    Assumed,
}

/// Result of a completed handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthOutcome {
    pub register: StepOutcome,
    pub login: StepOutcome,
}

/// Drives the handshake for one session.
///
/// The handshake doesn't own the connection. It talks to the session
/// through two channels:
///
/// - `chat`: the session publishes every incoming chat line here.
/// - `outbox`: the handshake queues its commands here; the session
///   forwards them to the world.
///
/// Progress is published on a `watch` channel so the session (or a test)
/// can read the current [`AuthState`] at any time.
pub struct AuthHandshake {
    secret: String,
    chat: ChatFeed,
    outbox: mpsc::UnboundedSender<WorldCommand>,
    state: watch::Sender<AuthState>,
    reply_timeout: Duration,
}

impl AuthHandshake {
    /// Creates a handshake for `secret`.
    ///
    /// # Errors
    /// Returns [`AuthError::EmptySecret`] if the secret is empty.
    pub fn new(
        secret: impl Into<String>,
        chat: ChatFeed,
        outbox: mpsc::UnboundedSender<WorldCommand>,
    ) -> Result<Self, AuthError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AuthError::EmptySecret);
        }
        let (state, _) = watch::channel(AuthState::Idle);
        Ok(Self {
            secret,
            chat,
            outbox,
            state,
            reply_timeout: REPLY_TIMEOUT,
        })
    }

    /// Overrides the per-step reply window.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Returns a receiver that always holds the latest [`AuthState`].
    pub fn subscribe_state(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Sends `/register` and waits for the server's answer.
    pub async fn register(&self) -> Result<StepOutcome, AuthError> {
        self.step(Step::Register).await
    }

    /// Sends `/login` and waits for the server's answer.
    pub async fn login(&self) -> Result<StepOutcome, AuthError> {
        self.step(Step::Login).await
    }

    /// Runs register, then login.
    ///
    /// Login is only attempted after registration settles successfully. A
    /// failed registration ends the handshake without a login command.
    pub async fn run(self) -> Result<AuthOutcome, AuthError> {
        self.state.send_replace(AuthState::AwaitingRegisterReply);
        let register = match self.register().await {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(e)),
        };

        self.state.send_replace(AuthState::AwaitingLoginReply);
        let login = match self.login().await {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(e)),
        };

        self.state.send_replace(AuthState::Authenticated);
        Ok(AuthOutcome { register, login })
    }

    fn fail(&self, error: AuthError) -> AuthError {
        self.state.send_replace(AuthState::Failed(error.to_string()));
        error
    }

    /// One step: subscribe, send, wait for the first decisive line or the
    /// reply window, unsubscribe.
    async fn step(&self, step: Step) -> Result<StepOutcome, AuthError> {
        // Subscribe BEFORE sending, so a fast reply can't slip past us.
        let mut replies = self.chat.subscribe();

        self.outbox
            .send(WorldCommand::chat(step.command(&self.secret)))
            .map_err(|_| AuthError::Disconnected(step))?;
        tracing::info!(%step, "sent auth command");

        let decision = tokio::time::timeout(
            self.reply_timeout,
            wait_for_verdict(&mut replies, step),
        )
        .await;

        // Unsubscribe before the step settles, whatever the outcome.
        drop(replies);

        match decision {
            Ok(Ok((Verdict::Accepted, _))) => {
                tracing::info!(%step, "server confirmed auth step");
                Ok(StepOutcome::Confirmed)
            }
            Ok(Ok((Verdict::Rejected(rejection), message))) => {
                Err(AuthError::Rejected {
                    step,
                    rejection,
                    message,
                })
            }
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => {
                tracing::warn!(
                    %step,
                    timeout_secs = self.reply_timeout.as_secs_f64(),
                    "no recognised reply, assuming success"
                );
                Ok(StepOutcome::Assumed)
            }
        }
    }
}

/// Reads chat until a line is decisive for `step`.
///
/// Returns the verdict together with the line that produced it.
async fn wait_for_verdict(
    replies: &mut mpsc::UnboundedReceiver<ChatLine>,
    step: Step,
) -> Result<(Verdict, String), AuthError> {
    while let Some(line) = replies.recv().await {
        tracing::trace!(%step, %line, "checking chat for auth reply");
        if let Some(verdict) = step.classify(&line.message) {
            return Ok((verdict, line.message));
        }
    }
    Err(AuthError::ChatClosed(step))
}
