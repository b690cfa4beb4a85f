//! Integration tests for the chat-driven auth handshake.
//!
//! Each test plays the server: it reads the commands the handshake queues
//! on its outbox and answers on the shared chat feed. Time is paused,
//! so the 8-second reply window elapses instantly when nothing else can
//! make progress.

use afkbot_auth::{
    AuthError, AuthHandshake, AuthState, ChatFeed, REPLY_TIMEOUT, Rejection,
    Step, StepOutcome,
};
use afkbot_protocol::{ChatLine, WorldCommand};
use tokio::sync::mpsc;
use tokio::time::Instant;

// =========================================================================
// Helpers
// =========================================================================

fn harness(
    secret: &str,
) -> (
    AuthHandshake,
    ChatFeed,
    mpsc::UnboundedReceiver<WorldCommand>,
) {
    let chat = ChatFeed::new();
    let (outbox, commands) = mpsc::unbounded_channel();
    let handshake = AuthHandshake::new(secret, chat.clone(), outbox)
        .expect("secret is not empty");
    (handshake, chat, commands)
}

fn say(chat: &ChatFeed, message: &str) {
    let delivered = chat.publish(ChatLine {
        sender: "Server".into(),
        message: message.into(),
    });
    assert!(delivered > 0, "a step should be listening");
}

// =========================================================================
// Construction
// =========================================================================

#[test]
fn test_new_empty_secret_is_rejected() {
    let (outbox, _commands) = mpsc::unbounded_channel();

    let result = AuthHandshake::new("", ChatFeed::new(), outbox);

    assert!(matches!(result, Err(AuthError::EmptySecret)));
}

#[test]
fn test_new_handshake_starts_idle() {
    let (handshake, _chat, _commands) = harness("pw123");
    assert_eq!(*handshake.subscribe_state().borrow(), AuthState::Idle);
}

// =========================================================================
// Single steps
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_register_success_phrase_confirms() {
    let (handshake, chat, mut commands) = harness("pw123");
    let task = tokio::spawn(async move { handshake.register().await });

    let cmd = commands.recv().await.unwrap();
    assert_eq!(cmd, WorldCommand::chat("/register pw123 pw123"));
    say(&chat, "You have successfully registered!");

    assert_eq!(task.await.unwrap().unwrap(), StepOutcome::Confirmed);
}

#[tokio::test(start_paused = true)]
async fn test_register_without_reply_fails_open_after_timeout() {
    let (handshake, _chat, mut commands) = harness("pw123");
    let start = Instant::now();
    let task = tokio::spawn(async move { handshake.register().await });

    commands.recv().await.unwrap();

    assert_eq!(task.await.unwrap().unwrap(), StepOutcome::Assumed);
    assert!(start.elapsed() >= REPLY_TIMEOUT);
}

#[tokio::test(start_paused = true)]
async fn test_login_ignores_unrelated_chat() {
    let (handshake, chat, mut commands) = harness("pw123");
    let task = tokio::spawn(async move { handshake.login().await });

    assert_eq!(
        commands.recv().await.unwrap(),
        WorldCommand::chat("/login pw123")
    );
    say(&chat, "Steve joined the game");
    say(&chat, "<Alex> anyone got iron?");
    say(&chat, "Logged in successfully.");

    assert_eq!(task.await.unwrap().unwrap(), StepOutcome::Confirmed);
}

#[tokio::test(start_paused = true)]
async fn test_login_failure_phrase_settles_immediately() {
    let (handshake, chat, mut commands) = harness("pw123");
    let start = Instant::now();
    let task = tokio::spawn(async move { handshake.login().await });

    commands.recv().await.unwrap();
    say(&chat, "Invalid password!");

    let result = task.await.unwrap();
    assert!(matches!(
        result,
        Err(AuthError::Rejected {
            step: Step::Login,
            rejection: Rejection::InvalidPassword,
            ..
        })
    ));
    // Failure does not wait out the reply window.
    assert!(start.elapsed() < REPLY_TIMEOUT);
}

#[tokio::test(start_paused = true)]
async fn test_step_holds_one_subscription_and_releases_it() {
    let (handshake, chat, mut commands) = harness("pw123");
    assert_eq!(chat.subscriber_count(), 0);

    let task = tokio::spawn(async move { handshake.register().await });
    commands.recv().await.unwrap();
    assert_eq!(chat.subscriber_count(), 1);

    say(&chat, "Unknown or invalid command");
    let _ = task.await.unwrap();
    assert_eq!(chat.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_subscription_released_after_timeout() {
    let (handshake, chat, mut commands) = harness("pw123");
    let task = tokio::spawn(async move { handshake.register().await });

    commands.recv().await.unwrap();
    task.await.unwrap().unwrap();

    assert_eq!(chat.subscriber_count(), 0);
}

#[tokio::test]
async fn test_step_without_session_returns_disconnected() {
    let (handshake, _chat, commands) = harness("pw123");
    drop(commands);

    let result = handshake.register().await;

    assert!(matches!(result, Err(AuthError::Disconnected(Step::Register))));
}

// =========================================================================
// Full sequence
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_run_already_registered_proceeds_to_login() {
    let (handshake, chat, mut commands) = harness("pw123");
    let state = handshake.subscribe_state();
    let task = tokio::spawn(handshake.run());

    assert_eq!(
        commands.recv().await.unwrap(),
        WorldCommand::chat("/register pw123 pw123")
    );
    assert_eq!(*state.borrow(), AuthState::AwaitingRegisterReply);
    say(&chat, "You were already registered");

    assert_eq!(
        commands.recv().await.unwrap(),
        WorldCommand::chat("/login pw123")
    );
    assert_eq!(*state.borrow(), AuthState::AwaitingLoginReply);
    say(&chat, "Successfully logged in");

    let outcome = task.await.unwrap().unwrap();
    assert_eq!(outcome.register, StepOutcome::Confirmed);
    assert_eq!(outcome.login, StepOutcome::Confirmed);
    assert_eq!(*state.borrow(), AuthState::Authenticated);
}

#[tokio::test(start_paused = true)]
async fn test_run_register_failure_never_sends_login() {
    let (handshake, chat, mut commands) = harness("pw123");
    let state = handshake.subscribe_state();
    let task = tokio::spawn(handshake.run());

    commands.recv().await.unwrap();
    say(&chat, "Invalid command. Use /help");

    let result = task.await.unwrap();
    assert!(matches!(
        result,
        Err(AuthError::Rejected {
            step: Step::Register,
            rejection: Rejection::InvalidCommand,
            ..
        })
    ));

    // The handshake task is finished; nothing else can ever be queued.
    assert!(commands.recv().await.is_none());
    assert!(matches!(&*state.borrow(), AuthState::Failed(reason) if reason.contains("invalid command")));
}

#[tokio::test(start_paused = true)]
async fn test_register_failure_survives_chat_burst() {
    let (handshake, chat, mut commands) = harness("pw123");
    let task = tokio::spawn(handshake.run());

    assert_eq!(
        commands.recv().await.unwrap(),
        WorldCommand::chat("/register pw123 pw123")
    );
    // The whole burst lands before the handshake task is polled again.
    say(&chat, "Unknown or invalid command.");
    for i in 0..80 {
        say(&chat, &format!("<Steve> spam {i}"));
    }

    let result = task.await.unwrap();
    assert!(matches!(
        result,
        Err(AuthError::Rejected {
            step: Step::Register,
            rejection: Rejection::InvalidCommand,
            ..
        })
    ));
    assert!(commands.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_run_silent_server_authenticates_after_two_timeouts() {
    let (handshake, _chat, mut commands) = harness("pw123");
    let state = handshake.subscribe_state();
    let start = Instant::now();
    let task = tokio::spawn(handshake.run());

    commands.recv().await.unwrap();
    commands.recv().await.unwrap();

    let outcome = task.await.unwrap().unwrap();
    assert_eq!(outcome.register, StepOutcome::Assumed);
    assert_eq!(outcome.login, StepOutcome::Assumed);
    assert!(start.elapsed() >= REPLY_TIMEOUT * 2);
    assert!(state.borrow().is_terminal());
}

#[tokio::test(start_paused = true)]
async fn test_run_login_rejected_marks_failed() {
    let (handshake, chat, mut commands) = harness("pw123");
    let state = handshake.subscribe_state();
    let task = tokio::spawn(handshake.run());

    commands.recv().await.unwrap();
    say(&chat, "Successfully registered");
    commands.recv().await.unwrap();
    say(&chat, "You are not registered!");

    let result = task.await.unwrap();
    assert!(matches!(
        result,
        Err(AuthError::Rejected {
            rejection: Rejection::NotRegistered,
            ..
        })
    ));
    assert!(matches!(&*state.borrow(), AuthState::Failed(_)));
}
