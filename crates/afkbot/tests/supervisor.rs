//! End-to-end tests for the supervisor and session loop.
//!
//! The bot talks to a [`MemoryConnector`]; each test plays the world
//! gateway on the other end, feeding JSON events and reading back the
//! commands the bot sends. Time is paused, so delays and timers elapse
//! as soon as both sides are idle.

use std::time::Duration;

use afkbot::prelude::*;
use afkbot_protocol::{
    BlockPos, Codec, Control, Goal, Position, WorldCommand, WorldEvent,
};
use afkbot_transport::{Connection, MemoryConnection};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout};

// =========================================================================
// Helpers
// =========================================================================

/// The gateway's end of one connection.
struct World {
    conn: MemoryConnection,
}

impl World {
    async fn accept(accepted: &mut mpsc::UnboundedReceiver<MemoryConnection>) -> Self {
        let conn = accepted.recv().await.expect("bot should connect");
        let world = Self { conn };
        assert!(matches!(world.next_command().await, WorldCommand::Join { .. }));
        world
    }

    async fn send(&self, event: WorldEvent) {
        let bytes = JsonCodec.encode(&event).unwrap();
        self.conn.send(&bytes).await.unwrap();
    }

    async fn spawn_at(&self, position: Position) {
        self.send(WorldEvent::Spawn {
            position,
            version: Some("1.20.1".into()),
        })
        .await;
    }

    async fn say(&self, message: &str) {
        self.send(WorldEvent::Chat {
            sender: "Server".into(),
            message: message.into(),
        })
        .await;
    }

    async fn try_next_command(&self) -> Option<WorldCommand> {
        let bytes = self.conn.recv().await.unwrap()?;
        Some(JsonCodec.decode(&bytes).unwrap())
    }

    async fn next_command(&self) -> WorldCommand {
        self.try_next_command()
            .await
            .expect("bot closed the connection")
    }

    /// Everything the bot sends until it closes the connection.
    async fn drain(&self) -> Vec<WorldCommand> {
        let mut commands = Vec::new();
        while let Some(cmd) = self.try_next_command().await {
            commands.push(cmd);
        }
        commands
    }
}

fn settings(json: serde_json::Value) -> Settings {
    serde_json::from_value(json).expect("valid settings")
}

fn start(
    settings: Settings,
) -> (JoinHandle<SessionEnd>, mpsc::UnboundedReceiver<MemoryConnection>) {
    let (connector, accepted) = MemoryConnector::new();
    let supervisor = Supervisor::new(connector, JsonCodec, settings);
    let handle = tokio::spawn(async move { supervisor.run().await });
    (handle, accepted)
}

fn origin() -> Position {
    Position::new(0.0, 64.0, 0.0)
}

// =========================================================================
// Connection lifecycle
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_join_carries_account_settings() {
    let (_bot, mut accepted) = start(settings(serde_json::json!({
        "bot-account": { "username": "Idler", "type": "offline" },
        "server": { "version": "1.20.1" }
    })));

    let conn = accepted.recv().await.unwrap();
    let world = World { conn };

    assert_eq!(
        world.next_command().await,
        WorldCommand::Join {
            username: "Idler".into(),
            password: None,
            auth: Default::default(),
            version: Some("1.20.1".into()),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_session_end_without_reconnect_stops_supervisor() {
    let (bot, mut accepted) = start(settings(serde_json::json!({})));
    let world = World::accept(&mut accepted).await;

    world
        .send(WorldEvent::SessionEnd {
            reason: Some("server closed".into()),
        })
        .await;

    assert_eq!(
        bot.await.unwrap(),
        SessionEnd::Ended {
            reason: Some("server closed".into())
        }
    );
    assert!(accepted.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_connection_ends_session() {
    let (bot, mut accepted) = start(settings(serde_json::json!({})));
    let world = World::accept(&mut accepted).await;

    drop(world);

    assert_eq!(bot.await.unwrap(), SessionEnd::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_happens_once_after_delay() {
    let (_bot, mut accepted) = start(settings(serde_json::json!({
        "utils": { "auto-reconnect": { "enabled": true, "delay": 5000 } }
    })));
    let first = World::accept(&mut accepted).await;
    first.spawn_at(origin()).await;

    let ended_at = Instant::now();
    first.send(WorldEvent::SessionEnd { reason: None }).await;
    // A second end event for the same session must not schedule another.
    let _ = first
        .conn
        .send(&JsonCodec.encode(&WorldEvent::SessionEnd { reason: None }).unwrap())
        .await;

    let second = World::accept(&mut accepted).await;
    assert!(ended_at.elapsed() >= Duration::from_millis(5000));

    // The new session is alive, so nothing else should connect.
    let extra = timeout(Duration::from_secs(60), accepted.recv()).await;
    assert!(extra.is_err(), "only one new session may be created");
    drop(second);
}

#[tokio::test(start_paused = true)]
async fn test_kicked_and_error_do_not_end_session() {
    let (_bot, mut accepted) = start(settings(serde_json::json!({
        "utils": {
            "anti-afk": { "enabled": true },
            "auto-reconnect": { "enabled": true, "delay": 1000 }
        }
    })));
    let world = World::accept(&mut accepted).await;

    world
        .send(WorldEvent::Kicked {
            reason: "idle too long".into(),
        })
        .await;
    world
        .send(WorldEvent::Error {
            message: "ECONNRESET".into(),
        })
        .await;
    world.spawn_at(origin()).await;

    // Still the same session: spawn wiring runs on this connection.
    assert_eq!(
        world.next_command().await,
        WorldCommand::SetControl {
            control: Control::Jump,
            active: true
        }
    );
    assert!(accepted.try_recv().is_err());
}

// =========================================================================
// Spawn wiring
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_spawn_wiring_runs_once_per_session() {
    let (bot, mut accepted) = start(settings(serde_json::json!({
        "utils": { "anti-afk": { "enabled": true, "sneak": true } }
    })));
    let world = World::accept(&mut accepted).await;

    world.spawn_at(origin()).await;
    world
        .send(WorldEvent::Death {
            position: Some(Position::new(3.0, 60.0, 3.0)),
        })
        .await;
    world.spawn_at(origin()).await;
    world.send(WorldEvent::SessionEnd { reason: None }).await;

    assert_eq!(
        world.drain().await,
        vec![
            WorldCommand::SetControl {
                control: Control::Jump,
                active: true
            },
            WorldCommand::SetControl {
                control: Control::Sneak,
                active: true
            },
        ]
    );
    bot.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_fixed_position_sets_exact_goal() {
    let (_bot, mut accepted) = start(settings(serde_json::json!({
        "position": { "enabled": true, "x": 10, "y": 64, "z": -3 }
    })));
    let world = World::accept(&mut accepted).await;

    world.spawn_at(origin()).await;

    assert!(matches!(
        world.next_command().await,
        WorldCommand::SetMovementProfile { .. }
    ));
    assert_eq!(
        world.next_command().await,
        WorldCommand::SetGoal {
            goal: Some(Goal::exact(BlockPos::new(10, 64, -3)))
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_chat_messages_said_once_in_order() {
    let (_bot, mut accepted) = start(settings(serde_json::json!({
        "utils": { "chat-messages": { "enabled": true, "messages": ["hello", "brb"] } }
    })));
    let world = World::accept(&mut accepted).await;

    world.spawn_at(origin()).await;

    assert_eq!(world.next_command().await, WorldCommand::chat("hello"));
    assert_eq!(world.next_command().await, WorldCommand::chat("brb"));
}

#[tokio::test(start_paused = true)]
async fn test_chat_messages_repeat_on_interval() {
    let (_bot, mut accepted) = start(settings(serde_json::json!({
        "utils": { "chat-messages": {
            "enabled": true, "repeat": true, "repeat-delay": 10, "messages": ["a", "b"]
        } }
    })));
    let world = World::accept(&mut accepted).await;
    world.spawn_at(origin()).await;
    let spawned_at = Instant::now();

    assert_eq!(world.next_command().await, WorldCommand::chat("a"));
    assert!(spawned_at.elapsed() >= Duration::from_secs(10));
    assert_eq!(world.next_command().await, WorldCommand::chat("b"));
    assert_eq!(world.next_command().await, WorldCommand::chat("a"));
    assert!(spawned_at.elapsed() >= Duration::from_secs(30));
}

// =========================================================================
// Auto-auth
// =========================================================================

fn auth_settings() -> Settings {
    settings(serde_json::json!({
        "utils": { "auto-auth": { "enabled": true, "password": "pw123" } }
    }))
}

#[tokio::test(start_paused = true)]
async fn test_already_registered_proceeds_to_login() {
    let (_bot, mut accepted) = start(auth_settings());
    let world = World::accept(&mut accepted).await;
    world.spawn_at(origin()).await;

    assert_eq!(
        world.next_command().await,
        WorldCommand::chat("/register pw123 pw123")
    );
    world.say("You were already registered").await;

    assert_eq!(world.next_command().await, WorldCommand::chat("/login pw123"));
}

#[tokio::test(start_paused = true)]
async fn test_register_failure_never_sends_login() {
    let (_bot, mut accepted) = start(auth_settings());
    let world = World::accept(&mut accepted).await;
    world.spawn_at(origin()).await;

    assert_eq!(
        world.next_command().await,
        WorldCommand::chat("/register pw123 pw123")
    );
    world.say("Unknown or invalid command.").await;

    let next = timeout(Duration::from_secs(60), world.next_command()).await;
    assert!(next.is_err(), "no login after a failed registration: {next:?}");
}

#[tokio::test(start_paused = true)]
async fn test_register_failure_in_chat_burst_never_sends_login() {
    let (_bot, mut accepted) = start(auth_settings());
    let world = World::accept(&mut accepted).await;
    world.spawn_at(origin()).await;

    assert_eq!(
        world.next_command().await,
        WorldCommand::chat("/register pw123 pw123")
    );
    world.say("Unknown or invalid command.").await;
    for i in 0..80 {
        world.say(&format!("<Steve> spam {i}")).await;
    }

    let next = timeout(Duration::from_secs(60), world.next_command()).await;
    assert!(next.is_err(), "no login after a failed registration: {next:?}");
}

#[tokio::test(start_paused = true)]
async fn test_silent_auth_plugin_logs_in_after_timeout() {
    let (_bot, mut accepted) = start(auth_settings());
    let world = World::accept(&mut accepted).await;
    world.spawn_at(origin()).await;
    let spawned_at = Instant::now();

    assert_eq!(
        world.next_command().await,
        WorldCommand::chat("/register pw123 pw123")
    );
    assert_eq!(world.next_command().await, WorldCommand::chat("/login pw123"));
    assert!(spawned_at.elapsed() >= Duration::from_secs(8));
}

// =========================================================================
// Wandering
// =========================================================================

fn wander_settings() -> Settings {
    settings(serde_json::json!({
        "utils": { "mob-movement": {
            "enabled": true, "radius": 8, "minDelaySeconds": 5, "maxDelaySeconds": 12
        } }
    }))
}

#[tokio::test(start_paused = true)]
async fn test_wander_goals_stay_within_radius() {
    let (_bot, mut accepted) = start(wander_settings());
    let world = World::accept(&mut accepted).await;
    world.spawn_at(origin()).await;

    let mut goals = 0;
    while goals < 15 {
        if let WorldCommand::SetGoal { goal: Some(goal) } =
            world.next_command().await
        {
            assert!(matches!(goal, Goal::Near { radius: 1, .. }));
            let BlockPos { x, y, z } = goal.target();
            assert!((-8..=8).contains(&x), "x={x}");
            assert!((-8..=8).contains(&z), "z={z}");
            assert_eq!(y, 64);
            goals += 1;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_session_end_stops_wandering() {
    let (bot, mut accepted) = start(wander_settings());
    let world = World::accept(&mut accepted).await;
    world.spawn_at(origin()).await;

    assert!(matches!(
        world.next_command().await,
        WorldCommand::SetMovementProfile { .. }
    ));
    world.send(WorldEvent::SessionEnd { reason: None }).await;

    let rest = world.drain().await;
    assert_eq!(
        rest[rest.len() - 2..],
        [WorldCommand::ClearControls, WorldCommand::SetGoal { goal: None }]
    );
    bot.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_huge_wander_timeout_keeps_session_alive() {
    let (bot, mut accepted) = start(settings(serde_json::json!({
        "utils": { "mob-movement": {
            "enabled": true, "wanderTimeoutSeconds": u64::MAX
        } }
    })));
    let world = World::accept(&mut accepted).await;
    world.spawn_at(origin()).await;

    assert!(matches!(
        world.next_command().await,
        WorldCommand::SetMovementProfile { .. }
    ));
    assert!(matches!(
        world.next_command().await,
        WorldCommand::SetGoal { goal: Some(_) }
    ));
    // Picks keep coming even though the target timeout can't be armed.
    let mut goals = 0;
    while goals < 3 {
        if let WorldCommand::SetGoal { goal: Some(_) } = world.next_command().await {
            goals += 1;
        }
    }
    assert!(!bot.is_finished());

    world.send(WorldEvent::SessionEnd { reason: None }).await;
    world.drain().await;
    assert!(matches!(bot.await, Ok(SessionEnd::Ended { .. })));
}
