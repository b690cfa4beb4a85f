//! One session: a single world connection and everything hanging off it.
//!
//! Each session runs one event loop that owns all coordination state. The
//! loop waits on five sources at once, polled in this order:
//!
//!   1. Commands queued by the auth handshake
//!   2. The auth handshake itself
//!   3. World events from the connection
//!   4. The wander scheduler's earliest timer
//!   5. The chat script's repeat timer
//!
//! The handshake comes before world events so a busy connection can't
//! starve it. Chat is handed to the handshake through a [`ChatFeed`] as
//! each event is decoded, so its replies queue up losslessly either way.
//!
//! Nothing is shared with other sessions. When the loop exits, every timer
//! is cancelled and the handshake (with its chat subscription) is dropped,
//! so a reconnect always starts from a clean slate.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use afkbot_auth::{AuthError, AuthHandshake, AuthOutcome, AuthState, ChatFeed};
use afkbot_protocol::{
    ChatLine, Codec, Control, Goal, MovementProfile, Position, WorldCommand,
    WorldEvent,
};
use afkbot_transport::Connection;
use afkbot_wander::WanderScheduler;
use tokio::sync::{mpsc, watch};

use crate::chat_script::ChatScript;
use crate::config::Settings;
use crate::movement::{MovementIntent, MovementSlot};
use crate::world::WorldLink;
use crate::AfkError;

type AuthTask =
    Pin<Box<dyn Future<Output = Result<AuthOutcome, AuthError>> + Send>>;

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The world reported the session over.
    Ended { reason: Option<String> },
    /// The connection closed without saying why.
    Closed,
    /// Connecting, sending or receiving failed.
    Failed(String),
}

pub struct Session<K: Connection, C: Codec> {
    link: WorldLink<K, C>,
    settings: Arc<Settings>,
    /// Every incoming chat line is published here.
    chat: ChatFeed,
    outbox_tx: mpsc::UnboundedSender<WorldCommand>,
    outbox: mpsc::UnboundedReceiver<WorldCommand>,
    auth: Option<AuthTask>,
    /// Current auth progress; `None` until a handshake starts.
    auth_state: Option<watch::Receiver<AuthState>>,
    wander: WanderScheduler,
    script: ChatScript,
    movement: MovementSlot,
    profile: Option<MovementProfile>,
    position: Position,
    spawned: bool,
}

impl<K: Connection, C: Codec> Session<K, C> {
    pub fn new(link: WorldLink<K, C>, settings: Arc<Settings>) -> Self {
        let (outbox_tx, outbox) = mpsc::unbounded_channel();
        let wander =
            WanderScheduler::new(settings.utils.mob_movement.wander_config());
        let script = ChatScript::new(&settings.utils.chat_messages);
        Self {
            link,
            settings,
            chat: ChatFeed::new(),
            outbox_tx,
            outbox,
            auth: None,
            auth_state: None,
            wander,
            script,
            movement: MovementSlot::new(),
            profile: None,
            position: Position::new(0.0, 0.0, 0.0),
            spawned: false,
        }
    }

    /// Runs the session until the connection ends, then tears it down.
    pub async fn run(mut self) -> SessionEnd {
        let conn = self.link.id();
        tracing::debug!(%conn, "session started");

        let end = loop {
            match self.step().await {
                Ok(None) => continue,
                Ok(Some(end)) => break end,
                Err(e) => break SessionEnd::Failed(e.to_string()),
            }
        };

        self.teardown().await;
        tracing::info!(%conn, ?end, "session ended");
        end
    }

    /// Waits for the next thing to happen and handles it.
    async fn step(&mut self) -> Result<Option<SessionEnd>, AfkError> {
        tokio::select! {
            biased;

            Some(command) = self.outbox.recv() => {
                self.link.send(&command).await?;
            }

            result = poll_auth(&mut self.auth) => {
                self.auth = None;
                self.on_auth_finished(result);
            }

            event = self.link.recv() => match event? {
                Some(event) => return self.on_event(event).await,
                None => return Ok(Some(SessionEnd::Closed)),
            },

            timer = self.wander.next_timer() => {
                let commands = self.wander.on_timer(timer, self.position);
                self.send_wander(commands).await?;
            }

            () = self.script.next_due() => {
                if let Some(command) = self.script.on_due() {
                    self.link.send(&command).await?;
                }
            }
        }
        Ok(None)
    }

    async fn on_event(
        &mut self,
        event: WorldEvent,
    ) -> Result<Option<SessionEnd>, AfkError> {
        let conn = self.link.id();
        match event {
            WorldEvent::Spawn { position, version } => {
                self.position = position;
                if self.spawned {
                    tracing::debug!(%conn, %position, "respawned");
                } else {
                    self.spawned = true;
                    tracing::info!(%conn, %position, "spawned");
                    self.on_first_spawn(version).await?;
                }
            }
            WorldEvent::Chat { sender, message } => {
                let line = ChatLine { sender, message };
                tracing::info!(%conn, %line, "chat");
                // No subscribers is normal outside of an auth step.
                self.chat.publish(line);
            }
            WorldEvent::Moved { position } => {
                self.position = position;
            }
            WorldEvent::GoalReached { position } => {
                self.position = position;
                tracing::info!(%conn, %position, "goal reached");
                match self.movement.owner() {
                    Some(MovementIntent::Wander) => {
                        self.wander.on_goal_reached();
                        self.movement.release(MovementIntent::Wander);
                    }
                    Some(MovementIntent::FixedPosition) => {
                        self.movement.release(MovementIntent::FixedPosition);
                    }
                    None => {}
                }
            }
            WorldEvent::Death { position } => {
                if let Some(position) = position {
                    self.position = position;
                }
                tracing::info!(
                    %conn,
                    position = %self.position,
                    "died and respawned"
                );
            }
            WorldEvent::Kicked { reason } => {
                tracing::info!(%conn, %reason, "kicked from server");
            }
            WorldEvent::Error { message } => {
                tracing::info!(%conn, error = %message, "world client error");
            }
            WorldEvent::SessionEnd { reason } => {
                return Ok(Some(SessionEnd::Ended { reason }));
            }
        }
        Ok(None)
    }

    /// Spawn wiring. Runs once per session, in this order: auth, chat
    /// script, fixed position, wandering, anti-afk.
    async fn on_first_spawn(
        &mut self,
        version: Option<String>,
    ) -> Result<(), AfkError> {
        let conn = self.link.id();
        let settings = Arc::clone(&self.settings);
        let utils = &settings.utils;

        self.profile = version
            .or_else(|| settings.server.version.clone())
            .map(MovementProfile::for_version);
        if self.profile.is_none() {
            tracing::warn!(%conn, "game version unknown, no movement profile");
        }

        if utils.auto_auth.enabled {
            match AuthHandshake::new(
                utils.auto_auth.password.as_str(),
                self.chat.clone(),
                self.outbox_tx.clone(),
            ) {
                Ok(handshake) => {
                    tracing::info!(%conn, "started auto-auth");
                    self.auth_state = Some(handshake.subscribe_state());
                    self.auth = Some(Box::pin(handshake.run()));
                }
                Err(e) => {
                    tracing::error!(%conn, error = %e, "handshake failed");
                }
            }
        }

        if utils.chat_messages.enabled {
            tracing::info!(%conn, "started chat messages");
            for command in self.script.start() {
                self.link.send(&command).await?;
            }
        }

        if settings.position.enabled {
            let target = settings.position.block();
            match self.profile.clone() {
                Some(profile) => {
                    tracing::info!(%conn, %target, "moving to fixed position");
                    self.movement.claim(MovementIntent::FixedPosition);
                    self.link
                        .send(&WorldCommand::SetMovementProfile { profile })
                        .await?;
                    self.link
                        .send(&WorldCommand::SetGoal {
                            goal: Some(Goal::exact(target)),
                        })
                        .await?;
                }
                None => {
                    tracing::warn!(
                        %conn,
                        %target,
                        "no movement profile, fixed position skipped"
                    );
                }
            }
        }

        if utils.mob_movement.enabled {
            let commands =
                self.wander.start(self.position, self.profile.as_ref());
            self.send_wander(commands).await?;
        }

        if utils.anti_afk.enabled {
            self.link
                .send(&WorldCommand::SetControl {
                    control: Control::Jump,
                    active: true,
                })
                .await?;
            if utils.anti_afk.sneak {
                self.link
                    .send(&WorldCommand::SetControl {
                        control: Control::Sneak,
                        active: true,
                    })
                    .await?;
            }
        }

        Ok(())
    }

    fn on_auth_finished(&self, result: Result<AuthOutcome, AuthError>) {
        let conn = self.link.id();
        let state = self.auth_state().unwrap_or(AuthState::Idle);
        match result {
            Ok(outcome) => tracing::info!(
                %conn,
                %state,
                register = ?outcome.register,
                login = ?outcome.login,
                "auto-auth finished"
            ),
            Err(e) => {
                tracing::error!(%conn, %state, error = %e, "handshake failed");
            }
        }
    }

    /// Latest auth progress, if a handshake was started this session.
    pub fn auth_state(&self) -> Option<AuthState> {
        self.auth_state.as_ref().map(|rx| rx.borrow().clone())
    }

    /// Sends wander commands, keeping the movement slot in sync with the
    /// goals they set.
    async fn send_wander(
        &mut self,
        commands: Vec<WorldCommand>,
    ) -> Result<(), AfkError> {
        for command in &commands {
            if let WorldCommand::SetGoal { goal } = command {
                if goal.is_some() {
                    self.movement.claim(MovementIntent::Wander);
                } else {
                    self.movement.release(MovementIntent::Wander);
                }
            }
            self.link.send(command).await?;
        }
        Ok(())
    }

    async fn teardown(&mut self) {
        let conn = self.link.id();
        self.script.stop();
        if let Some(state) = self.auth_state() {
            if !state.is_terminal() {
                tracing::info!(%conn, %state, "abandoning unfinished auto-auth");
            }
        }
        // Dropping the handshake drops its chat subscription too.
        self.auth = None;

        for command in self.wander.stop() {
            if let Err(e) = self.link.send(&command).await {
                tracing::debug!(%conn, error = %e, "release not delivered");
                break;
            }
        }
        if let Err(e) = self.link.close().await {
            tracing::debug!(%conn, error = %e, "close failed");
        }
    }
}

/// Resolves with the handshake result, or never if no handshake runs.
async fn poll_auth(
    task: &mut Option<AuthTask>,
) -> Result<AuthOutcome, AuthError> {
    match task {
        Some(task) => task.await,
        None => std::future::pending().await,
    }
}
