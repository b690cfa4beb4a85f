//! Randomized idle wandering for afkbot.
//!
//! Keeps the bot looking alive by walking to a random nearby block every
//! few seconds, with a bit of cosmetic jumping, walking and looking around
//! on top.
//!
//! # Timer slots, not tasks
//!
//! The scheduler never spawns anything and never suspends inside its entry
//! points. Every method returns the [`WorldCommand`]s to send *right now*
//! and records future work as deadlines in named slots:
//!
//! - `next_pick`: when to choose the next target.
//! - target deadline: when to give up on the current target.
//! - pulse releases: when to let go of a cosmetic jump or forward press.
//!
//! [`WanderScheduler::next_timer`] resolves when the earliest slot is due.
//! Cancelling a timer is just clearing its slot, which is why
//! [`WanderScheduler::stop`] can tear everything down synchronously.
//!
//! # Integration
//!
//! The scheduler is designed to sit inside a session's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         event = link.recv() => { /* handle world events */ }
//!         timer = wander.next_timer() => {
//!             for cmd in wander.on_timer(timer, position) {
//!                 link.send(&cmd).await?;
//!             }
//!         }
//!     }
//! }
//! ```

use std::f32::consts::PI;
use std::ops::RangeInclusive;
use std::time::Duration;

use afkbot_protocol::{
    BlockPos, Control, Goal, MovementProfile, Position, WorldCommand,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{self, Instant};
use tracing::{debug, info, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How long a cosmetic jump is held.
const JUMP_PULSE_MS: RangeInclusive<u64> = 300..=1000;

/// How long a cosmetic forward press is held.
const FORWARD_PULSE_MS: RangeInclusive<u64> = 500..=2300;

/// Pitch range for cosmetic look changes, in radians.
const LOOK_PITCH: f32 = 0.3;

/// Tolerance, in blocks, of every wander goal.
const TARGET_TOLERANCE: u32 = 1;

/// Full configuration for the wander scheduler.
#[derive(Debug, Clone)]
pub struct WanderConfig {
    /// Maximum horizontal offset of a target, in blocks, on each axis.
    pub radius: u32,
    /// Shortest gap between two picks.
    pub min_delay: Duration,
    /// Longest gap between two picks.
    pub max_delay: Duration,
    /// How long to chase one target before clearing the goal.
    pub wander_timeout: Duration,
    /// Probability (0.0–1.0) of a jump pulse on each pick.
    pub jump_chance: f64,
    /// Probability of a forward pulse on each pick.
    pub forward_chance: f64,
    /// Probability of a look change on each pick.
    pub look_chance: f64,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            radius: 8,
            min_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(12),
            wander_timeout: Duration::from_secs(20),
            jump_chance: 0.35,
            forward_chance: 0.6,
            look_chance: 0.7,
        }
    }
}

impl WanderConfig {
    /// Fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`WanderScheduler::new`]. Rules:
    /// - `min_delay` and `max_delay` are swapped if inverted.
    /// - Chances are clamped to `0.0..=1.0`.
    pub fn validated(mut self) -> Self {
        if self.min_delay > self.max_delay {
            warn!(
                min_ms = self.min_delay.as_millis() as u64,
                max_ms = self.max_delay.as_millis() as u64,
                "wander min_delay exceeds max_delay, swapping"
            );
            std::mem::swap(&mut self.min_delay, &mut self.max_delay);
        }
        self.jump_chance = clamp_chance(self.jump_chance);
        self.forward_chance = clamp_chance(self.forward_chance);
        self.look_chance = clamp_chance(self.look_chance);
        self
    }
}

fn clamp_chance(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

// ---------------------------------------------------------------------------
// Timers
// ---------------------------------------------------------------------------

/// Which slot fired, returned by [`WanderScheduler::next_timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WanderTimer {
    /// Time to choose the next target.
    Pick,
    /// The current target was not reached in time.
    TargetTimeout,
    /// A cosmetic pulse on this control is over.
    Release(Control),
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Picks random nearby targets and owns every wander-related timer.
///
/// One `WanderScheduler` per session. All state is mutated from the
/// session's event loop only.
pub struct WanderScheduler {
    config: WanderConfig,
    rng: StdRng,
    running: bool,
    profile: Option<MovementProfile>,
    /// Current target, while it has not been reached or timed out.
    target: Option<BlockPos>,
    next_pick: Option<Instant>,
    target_deadline: Option<Instant>,
    /// At most one entry per control.
    releases: Vec<(Control, Instant)>,
    picks: u64,
}

impl WanderScheduler {
    /// Create an idle scheduler. Nothing happens until [`start`](Self::start).
    pub fn new(config: WanderConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Create a scheduler whose random choices are reproducible.
    pub fn with_seed(config: WanderConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: WanderConfig, rng: StdRng) -> Self {
        let config = config.validated();
        debug!(
            radius = config.radius,
            min_delay_ms = config.min_delay.as_millis() as u64,
            max_delay_ms = config.max_delay.as_millis() as u64,
            "wander scheduler created"
        );
        Self {
            config,
            rng,
            running: false,
            profile: None,
            target: None,
            next_pick: None,
            target_deadline: None,
            releases: Vec::new(),
            picks: 0,
        }
    }

    /// Start wandering from `position`.
    ///
    /// Issues the first target immediately and arms the pick interval.
    /// Without a movement profile nothing is scheduled: the attempt is
    /// logged and not retried.
    ///
    /// Starting a running scheduler restarts it from scratch.
    pub fn start(
        &mut self,
        position: Position,
        profile: Option<&MovementProfile>,
    ) -> Vec<WorldCommand> {
        let Some(profile) = profile else {
            warn!("movement profile not available, wandering not started");
            return Vec::new();
        };

        if self.running {
            debug!("wander scheduler restarted");
            self.cancel_timers();
        }
        self.running = true;
        self.profile = Some(profile.clone());
        info!(radius = self.config.radius, "wandering started");

        self.pick(position)
    }

    /// Handle a timer returned by [`next_timer`](Self::next_timer).
    ///
    /// `position` is the bot's current position, used by picks.
    pub fn on_timer(
        &mut self,
        timer: WanderTimer,
        position: Position,
    ) -> Vec<WorldCommand> {
        if !self.running {
            return Vec::new();
        }

        match timer {
            WanderTimer::Pick => self.pick(position),
            WanderTimer::TargetTimeout => {
                info!(
                    block = ?self.target,
                    timeout_secs = self.config.wander_timeout.as_secs_f64(),
                    "wander target not reached in time, giving up"
                );
                self.target = None;
                self.target_deadline = None;
                self.releases.clear();
                vec![WorldCommand::SetGoal { goal: None }, WorldCommand::ClearControls]
            }
            WanderTimer::Release(control) => {
                let before = self.releases.len();
                self.releases.retain(|(c, _)| *c != control);
                if self.releases.len() == before {
                    return Vec::new();
                }
                trace!(%control, "cosmetic pulse released");
                vec![WorldCommand::SetControl {
                    control,
                    active: false,
                }]
            }
        }
    }

    /// The pathfinder reached its goal: cancel the per-target timeout.
    ///
    /// The pick interval keeps running.
    pub fn on_goal_reached(&mut self) {
        if self.target_deadline.take().is_some() {
            debug!(block = ?self.target, "wander target reached");
            self.target = None;
        }
    }

    /// Stop wandering.
    ///
    /// Cancels every timer. If the scheduler was running, returns the
    /// commands that release all controls and clear the goal. Safe to call
    /// any number of times, including before [`start`](Self::start).
    pub fn stop(&mut self) -> Vec<WorldCommand> {
        self.cancel_timers();
        if !self.running {
            return Vec::new();
        }
        self.running = false;
        info!(picks = self.picks, "wandering stopped");
        vec![WorldCommand::ClearControls, WorldCommand::SetGoal { goal: None }]
    }

    /// Wait until the earliest armed timer is due.
    ///
    /// With no timer armed this future pends forever, so `tokio::select!`
    /// keeps serving its other branches.
    pub async fn next_timer(&self) -> WanderTimer {
        match self.next_deadline() {
            Some((at, timer)) => {
                time::sleep_until(at).await;
                timer
            }
            None => std::future::pending().await,
        }
    }

    /// The earliest armed timer and its deadline.
    pub fn next_deadline(&self) -> Option<(Instant, WanderTimer)> {
        let pick = self.next_pick.map(|at| (at, WanderTimer::Pick));
        let timeout = self
            .target_deadline
            .map(|at| (at, WanderTimer::TargetTimeout));
        let releases = self
            .releases
            .iter()
            .map(|&(control, at)| (at, WanderTimer::Release(control)));

        pick.into_iter()
            .chain(timeout)
            .chain(releases)
            .min_by_key(|(at, _)| *at)
    }

    /// Whether [`start`](Self::start) succeeded and [`stop`](Self::stop)
    /// hasn't been called since.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The target currently being walked to.
    pub fn target(&self) -> Option<BlockPos> {
        self.target
    }

    /// Number of armed timer slots.
    pub fn pending_timers(&self) -> usize {
        usize::from(self.next_pick.is_some())
            + usize::from(self.target_deadline.is_some())
            + self.releases.len()
    }

    /// Total picks since creation.
    pub fn picks(&self) -> u64 {
        self.picks
    }

    /// The active configuration.
    pub fn config(&self) -> &WanderConfig {
        &self.config
    }

    fn cancel_timers(&mut self) {
        self.next_pick = None;
        self.target_deadline = None;
        self.releases.clear();
        self.target = None;
    }

    /// Choose a target near `position`, schedule its timeout and the next
    /// pick, and roll the cosmetic actions.
    fn pick(&mut self, position: Position) -> Vec<WorldCommand> {
        let now = Instant::now();
        let radius = f64::from(self.config.radius);
        let dx = self.rng.random_range(-radius..=radius);
        let dz = self.rng.random_range(-radius..=radius);
        let target = BlockPos::new(
            (position.x + dx).floor() as i32,
            position.y.floor() as i32,
            (position.z + dz).floor() as i32,
        );

        let mut commands = Vec::with_capacity(5);
        if let Some(profile) = &self.profile {
            commands.push(WorldCommand::SetMovementProfile {
                profile: profile.clone(),
            });
        }
        commands.push(WorldCommand::SetGoal {
            goal: Some(Goal::near(target, TARGET_TOLERANCE)),
        });

        self.picks += 1;
        self.target = Some(target);
        self.target_deadline =
            deadline_after(now, self.config.wander_timeout, "target timeout");
        let delay = self.random_delay();
        self.next_pick = deadline_after(now, delay, "next pick");

        debug!(
            pick = self.picks,
            block = %target,
            next_pick_ms = millis(delay),
            "wander target chosen"
        );

        if self.rng.random_bool(self.config.jump_chance) {
            commands.push(self.pulse(now, Control::Jump, JUMP_PULSE_MS));
        }
        if self.rng.random_bool(self.config.forward_chance) {
            commands.push(self.pulse(now, Control::Forward, FORWARD_PULSE_MS));
        }
        if self.rng.random_bool(self.config.look_chance) {
            commands.push(WorldCommand::Look {
                yaw: self.rng.random_range(-PI..PI),
                pitch: self.rng.random_range(-LOOK_PITCH..LOOK_PITCH),
            });
        }

        commands
    }

    /// Press `control` now and arm its release. A press that is already
    /// pending gets the new release time.
    fn pulse(
        &mut self,
        now: Instant,
        control: Control,
        hold_ms: RangeInclusive<u64>,
    ) -> WorldCommand {
        let hold = Duration::from_millis(self.rng.random_range(hold_ms));
        self.releases.retain(|(c, _)| *c != control);
        self.releases.push((control, now + hold));
        WorldCommand::SetControl {
            control,
            active: true,
        }
    }

    fn random_delay(&mut self) -> Duration {
        let min = millis(self.config.min_delay);
        let max = millis(self.config.max_delay);
        Duration::from_millis(self.rng.random_range(min..=max))
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// `now + delay`, or `None` (the slot stays unarmed) if that instant can't
/// be represented.
fn deadline_after(
    now: Instant,
    delay: Duration,
    slot: &'static str,
) -> Option<Instant> {
    let deadline = now.checked_add(delay);
    if deadline.is_none() {
        warn!(
            slot,
            delay_secs = delay.as_secs(),
            "wander delay out of range, timer not armed"
        );
    }
    deadline
}
