//! Who currently owns the pathfinder goal.
//!
//! The pathfinder has a single goal slot. Two behaviors write to it: the
//! one-shot walk to a fixed position and the wander scheduler. Whoever
//! writes last wins; [`MovementSlot`] just makes that visible.

use std::fmt;

/// A behavior that sets pathfinder goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementIntent {
    FixedPosition,
    Wander,
}

impl fmt::Display for MovementIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FixedPosition => f.write_str("fixed-position"),
            Self::Wander => f.write_str("wander"),
        }
    }
}

#[derive(Debug, Default)]
pub struct MovementSlot {
    owner: Option<MovementIntent>,
}

impl MovementSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `intent` as the owner of the goal slot.
    ///
    /// Returns the previous owner. Taking the slot from a different
    /// intent is logged.
    pub fn claim(&mut self, intent: MovementIntent) -> Option<MovementIntent> {
        let previous = self.owner.replace(intent);
        match previous {
            Some(prev) if prev != intent => {
                tracing::warn!(
                    previous = %prev,
                    next = %intent,
                    "movement goal taken over by another behavior"
                );
            }
            _ => {}
        }
        previous
    }

    /// Clears the slot if `intent` owns it. Returns whether it did.
    pub fn release(&mut self, intent: MovementIntent) -> bool {
        if self.owner == Some(intent) {
            self.owner = None;
            true
        } else {
            false
        }
    }

    pub fn owner(&self) -> Option<MovementIntent> {
        self.owner
    }
}
