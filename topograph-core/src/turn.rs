//! Turn Coordinator
//!
//! The update manager and the layout manager alternate strict turns over
//! the model: deltas are only applied while no layout computation is
//! running, and a layout only starts while no delta batch is draining.
//! Rather than two independently-flipped pause flags, the exclusion is a
//! single two-state coordinator, so "never mutate a scope mid-layout"
//! holds by construction: there is no state in which both sides believe
//! they may proceed.
//!
//! Scheduling is single-threaded and cooperative; the coordinator is a
//! logical turn marker, not a lock.

use tracing::trace;

/// Whose turn it is to touch the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Turn {
    /// Deltas may be applied; a layout may be started.
    #[default]
    Update,
    /// A layout computation is running; deltas queue up.
    Layout,
}

/// Guards the alternation between delta application and layout execution.
#[derive(Debug, Default)]
pub struct TurnCoordinator {
    turn: Turn,
}

impl TurnCoordinator {
    /// Start in the update turn: an empty graph has nothing to lay out.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current turn.
    pub fn current(&self) -> Turn {
        self.turn
    }

    /// Whether deltas may be applied right now.
    pub fn is_update(&self) -> bool {
        self.turn == Turn::Update
    }

    /// Claim the layout turn. Returns false (and changes nothing) if a
    /// layout already holds it.
    pub fn begin_layout(&mut self) -> bool {
        if self.turn == Turn::Layout {
            return false;
        }
        trace!("turn: update -> layout");
        self.turn = Turn::Layout;
        true
    }

    /// Release the layout turn after a computation completes (or is
    /// abandoned because its scope vanished).
    pub fn end_layout(&mut self) {
        if self.turn == Turn::Layout {
            trace!("turn: layout -> update");
        }
        self.turn = Turn::Update;
    }
}
