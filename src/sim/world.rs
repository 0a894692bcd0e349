/// WorldState: the complete snapshot of one dig session.
///
/// The renderer reads it every frame; `sim::step` is the only writer.
///
/// ## Turn lock
///
/// `phase` is `Idle` between actions. Move and Dig flip it to `Moving` /
/// `Digging` immediately and schedule a timer that flips it back, so at most
/// one action is in flight. Inputs arriving while locked are dropped.
///
/// ## Sessions
///
/// `session` is bumped by every reset. Timers are tagged with the session
/// that scheduled them and never fire into a later one.

use crate::config::{BoardConfig, TimingConfig};
use crate::domain::grid::{Cell, Grid, Position};
use crate::domain::treasure::TreasureKind;
use super::schedule::{Scheduler, SessionId};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TurnPhase {
    #[default]
    Idle,
    Moving,
    Digging,
}

/// Discovered kinds in discovery order, no duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FoundTreasures {
    kinds: Vec<TreasureKind>,
}

impl FoundTreasures {
    pub fn new() -> Self {
        FoundTreasures::default()
    }

    /// Record a kind. Returns false if it was already found.
    pub fn insert(&mut self, kind: TreasureKind) -> bool {
        if self.contains(kind) {
            return false;
        }
        self.kinds.push(kind);
        true
    }

    pub fn contains(&self, kind: TreasureKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TreasureKind> + '_ {
        self.kinds.iter().copied()
    }

    pub fn clear(&mut self) {
        self.kinds.clear();
    }
}

pub struct WorldState {
    // ── Board ──
    pub grid: Grid,
    pub position: Position,

    // ── Progress ──
    pub found: FoundTreasures,
    /// Distinct kinds buried this session; reaching it wins.
    pub treasure_goal: usize,
    pub game_over: bool,

    // ── Turn lock ──
    pub phase: TurnPhase,
    pub digging_cell: Option<usize>,

    // ── UI ──
    pub message: String,
    pub message_serial: u64,

    // ── Timing ──
    pub session: SessionId,
    /// Last time passed to `step::advance`, in ms.
    pub clock_ms: u64,
    pub timers: Scheduler,

    // ── Config ──
    pub board: BoardConfig,
    pub timing: TimingConfig,
}

impl WorldState {
    /// An empty world with no session yet. Call `step::reset` to deal a board.
    pub fn new(board: BoardConfig, timing: TimingConfig) -> Self {
        WorldState {
            grid: Grid::empty(0, 0),
            position: Position::ORIGIN,
            found: FoundTreasures::new(),
            treasure_goal: 0,
            game_over: false,
            phase: TurnPhase::Idle,
            digging_cell: None,
            message: String::new(),
            message_serial: 0,
            session: SessionId::default(),
            clock_ms: 0,
            timers: Scheduler::new(),
            board,
            timing,
        }
    }

    /// Show a message. Returns its serial for the matching clear timer.
    pub fn set_message(&mut self, msg: &str) -> u64 {
        self.message = msg.to_string();
        self.message_serial += 1;
        self.message_serial
    }

    pub fn current_cell(&self) -> Option<&Cell> {
        self.grid.cell_at(self.position)
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.phase == TurnPhase::Idle
    }

    /// Move and Dig are accepted only in this state.
    #[inline]
    pub fn accepts_actions(&self) -> bool {
        !self.game_over && self.is_idle()
    }
}
