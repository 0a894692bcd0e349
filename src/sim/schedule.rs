/// One-shot timers for the delayed half of each action.
///
/// Every timer carries the id of the session that scheduled it.
/// `cancel_session` drops a finished session's timers on reset, and
/// `take_due` only yields timers of the session it is asked about.
///
/// Time is plain milliseconds on the caller's monotonic clock.

use crate::domain::treasure::TreasureKind;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct SessionId(pub u64);

impl SessionId {
    pub fn next(self) -> SessionId {
        SessionId(self.0.wrapping_add(1))
    }
}

/// What happens when a timer fires.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Timer {
    /// Move lock releases.
    MoveSettle,
    /// Dig completes on `cell`; `treasure` was captured when the dig started.
    DigResolve { cell: usize, treasure: Option<TreasureKind> },
    /// Clear the message with this serial, if it is still showing.
    ClearMessage { serial: u64 },
}

#[derive(Clone, Copy, Debug)]
pub struct Scheduled {
    pub due_ms: u64,
    pub session: SessionId,
    pub timer: Timer,
    seq: u64,
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    pending: Vec<Scheduled>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler::default()
    }

    pub fn schedule(&mut self, due_ms: u64, session: SessionId, timer: Timer) {
        self.pending.push(Scheduled { due_ms, session, timer, seq: self.next_seq });
        self.next_seq += 1;
    }

    /// Remove and return every timer of `session` due at or before `now_ms`,
    /// earliest first (ties in scheduling order).
    /// Timers of other sessions are discarded along the way.
    pub fn take_due(&mut self, now_ms: u64, session: SessionId) -> Vec<Scheduled> {
        self.pending.retain(|s| s.session == session);
        let mut due = Vec::new();
        self.pending.retain(|s| {
            if s.due_ms <= now_ms {
                due.push(*s);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|s| (s.due_ms, s.seq));
        due
    }

    /// Drop every timer scheduled by `session`.
    pub fn cancel_session(&mut self, session: SessionId) {
        self.pending.retain(|s| s.session != session);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
