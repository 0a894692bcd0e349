/// Transition functions: the only code that mutates a `WorldState`.
///
/// Each takes the world by `&mut`, the current session-clock time in ms,
/// and returns the events it produced. Rejected inputs return no events
/// and change nothing.
///
///   reset         : deal a new board, start a new session
///   move_excavator: Idle → Moving, settle timer → Idle
///   dig           : Idle → Digging, resolve timer → Idle
///   advance       : fire due timers of the current session

use tracing::{debug, info};

use crate::domain::grid::{Direction, Grid, Position};
use crate::domain::sampler::SessionRng;
use crate::domain::treasure::TreasureKind;
use super::event::GameEvent;
use super::schedule::Timer;
use super::world::{TurnPhase, WorldState};

// ══════════════════════════════════════════════════════════════
// Reset
// ══════════════════════════════════════════════════════════════

pub fn reset(world: &mut WorldState, rng: &mut SessionRng) -> Vec<GameEvent> {
    if !world.timers.is_empty() {
        debug!(session = world.session.0, pending = world.timers.len(), "dropping timers");
    }
    world.timers.cancel_session(world.session);
    world.session = world.session.next();

    let board = &world.board;
    world.grid = Grid::generate(board.width, board.height, board.treasures, rng);
    world.treasure_goal = world.grid.distinct_kinds();
    world.position = Position::ORIGIN;
    world.found.clear();
    world.game_over = false;
    world.phase = TurnPhase::Idle;
    world.digging_cell = None;
    world.message.clear();

    let treasures = world.grid.treasure_count();
    info!(
        session = world.session.0,
        width = world.grid.width,
        height = world.grid.height,
        treasures,
        goal = world.treasure_goal,
        "new dig site"
    );
    vec![GameEvent::SessionStarted { session: world.session.0, treasures }]
}

// ══════════════════════════════════════════════════════════════
// Move
// ══════════════════════════════════════════════════════════════

pub fn move_excavator(world: &mut WorldState, dir: Direction, now_ms: u64) -> Vec<GameEvent> {
    if !world.accepts_actions() {
        return vec![];
    }

    let from = world.position;
    let to = from.step(dir, world.grid.width, world.grid.height);
    world.position = to;
    world.phase = TurnPhase::Moving;
    world.timers.schedule(
        now_ms + world.timing.move_settle_ms,
        world.session,
        Timer::MoveSettle,
    );

    debug!(?dir, ?from, ?to, "move");
    vec![GameEvent::Moved { from, to }]
}

// ══════════════════════════════════════════════════════════════
// Dig
// ══════════════════════════════════════════════════════════════

pub fn dig(world: &mut WorldState, now_ms: u64) -> Vec<GameEvent> {
    if !world.accepts_actions() {
        return vec![];
    }
    let cell = match world.current_cell() {
        Some(c) if !c.dug => *c,
        _ => return vec![],
    };

    world.phase = TurnPhase::Digging;
    world.digging_cell = Some(cell.id);
    // The treasure is captured now; the timer resolves against this value.
    world.timers.schedule(
        now_ms + world.timing.dig_resolve_ms,
        world.session,
        Timer::DigResolve { cell: cell.id, treasure: cell.treasure },
    );

    debug!(cell = cell.id, "dig started");
    vec![GameEvent::DigStarted { cell: cell.id }]
}

// ══════════════════════════════════════════════════════════════
// Timers
// ══════════════════════════════════════════════════════════════

pub fn advance(world: &mut WorldState, now_ms: u64) -> Vec<GameEvent> {
    world.clock_ms = world.clock_ms.max(now_ms);

    let mut events = Vec::new();
    for due in world.timers.take_due(now_ms, world.session) {
        match due.timer {
            Timer::MoveSettle => {
                if world.phase == TurnPhase::Moving {
                    world.phase = TurnPhase::Idle;
                }
                events.push(GameEvent::MoveSettled);
            }
            Timer::DigResolve { cell, treasure } => {
                resolve_dig(world, cell, treasure, due.due_ms, &mut events);
            }
            Timer::ClearMessage { serial } => {
                if world.message_serial == serial && !world.message.is_empty() {
                    world.message.clear();
                    events.push(GameEvent::MessageCleared);
                }
            }
        }
    }
    events
}

fn resolve_dig(
    world: &mut WorldState,
    cell: usize,
    treasure: Option<TreasureKind>,
    at_ms: u64,
    events: &mut Vec<GameEvent>,
) {
    world.grid.mark_dug(cell);
    events.push(GameEvent::CellDug { cell, treasure });

    if let Some(kind) = treasure {
        if world.found.insert(kind) {
            events.push(GameEvent::TreasureFound { kind });
            info!(?kind, found = world.found.len(), goal = world.treasure_goal, "treasure found");
            if world.found.len() >= world.treasure_goal {
                world.game_over = true;
                events.push(GameEvent::AllTreasuresFound);
                info!(session = world.session.0, "all treasures found");
            }
        }
        let serial = world.set_message(&format!("You found a {}!", kind.display_name()));
        world.timers.schedule(
            at_ms + world.timing.message_ms,
            world.session,
            Timer::ClearMessage { serial },
        );
    }

    world.phase = TurnPhase::Idle;
    world.digging_cell = None;
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoardConfig, TimingConfig};
    use crate::domain::treasure::TreasureKind::*;

    const SETTLE: u64 = 300;
    const RESOLVE: u64 = 400;
    const MESSAGE: u64 = 2000;

    fn board(width: usize, height: usize, treasures: usize) -> BoardConfig {
        BoardConfig { width, height, treasures, seed: None }
    }

    fn timing() -> TimingConfig {
        TimingConfig {
            frame_ms: 5,
            move_settle_ms: SETTLE,
            dig_resolve_ms: RESOLVE,
            message_ms: MESSAGE,
        }
    }

    fn fresh(width: usize, height: usize, treasures: usize, seed: u64) -> WorldState {
        let mut w = WorldState::new(board(width, height, treasures), timing());
        reset(&mut w, &mut SessionRng::new(seed));
        w
    }

    /// World with a hand-placed board. Cells listed in `treasures` hold the kind.
    fn world_with(width: usize, height: usize, treasures: &[(usize, TreasureKind)]) -> WorldState {
        let mut w = fresh(width, height, treasures.len(), 0);
        let mut grid = Grid::empty(width, height);
        for &(idx, kind) in treasures {
            grid.cells[idx].treasure = Some(kind);
        }
        w.treasure_goal = grid.distinct_kinds();
        w.grid = grid;
        w
    }

    fn dig_at(w: &mut WorldState, now: u64) -> Vec<GameEvent> {
        let mut ev = dig(w, now);
        ev.extend(advance(w, now + RESOLVE));
        ev
    }

    fn walk(w: &mut WorldState, dir: Direction, now: u64) {
        move_excavator(w, dir, now);
        advance(w, now + SETTLE);
    }

    // ── Initialize / Reset ──

    #[test]
    fn init_places_exact_treasures() {
        for seed in 0..20 {
            let w = fresh(8, 16, 10, seed);
            assert_eq!(w.grid.cells.len(), 128);
            assert_eq!(w.grid.treasure_count(), 10);
            assert_eq!(w.position, Position::ORIGIN);
            assert!(w.found.is_empty());
            assert!(!w.game_over);
            assert_eq!(w.phase, TurnPhase::Idle);
        }
    }

    #[test]
    fn strip_goal_equals_treasure_count() {
        let w = fresh(8, 1, 5, 9);
        assert_eq!(w.grid.treasure_count(), 5);
        assert_eq!(w.treasure_goal, 5);
    }

    #[test]
    fn field_goal_counts_distinct_kinds() {
        let w = fresh(8, 16, 10, 9);
        assert_eq!(w.treasure_goal, TreasureKind::ALL.len());
    }

    #[test]
    fn reset_bumps_session() {
        let mut w = fresh(8, 1, 5, 1);
        let before = w.session;
        let ev = reset(&mut w, &mut SessionRng::new(2));
        assert_eq!(w.session, before.next());
        assert_eq!(ev, vec![GameEvent::SessionStarted { session: w.session.0, treasures: 5 }]);
    }

    // ── Move ──

    #[test]
    fn move_right_then_settle() {
        let mut w = fresh(8, 16, 10, 3);
        let ev = move_excavator(&mut w, Direction::Right, 0);
        assert_eq!(ev, vec![GameEvent::Moved { from: Position::ORIGIN, to: Position::new(1, 0) }]);
        assert_eq!(w.phase, TurnPhase::Moving);
        assert_eq!(w.position, Position::new(1, 0));

        assert!(advance(&mut w, SETTLE - 1).is_empty());
        assert_eq!(w.phase, TurnPhase::Moving);
        assert_eq!(advance(&mut w, SETTLE), vec![GameEvent::MoveSettled]);
        assert_eq!(w.phase, TurnPhase::Idle);
    }

    #[test]
    fn move_left_at_origin_stays_but_locks() {
        let mut w = fresh(8, 16, 10, 3);
        let ev = move_excavator(&mut w, Direction::Left, 0);
        assert_eq!(ev, vec![GameEvent::Moved { from: Position::ORIGIN, to: Position::ORIGIN }]);
        assert_eq!(w.position, Position::ORIGIN);
        assert_eq!(w.phase, TurnPhase::Moving);
        advance(&mut w, SETTLE);
        assert_eq!(w.phase, TurnPhase::Idle);
    }

    #[test]
    fn moves_stay_in_bounds() {
        let mut w = fresh(4, 3, 2, 5);
        let dirs = [Direction::Right, Direction::Down, Direction::Down, Direction::Left, Direction::Up];
        let mut t = 0;
        for i in 0..60 {
            walk(&mut w, dirs[(i * 3 + i / 4) % dirs.len()], t);
            t += SETTLE;
            assert!(w.grid.contains(w.position));
        }
    }

    #[test]
    fn second_move_inside_lock_window_is_dropped() {
        let mut w = fresh(8, 16, 10, 3);
        move_excavator(&mut w, Direction::Right, 0);
        assert!(move_excavator(&mut w, Direction::Right, 100).is_empty());
        assert!(dig(&mut w, 150).is_empty());
        assert_eq!(w.position, Position::new(1, 0));
        assert_eq!(w.timers.len(), 1);

        advance(&mut w, SETTLE);
        move_excavator(&mut w, Direction::Right, SETTLE);
        assert_eq!(w.position, Position::new(2, 0));
    }

    #[test]
    fn actions_while_digging_are_dropped() {
        let mut w = world_with(3, 1, &[(0, Gem), (2, Star)]);
        assert_eq!(dig(&mut w, 0).len(), 1);
        assert_eq!(w.phase, TurnPhase::Digging);

        assert!(move_excavator(&mut w, Direction::Right, 100).is_empty());
        assert!(dig(&mut w, 100).is_empty());
        assert_eq!(w.position, Position::ORIGIN);
        assert_eq!(w.digging_cell, Some(0));
        assert_eq!(w.timers.len(), 1);

        advance(&mut w, RESOLVE);
        assert_eq!(w.phase, TurnPhase::Idle);
        assert_eq!(move_excavator(&mut w, Direction::Right, RESOLVE).len(), 1);
        assert_eq!(w.position, Position::new(1, 0));
    }

    // ── Dig ──

    #[test]
    fn dig_empty_origin_on_field() {
        let mut w = fresh(8, 16, 10, 21);
        // Make sure (0,0) is empty while keeping 10 treasures.
        if let Some(kind) = w.grid.cells[0].treasure.take() {
            let free = w.grid.cells.iter().position(|c| c.treasure.is_none() && c.id != 0);
            if let Some(i) = free {
                w.grid.cells[i].treasure = Some(kind);
            }
        }
        assert_eq!(w.grid.treasure_count(), 10);

        let ev = dig(&mut w, 0);
        assert_eq!(ev, vec![GameEvent::DigStarted { cell: 0 }]);
        assert_eq!(w.phase, TurnPhase::Digging);
        assert_eq!(w.digging_cell, Some(0));
        assert!(!w.grid.cells[0].dug);

        let ev = advance(&mut w, RESOLVE);
        assert_eq!(ev, vec![GameEvent::CellDug { cell: 0, treasure: None }]);
        assert!(w.grid.cells[0].dug);
        assert!(w.found.is_empty());
        assert!(!w.game_over);
        assert!(w.message.is_empty());
        assert_eq!(w.phase, TurnPhase::Idle);
        assert_eq!(w.digging_cell, None);
    }

    #[test]
    fn dig_is_idempotent() {
        let mut w = world_with(4, 1, &[(0, Gem), (3, Star)]);
        dig_at(&mut w, 0);
        let found = w.found.clone();
        let grid_before: Vec<_> = w.grid.cells.clone();

        assert!(dig(&mut w, 1000).is_empty());
        assert_eq!(w.phase, TurnPhase::Idle);
        assert_eq!(w.found, found);
        assert_eq!(w.grid.cells, grid_before);
    }

    #[test]
    fn dig_treasure_sets_message_then_clears() {
        let mut w = world_with(4, 1, &[(0, ToyCar), (3, Star)]);
        let ev = dig_at(&mut w, 0);
        assert!(ev.contains(&GameEvent::TreasureFound { kind: ToyCar }));
        assert_eq!(w.message, "You found a toy car!");
        assert_eq!(w.found.iter().collect::<Vec<_>>(), vec![ToyCar]);

        assert!(advance(&mut w, RESOLVE + MESSAGE - 1).is_empty());
        assert_eq!(advance(&mut w, RESOLVE + MESSAGE), vec![GameEvent::MessageCleared]);
        assert!(w.message.is_empty());
    }

    #[test]
    fn old_clear_timer_keeps_newer_message() {
        let mut w = world_with(4, 1, &[(0, Gem), (1, Bone), (3, Star)]);
        dig_at(&mut w, 0);
        walk(&mut w, Direction::Right, RESOLVE);
        let t = RESOLVE + SETTLE;
        dig_at(&mut w, t);
        assert_eq!(w.message, "You found a bone!");

        // First message's clear timer fires before the second's.
        advance(&mut w, RESOLVE + MESSAGE);
        assert_eq!(w.message, "You found a bone!");
        advance(&mut w, t + RESOLVE + MESSAGE);
        assert!(w.message.is_empty());
    }

    #[test]
    fn finding_last_treasure_ends_game() {
        let mut w = world_with(3, 1, &[(0, Crown), (2, Gem)]);
        assert_eq!(w.treasure_goal, 2);

        dig_at(&mut w, 0);
        assert!(!w.game_over);
        walk(&mut w, Direction::Right, 1000);
        walk(&mut w, Direction::Right, 2000);
        let ev = dig_at(&mut w, 3000);
        assert!(ev.contains(&GameEvent::AllTreasuresFound));
        assert!(w.game_over);
        assert_eq!(w.found.len(), 2);

        // Sticky: everything is ignored now.
        assert!(move_excavator(&mut w, Direction::Left, 4000).is_empty());
        assert!(dig(&mut w, 4000).is_empty());
        advance(&mut w, 10_000);
        assert!(w.game_over);
    }

    #[test]
    fn duplicate_kind_counts_once() {
        let mut w = world_with(3, 1, &[(0, Gem), (1, Gem), (2, Star)]);
        assert_eq!(w.treasure_goal, 2);

        let ev = dig_at(&mut w, 0);
        assert!(ev.contains(&GameEvent::TreasureFound { kind: Gem }));
        walk(&mut w, Direction::Right, 1000);
        let ev = dig_at(&mut w, 2000);
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::TreasureFound { .. })));
        assert_eq!(w.found.len(), 1);
        assert!(w.grid.cells[1].dug);
        assert!(!w.game_over);

        walk(&mut w, Direction::Right, 3000);
        dig_at(&mut w, 4000);
        assert!(w.game_over);
    }

    #[test]
    fn found_grows_by_at_most_one_per_dig() {
        let mut w = fresh(4, 4, 8, 17);
        let mut t = 0;
        let mut prev = 0;
        for y in 0..4 {
            for x in 0..4 {
                w.position = Position::new(x, y);
                dig_at(&mut w, t);
                t += 1000;
                assert!(w.found.len() <= prev + 1);
                prev = w.found.len();
            }
        }
        assert!(w.game_over);
        assert_eq!(w.found.len(), w.treasure_goal);
    }

    // ── Reset / sessions ──

    #[test]
    fn reset_after_game_over() {
        let mut w = world_with(2, 1, &[(0, Star)]);
        dig_at(&mut w, 0);
        assert!(w.game_over);
        w.position = Position::new(1, 0);

        reset(&mut w, &mut SessionRng::new(77));
        assert!(!w.game_over);
        assert!(w.found.is_empty());
        assert_eq!(w.position, Position::ORIGIN);
        assert!(w.message.is_empty());
        assert!(w.grid.cells.iter().all(|c| !c.dug));
        assert_eq!(w.grid.treasure_count(), w.board.treasures);
    }

    #[test]
    fn pending_dig_does_not_leak_into_new_session() {
        let mut w = world_with(3, 1, &[(0, Star), (2, Gem)]);
        dig(&mut w, 0);
        reset(&mut w, &mut SessionRng::new(4));
        assert!(w.timers.is_empty());
        assert_eq!(w.digging_cell, None);

        move_excavator(&mut w, Direction::Right, 150);
        // The old dig would have resolved at 400 and unlocked the turn.
        let ev = advance(&mut w, 420);
        assert!(ev.is_empty());
        assert_eq!(w.phase, TurnPhase::Moving);
        assert!(w.grid.cells.iter().all(|c| !c.dug));
        assert!(w.found.is_empty());

        advance(&mut w, 150 + SETTLE);
        assert_eq!(w.phase, TurnPhase::Idle);
    }

    #[test]
    fn pending_message_clear_does_not_leak() {
        let mut w = world_with(3, 1, &[(0, Star), (2, Gem)]);
        dig_at(&mut w, 0);
        assert!(!w.message.is_empty());
        reset(&mut w, &mut SessionRng::new(8));
        assert!(w.message.is_empty());
        assert!(advance(&mut w, 10_000).is_empty());
    }
}
