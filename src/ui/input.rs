/// Keyboard input → game commands.
///
/// Every Press or Repeat event becomes at most one `Command`. Nothing is
/// buffered across frames: a command arriving while the excavator is busy
/// is simply rejected by the turn lock, like a button mashed mid-animation.
/// Release events are ignored.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::grid::Direction;

/// A player intent, independent of the device that produced it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(Direction),
    /// Dig here; also "play again" on the win screen.
    Dig,
    Reset,
    Quit,
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_DIG: &[KeyCode] = &[KeyCode::Char(' '), KeyCode::Enter];
const KEYS_RESET: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

/// Map one key event to a command.
pub fn command_for(key: &KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Command::Quit),
            _ => None,
        };
    }

    let code = &key.code;
    if KEYS_LEFT.contains(code) {
        Some(Command::Move(Direction::Left))
    } else if KEYS_RIGHT.contains(code) {
        Some(Command::Move(Direction::Right))
    } else if KEYS_UP.contains(code) {
        Some(Command::Move(Direction::Up))
    } else if KEYS_DOWN.contains(code) {
        Some(Command::Move(Direction::Down))
    } else if KEYS_DIG.contains(code) {
        Some(Command::Dig)
    } else if KEYS_RESET.contains(code) {
        Some(Command::Reset)
    } else if KEYS_QUIT.contains(code) {
        Some(Command::Quit)
    } else {
        None
    }
}

pub struct InputState {
    /// Commands collected by the most recent `drain_events()`.
    commands: Vec<Command>,
}

impl InputState {
    pub fn new() -> Self {
        InputState { commands: Vec::with_capacity(8) }
    }

    /// Drain all pending terminal events without blocking.
    /// Call once per frame; returns this frame's commands in arrival order.
    pub fn drain_events(&mut self) -> &[Command] {
        self.commands.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if let Some(cmd) = command_for(&key) {
                    self.commands.push(cmd);
                }
            }
        }

        &self.commands
    }
}
