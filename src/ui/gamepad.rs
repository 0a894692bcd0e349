/// Gamepad input using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Move (one cell per press / stick flick)
///   A / X                 →  Dig
///   Start                 →  Reset
///   Select                →  Quit
///
/// Without the "gamepad" feature this compiles to a tracker that never
/// reports anything.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::grid::Direction;
use super::input::Command;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

/// Logical face/shoulder buttons.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug)]
struct ActionMap {
    dig: Vec<Btn>,
    reset: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            dig: vec![Btn::A, Btn::X],
            reset: vec![Btn::Start],
            quit: vec![Btn::Select],
        }
    }
}

impl ActionMap {
    fn apply(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let dig = parse_list(&cfg.dig);
        if !dig.is_empty() { self.dig = dig; }
        let reset = parse_list(&cfg.reset);
        if !reset.is_empty() { self.reset = reset; }
        let quit = parse_list(&cfg.quit);
        if !quit.is_empty() { self.quit = quit; }
    }

    /// Command bound to a face button, if any. Quit wins over reset over dig
    /// when a button is bound twice.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn command_for(&self, btn: Btn) -> Option<Command> {
        if self.quit.contains(&btn) {
            Some(Command::Quit)
        } else if self.reset.contains(&btn) {
            Some(Command::Reset)
        } else if self.dig.contains(&btn) {
            Some(Command::Dig)
        } else {
            None
        }
    }
}

/// Stick position → one direction, or none inside the dead zone.
/// gilrs reports +Y as up.
#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
fn stick_direction(x: f32, y: f32) -> Option<Direction> {
    if x.abs() < STICK_DEADZONE && y.abs() < STICK_DEADZONE {
        return None;
    }
    if x.abs() >= y.abs() {
        Some(if x < 0.0 { Direction::Left } else { Direction::Right })
    } else {
        Some(if y > 0.0 { Direction::Up } else { Direction::Down })
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    #[cfg(feature = "gamepad")]
    stick_x: f32,
    #[cfg(feature = "gamepad")]
    stick_y: f32,
    /// Direction the stick was pointing last frame; a move fires on change.
    #[cfg(feature = "gamepad")]
    stick_dir: Option<Direction>,

    action_map: ActionMap,
    commands: Vec<Command>,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                tracing::warn!(error = %e, "gamepad support unavailable");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            #[cfg(feature = "gamepad")]
            stick_x: 0.0,
            #[cfg(feature = "gamepad")]
            stick_y: 0.0,
            #[cfg(feature = "gamepad")]
            stick_dir: None,
            action_map: ActionMap::default(),
            commands: Vec::with_capacity(4),
            connected,
        }
    }

    /// Load button mapping from config. Empty or unrecognised lists keep the defaults.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        self.action_map.apply(cfg);
    }

    /// Poll the pad and return this frame's commands.
    pub fn update(&mut self) -> &[Command] {
        self.commands.clear();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();

        &self.commands
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.on_button(btn);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    self.connected = true;
                    tracing::info!("gamepad connected");
                }
                EventType::Disconnected => {
                    self.connected = false;
                    self.stick_x = 0.0;
                    self.stick_y = 0.0;
                    self.stick_dir = None;
                    tracing::info!("gamepad disconnected");
                }
                _ => {}
            }
        }

        let dir = stick_direction(self.stick_x, self.stick_y);
        if dir.is_some() && dir != self.stick_dir {
            self.commands.extend(dir.map(Command::Move));
        }
        self.stick_dir = dir;
    }

    #[cfg(feature = "gamepad")]
    fn on_button(&mut self, btn: Button) {
        let cmd = match btn {
            Button::DPadUp => Some(Command::Move(Direction::Up)),
            Button::DPadDown => Some(Command::Move(Direction::Down)),
            Button::DPadLeft => Some(Command::Move(Direction::Left)),
            Button::DPadRight => Some(Command::Move(Direction::Right)),
            other => Btn::from_gilrs(other).and_then(|b| self.action_map.command_for(b)),
        };
        self.commands.extend(cmd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map() {
        let map = ActionMap::default();
        assert_eq!(map.command_for(Btn::A), Some(Command::Dig));
        assert_eq!(map.command_for(Btn::Start), Some(Command::Reset));
        assert_eq!(map.command_for(Btn::Select), Some(Command::Quit));
        assert_eq!(map.command_for(Btn::Y), None);
    }

    #[test]
    fn config_overrides_and_ignores_junk() {
        let mut map = ActionMap::default();
        map.apply(&GamepadConfig {
            dig: vec!["rb".into(), "nonsense".into()],
            reset: vec![],
            quit: vec!["???".into()],
        });
        assert_eq!(map.dig, vec![Btn::R1]);
        assert_eq!(map.reset, vec![Btn::Start]);
        assert_eq!(map.quit, vec![Btn::Select]);
        assert_eq!(map.command_for(Btn::A), None);
    }

    #[test]
    fn stick_dead_zone_and_dominant_axis() {
        assert_eq!(stick_direction(0.1, -0.2), None);
        assert_eq!(stick_direction(-0.9, 0.3), Some(Direction::Left));
        assert_eq!(stick_direction(0.2, 0.8), Some(Direction::Up));
        assert_eq!(stick_direction(0.0, -0.7), Some(Direction::Down));
    }
}
