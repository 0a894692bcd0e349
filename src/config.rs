/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or
/// `~/.config/excavator/`. Missing keys fall back to defaults; an unreadable,
/// unparsable, or invalid file is logged and replaced by the defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

// ── Public Config Structs ──

#[derive(Clone, Debug, Default)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub timing: TimingConfig,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
    pub treasures: usize,
    /// Fixed RNG seed; `None` draws one from the OS.
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    pub frame_ms: u64,
    pub move_settle_ms: u64,
    pub dig_resolve_ms: u64,
    pub message_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GamepadConfig {
    pub dig: Vec<String>,
    pub reset: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("board must be at least 1x1, got {width}x{height}")]
    EmptyBoard { width: usize, height: usize },

    #[error("board {width}x{height} exceeds {max} cells")]
    BoardTooLarge { width: usize, height: usize, max: usize },

    #[error("board needs at least one treasure")]
    NoTreasures,

    #[error("{treasures} treasures do not fit in {cells} cells")]
    TooManyTreasures { treasures: usize, cells: usize },

    #[error("timing.{0} must be greater than zero")]
    ZeroTiming(&'static str),
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    board: TomlBoard,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlBoard {
    #[serde(default = "default_width")]
    width: usize,
    #[serde(default = "default_height")]
    height: usize,
    #[serde(default = "default_treasures")]
    treasures: usize,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame")]
    frame_ms: u64,
    #[serde(default = "default_move_settle")]
    move_settle_ms: u64,
    #[serde(default = "default_dig_resolve")]
    dig_resolve_ms: u64,
    #[serde(default = "default_message")]
    message_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_dig")]
    dig: Vec<String>,
    #[serde(default = "default_pad_reset")]
    reset: Vec<String>,
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
}

// ── Defaults ──

fn default_width() -> usize { 8 }
fn default_height() -> usize { 16 }
fn default_treasures() -> usize { 10 }
fn default_frame() -> u64 { 5 }
fn default_move_settle() -> u64 { 300 }   // matches the slide animation
fn default_dig_resolve() -> u64 { 400 }
fn default_message() -> u64 { 2000 }

fn default_pad_dig() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_pad_reset() -> Vec<String> { vec!["Start".into()] }
fn default_pad_quit() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlBoard {
    fn default() -> Self {
        TomlBoard {
            width: default_width(),
            height: default_height(),
            treasures: default_treasures(),
            seed: None,
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame(),
            move_settle_ms: default_move_settle(),
            dig_resolve_ms: default_dig_resolve(),
            message_ms: default_message(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            dig: default_pad_dig(),
            reset: default_pad_reset(),
            quit: default_pad_quit(),
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        TomlBoard::default().into()
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TomlTiming::default().into()
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        TomlGamepad::default().into()
    }
}

impl From<TomlBoard> for BoardConfig {
    fn from(b: TomlBoard) -> Self {
        BoardConfig { width: b.width, height: b.height, treasures: b.treasures, seed: b.seed }
    }
}

impl From<TomlTiming> for TimingConfig {
    fn from(t: TomlTiming) -> Self {
        TimingConfig {
            frame_ms: t.frame_ms,
            move_settle_ms: t.move_settle_ms,
            dig_resolve_ms: t.dig_resolve_ms,
            message_ms: t.message_ms,
        }
    }
}

impl From<TomlGamepad> for GamepadConfig {
    fn from(g: TomlGamepad) -> Self {
        GamepadConfig { dig: g.dig, reset: g.reset, quit: g.quit }
    }
}

// ── Validation ──

/// Upper bound on `width * height`; far beyond any terminal.
const MAX_CELLS: usize = 1 << 16;

impl BoardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyBoard { width: self.width, height: self.height });
        }
        if self.treasures == 0 {
            return Err(ConfigError::NoTreasures);
        }
        let cells = match self.width.checked_mul(self.height) {
            Some(cells) if cells <= MAX_CELLS => cells,
            _ => {
                return Err(ConfigError::BoardTooLarge {
                    width: self.width,
                    height: self.height,
                    max: MAX_CELLS,
                })
            }
        };
        if self.treasures > cells {
            return Err(ConfigError::TooManyTreasures { treasures: self.treasures, cells });
        }
        Ok(())
    }
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("frame_ms", self.frame_ms),
            ("move_settle_ms", self.move_settle_ms),
            ("dig_resolve_ms", self.dig_resolve_ms),
            ("message_ms", self.message_ms),
        ];
        match fields.iter().find(|(_, v)| *v == 0) {
            Some((name, _)) => Err(ConfigError::ZeroTiming(*name)),
            None => Ok(()),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from the first `config.toml` found.
    /// Never fails: problems are logged and defaults used instead.
    pub fn load() -> Self {
        for dir in candidate_dirs() {
            let path = dir.join("config.toml");
            if !path.exists() {
                continue;
            }
            return match GameConfig::from_file(&path) {
                Ok(cfg) => {
                    info!(path = %path.display(), "config loaded");
                    cfg
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "bad config, using defaults");
                    GameConfig::default()
                }
            };
        }
        info!("no config.toml found, using defaults");
        GameConfig::default()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        GameConfig::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let toml_cfg: TomlConfig = toml::from_str(text)?;
        let cfg = GameConfig {
            board: toml_cfg.board.into(),
            timing: toml_cfg.timing.into(),
            gamepad: toml_cfg.gamepad.into(),
        };
        cfg.board.validate()?;
        cfg.timing.validate()?;
        Ok(cfg)
    }
}

/// Candidate directories to search: exe dir + CWD + user config dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    let user = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(xdg) => Some(PathBuf::from(xdg).join("excavator")),
        None => std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config/excavator")),
    };
    if let Some(user) = user {
        if user.is_dir() && !dirs.iter().any(|d| d == &user) {
            dirs.push(user);
        }
    }

    dirs
}
