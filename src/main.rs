/// Entry point and game loop.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use config::GameConfig;
use domain::sampler::SessionRng;
use sim::event::GameEvent;
use sim::step;
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::{Command, InputState};
use ui::renderer::Renderer;
use ui::sound::{play_events, SoundEngine};

fn main() {
    // Logging is optional; the game still runs if the state dir is unwritable.
    let _log_guard = match logging::init() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e}");
            None
        }
    };

    let config = GameConfig::load();

    let mut rng = match config.board.seed {
        Some(seed) => SessionRng::new(seed),
        None => SessionRng::from_random(),
    };
    info!(seed = rng.seed(), "session rng ready");

    let mut world = WorldState::new(config.board.clone(), config.timing.clone());
    step::reset(&mut world, &mut rng);

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut rng, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        warn!(error = %e, "game loop failed");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Diggy Diggy Excavator!");
    println!("Treasures found: {}/{}", world.found.len(), world.treasure_goal);
}

fn game_loop(
    world: &mut WorldState,
    rng: &mut SessionRng,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let clock = Instant::now();
    let frame_sleep = Duration::from_millis(config.timing.frame_ms);

    let mut commands: Vec<Command> = Vec::with_capacity(8);

    loop {
        let now_ms = clock.elapsed().as_millis() as u64;

        commands.clear();
        commands.extend_from_slice(kb.drain_events());
        commands.extend_from_slice(gp.update());

        let mut events = Vec::new();
        if apply_commands(world, rng, &commands, now_ms, &mut events) == Flow::Quit {
            info!("quit requested");
            return Ok(());
        }

        events.extend(step::advance(world, now_ms));

        log_events(&events);
        play_events(sound, &events);

        renderer.render(world, gp.connected)?;
        std::thread::sleep(frame_sleep);
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Flow {
    Continue,
    Quit,
}

/// Apply one frame's commands in arrival order.
///
/// A reset ends the frame: later commands were aimed at the old board and are
/// dropped, except Quit.
fn apply_commands(
    world: &mut WorldState,
    rng: &mut SessionRng,
    commands: &[Command],
    now_ms: u64,
    events: &mut Vec<GameEvent>,
) -> Flow {
    let mut reset_done = false;
    for &cmd in commands {
        match cmd {
            Command::Quit => return Flow::Quit,
            _ if reset_done => {}
            // Dig doubles as "play again" once every treasure is found
            Command::Reset | Command::Dig if world.game_over => {
                events.extend(step::reset(world, rng));
                reset_done = true;
            }
            Command::Reset => {
                events.extend(step::reset(world, rng));
                reset_done = true;
            }
            Command::Move(dir) => events.extend(step::move_excavator(world, dir, now_ms)),
            Command::Dig => events.extend(step::dig(world, now_ms)),
        }
    }
    Flow::Continue
}

fn log_events(events: &[GameEvent]) {
    for event in events {
        debug!(?event, "game event");
    }
}
