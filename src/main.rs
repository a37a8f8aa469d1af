/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod logging;
mod sim;
mod ui;

use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use config::GameConfig;
use sim::event::HostTask;
use sim::session::{SceneId, SceneNavigator, Session};
use ui::gamepad::GamepadState;
use ui::input::{Command, InputState};
use ui::locale::Localizer;
use ui::renderer::{Renderer, View};
use ui::screen::{Flow, Screen};

const FRAME_SLEEP: Duration = Duration::from_millis(2);

fn main() {
    let config = GameConfig::load();
    let _log_guard = logging::init(&config.log);
    for warning in &config.warnings {
        warn!("{warning}");
    }
    info!(version = env!("CARGO_PKG_VERSION"), campaigns = ?config.campaigns, "starting");

    let (tasks, host_queue) = mpsc::channel();
    let mut session = Session::from_config(&config, tasks);
    let strings = Localizer::new(&config.strings);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut session, &mut renderer, &config, &strings, &host_queue);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    for (name, e) in session.save_all() {
        eprintln!("Could not save campaign {name}: {e}");
    }
    if let Err(e) = result {
        error!(error = %e, "game loop failed");
        eprintln!("Game error: {e}");
    }
    info!("bye");
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    config: &GameConfig,
    strings: &Localizer,
    host_queue: &Receiver<HostTask>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new(&config.gamepad);
    let mut screen = Screen::new();
    let frame = config.timing.frame();
    let mut last_tick = Instant::now();

    loop {
        // Host tasks first: they were queued by the previous tick.
        while let Ok(task) = host_queue.try_recv() {
            screen.on_task(task, config.timing.completion_delay());
            session.save_all();
        }

        let mut commands: Vec<Command> = kb.drain_events().to_vec();
        commands.extend_from_slice(gp.update());
        for cmd in commands {
            if screen.handle(session, cmd) == Flow::Quit {
                info!("quit requested");
                return Ok(());
            }
        }

        let dt = last_tick.elapsed();
        if dt < frame {
            std::thread::sleep(FRAME_SLEEP);
            continue;
        }
        last_tick = Instant::now();

        match session.tick(dt) {
            Ok(events) => {
                for event in &events {
                    debug!(?event, "game event");
                }
            }
            Err(e) => {
                error!(error = %e, "step animation failed, leaving level");
                session.leave_level();
                screen.change_scene(SceneId::MainMenu);
            }
        }
        screen.tick(dt);

        renderer.render(&View {
            screen: &screen,
            session: &*session,
            strings,
            pointer: config.pointer_color,
        })?;
    }
}
