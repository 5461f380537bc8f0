//! Lane Runner entry point
//!
//! Native builds run a headless autopilot session and print the final
//! snapshot as JSON. The browser build is driven through `lane_runner::web`.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use lane_runner::consts::FRAME_MS;
    use lane_runner::sim::GameState;
    use lane_runner::{Game, Tuning};

    /// Two minutes of nominal frames
    const MAX_FRAMES: u32 = 60 * 120;
    /// How far ahead of the player the autopilot looks
    const LOOKAHEAD: f32 = 40.0;

    /// Jump when the ground runs out or a spike is coming up
    fn wants_jump(state: &GameState) -> bool {
        let player = &state.player;
        if !player.on_ground && player.coyote_time == 0 {
            return false;
        }
        let feet = player.bottom();
        let ahead = player.rect().right() + LOOKAHEAD;

        let ground_ahead = state
            .world
            .platforms
            .iter()
            .any(|p| (p.rect.top() - feet).abs() < 1.0 && p.rect.left() <= ahead && p.rect.right() >= ahead);
        let spike_ahead = state.world.obstacles.iter().any(|o| {
            let bottom = o.pos.y + o.size;
            (bottom - feet).abs() < 1.0 && o.pos.x > player.pos.x && o.pos.x < ahead
        });
        !ground_ahead || spike_ahead
    }

    fn load_tuning(path: Option<String>) -> Result<Tuning, String> {
        let Some(path) = path else {
            return Ok(Tuning::default());
        };
        let json = std::fs::read_to_string(&path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
        Tuning::from_json(&json).map_err(|e| format!("Bad tuning file {}: {}", path, e))
    }

    pub fn run() {
        let mut args = std::env::args().skip(1);
        let seed = match args.next().map(|s| s.parse::<u64>()) {
            Some(Ok(seed)) => seed,
            Some(Err(e)) => {
                log::error!("Seed must be an unsigned integer: {}", e);
                std::process::exit(1);
            }
            None => 42,
        };
        let tuning = match load_tuning(args.next()) {
            Ok(tuning) => tuning,
            Err(msg) => {
                log::error!("{}", msg);
                std::process::exit(1);
            }
        };

        let mut game = Game::new(seed, tuning).with_game_over_hook(|score: u64| log::info!("Final score: {}", score));
        game.start();

        let mut frames = 0;
        while frames < MAX_FRAMES && game.is_running() {
            let jump = wants_jump(game.state());
            game.set_jump(jump);
            game.step(f64::from(frames) * FRAME_MS);
            frames += 1;
        }

        log::info!(
            "Ran {} frames: score {}, lives {}, game over {}",
            frames,
            game.score(),
            game.lives(),
            game.is_game_over()
        );

        match game.snapshot().to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                log::error!("Failed to serialize snapshot: {}", e);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Lane Runner (native) starting...");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is lane_runner::web::init, this is just to satisfy the compiler
}
