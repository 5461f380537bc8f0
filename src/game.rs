//! Host lifecycle facade
//!
//! Bundles a session's state, tuning, clock and lifecycle controller behind
//! the four calls a host needs: `start`, `stop`, `restart` and `step`.

use rand::RngCore;

use crate::sim::{GameOverHook, GameState, LifecycleController, SimulationClock, Snapshot, TickInput, tick};
use crate::tuning::{Tuning, TuningError};

/// One running (or paused) game session
#[derive(Debug)]
pub struct Game {
    state: GameState,
    tuning: Tuning,
    clock: SimulationClock,
    lifecycle: LifecycleController,
    input: TickInput,
}

impl Game {
    /// A new, stopped session
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        log::info!("New game with seed {}", seed);
        Self {
            state: GameState::new(seed, &tuning),
            tuning,
            clock: SimulationClock::new(),
            lifecycle: LifecycleController::new(),
            input: TickInput::default(),
        }
    }

    /// Like `new`, but rejects a tuning that fails validation
    pub fn try_new(seed: u64, tuning: Tuning) -> Result<Self, TuningError> {
        tuning.validate()?;
        Ok(Self::new(seed, tuning))
    }

    pub fn with_game_over_hook(mut self, hook: impl GameOverHook + 'static) -> Self {
        self.lifecycle.set_hook(hook);
        self
    }

    pub fn set_game_over_hook(&mut self, hook: impl GameOverHook + 'static) {
        self.lifecycle.set_hook(hook);
    }

    /// Begin or resume. The next step uses a unit delta.
    pub fn start(&mut self) {
        self.clock.start();
    }

    /// Pause; steps are ignored until `start`
    pub fn stop(&mut self) {
        self.clock.stop();
    }

    /// Throw the session away and start a fresh one. The new seed is drawn
    /// from the old session's generator so replays stay reproducible.
    pub fn restart(&mut self) {
        let seed = self.state.rng.next_u64();
        self.state = GameState::new(seed, &self.tuning);
        self.input = TickInput::default();
        self.clock.start();
        log::info!("Restarted with seed {}", seed);
    }

    /// Latch the jump request read by subsequent steps
    pub fn set_jump(&mut self, pressed: bool) {
        self.input.jump = pressed;
    }

    /// Advance one frame at host time `timestamp` (ms). Returns false when
    /// stopped or already over.
    pub fn step(&mut self, timestamp: f64) -> bool {
        if !self.clock.is_running() || self.state.game_over {
            return false;
        }
        let dt = self.clock.delta(timestamp);
        tick(&mut self.state, &mut self.lifecycle, &self.input, dt, &self.tuning);
        if self.state.game_over {
            self.clock.stop();
        }
        true
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::capture(&self.state)
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn is_game_over(&self) -> bool {
        self.state.game_over
    }

    pub fn score(&self) -> u64 {
        self.state.floored_score()
    }

    pub fn lives(&self) -> u8 {
        self.state.lives
    }
}
