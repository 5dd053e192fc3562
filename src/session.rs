use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::clock::TickClock;
use crate::config::{BoardSize, INPUT_BUFFER_CAPACITY};
use crate::engine::{GameEngine, LifecycleObserver, Snapshot};
use crate::error::GameError;
use crate::input::{GameInput, InputBuffer, Vector2};

/// Driver-level state, independent of the engine lifecycle.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SessionState {
    Running,
    Paused,
    Stopped,
}

/// Parameters used for every game started by a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub board: BoardSize,
    pub apples: usize,
    pub tick_interval: Duration,
    /// Base seed for reproducible games; each restart uses the next seed.
    pub seed: Option<u64>,
}

/// Owns one engine plus everything the front end needs to drive it.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    engine: GameEngine,
    inputs: InputBuffer,
    clock: TickClock,
    state: SessionState,
    debug: bool,
    games_started: u64,
    best_length: usize,
    final_snapshot: Rc<RefCell<Option<Snapshot>>>,
}

impl Session {
    /// Starts a session with a fresh game.
    pub fn new(config: SessionConfig, now: Instant) -> Result<Self, GameError> {
        let final_snapshot = Rc::new(RefCell::new(None));
        let engine = build_engine(&config, 0, &final_snapshot)?;
        info!(
            "new game on {} board with {} apple(s)",
            config.board, config.apples
        );

        Ok(Self {
            config,
            engine,
            inputs: InputBuffer::with_capacity(INPUT_BUFFER_CAPACITY),
            clock: TickClock::new(config.tick_interval, now),
            state: SessionState::Running,
            debug: false,
            games_started: 1,
            best_length: 1,
            final_snapshot,
        })
    }

    /// Applies one input event.
    pub fn handle_input(&mut self, input: GameInput, now: Instant) -> Result<(), GameError> {
        match input {
            GameInput::Direction(direction) => {
                if self.state == SessionState::Running && self.engine.lifecycle().is_running() {
                    self.inputs.push(direction);
                }
            }
            GameInput::Pause => {
                self.state = match self.state {
                    SessionState::Running => SessionState::Paused,
                    SessionState::Paused => {
                        self.clock.reset(now);
                        SessionState::Running
                    }
                    SessionState::Stopped => SessionState::Stopped,
                };
            }
            GameInput::Restart => {
                if self.engine.lifecycle().is_dead() {
                    self.restart(now)?;
                }
            }
            GameInput::ToggleDebug => self.debug = !self.debug,
            GameInput::Quit => self.state = SessionState::Stopped,
        }

        Ok(())
    }

    /// Runs every tick that is due at `now`, one buffered input per tick.
    ///
    /// Returns the number of ticks run.
    pub fn advance(&mut self, now: Instant) -> Result<u32, GameError> {
        if self.state != SessionState::Running {
            return Ok(0);
        }

        let mut ran = 0;
        for _ in 0..self.clock.due_ticks(now) {
            if self.engine.lifecycle().is_dead() {
                break;
            }

            let input = self.inputs.pop().map(Vector2::from);
            self.engine.tick(input)?;
            ran += 1;
        }

        self.best_length = self.best_length.max(self.engine.length());
        if self.engine.lifecycle().is_dead() {
            self.inputs.clear();
        }

        Ok(ran)
    }

    /// Replaces the current game with a fresh one.
    pub fn restart(&mut self, now: Instant) -> Result<(), GameError> {
        self.engine = build_engine(&self.config, self.games_started, &self.final_snapshot)?;
        self.games_started += 1;
        self.final_snapshot.borrow_mut().take();
        self.inputs.clear();
        self.clock.reset(now);
        if self.state == SessionState::Paused {
            self.state = SessionState::Running;
        }
        info!("restarted, game #{}", self.games_started);

        Ok(())
    }

    #[must_use]
    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    #[must_use]
    pub fn best_length(&self) -> usize {
        self.best_length
    }

    #[must_use]
    pub fn games_started(&self) -> u64 {
        self.games_started
    }

    #[must_use]
    pub fn pending_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// State captured by the lifecycle observer when the current game ended.
    #[must_use]
    pub fn final_snapshot(&self) -> Option<Snapshot> {
        self.final_snapshot.borrow().clone()
    }

    /// Time until the next tick, for sizing the input poll timeout.
    #[must_use]
    pub fn until_next_tick(&self, now: Instant) -> Duration {
        self.clock.until_next(now)
    }
}

fn build_engine(
    config: &SessionConfig,
    game_index: u64,
    sink: &Rc<RefCell<Option<Snapshot>>>,
) -> Result<GameEngine, GameError> {
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(game_index)),
        None => StdRng::from_entropy(),
    };

    let sink = Rc::clone(sink);
    let observer: LifecycleObserver = Box::new(move |lifecycle, snapshot| {
        info!(
            "game over ({lifecycle:?}) after {} tick(s), length {}",
            snapshot.tick_count,
            snapshot.snake.len()
        );
        if let Ok(json) = serde_json::to_string(snapshot) {
            debug!("final state {json}");
        }
        *sink.borrow_mut() = Some(snapshot.clone());
    });

    GameEngine::with_rng(config.board, config.apples, rng, Some(observer))
}
