use std::fmt;

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::apple::{free_cell_count, place_apple};
use crate::config::BoardSize;
use crate::error::GameError;
use crate::input::Vector2;
use crate::snake::{Position, Snake, Velocity};

/// Running/dead status of one game. Both dead states are terminal.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum Lifecycle {
    Running,
    DeadByBody,
    DeadByOutOfBounds,
}

impl Lifecycle {
    #[must_use]
    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    #[must_use]
    pub fn is_dead(self) -> bool {
        !self.is_running()
    }
}

/// Number of distinct cells a snake of `segments` stored segments covers.
///
/// A body death stores the fatal head on top of the segment it hit.
fn played_length(segments: usize, lifecycle: Lifecycle) -> usize {
    match lifecycle {
        Lifecycle::DeadByBody => segments.saturating_sub(1),
        Lifecycle::Running | Lifecycle::DeadByOutOfBounds => segments,
    }
}

/// Read-only copy of the engine state, handed to renderers and observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub board: BoardSize,
    pub snake: Vec<Position>,
    pub apples: Vec<Position>,
    pub velocity: Velocity,
    pub lifecycle: Lifecycle,
    pub tick_count: u64,
}

impl Snapshot {
    /// Snake length as a player counts it, without the fatal duplicate head.
    #[must_use]
    pub fn length(&self) -> usize {
        played_length(self.snake.len(), self.lifecycle)
    }
}

/// Callback fired once when the lifecycle leaves [`Lifecycle::Running`].
///
/// It only sees a snapshot, so it cannot tick the engine that notified it.
pub type LifecycleObserver = Box<dyn FnMut(Lifecycle, &Snapshot)>;

/// Authoritative snake simulation: board, body, apples and lifecycle.
///
/// The engine never sleeps or reads devices. A driver calls [`tick`] at its
/// own cadence and reads the accessors to draw a frame.
///
/// [`tick`]: GameEngine::tick
pub struct GameEngine<R = StdRng> {
    board: BoardSize,
    snake: Snake,
    apples: Vec<Position>,
    velocity: Velocity,
    lifecycle: Lifecycle,
    tick_count: u64,
    rng: R,
    observer: Option<LifecycleObserver>,
}

impl GameEngine<StdRng> {
    /// Creates an engine seeded from OS entropy.
    pub fn new(board: BoardSize, apple_count: usize) -> Result<Self, GameError> {
        Self::with_rng(board, apple_count, StdRng::from_entropy(), None)
    }

    /// Creates a deterministic engine for tests and reproducible runs.
    pub fn new_with_seed(board: BoardSize, apple_count: usize, seed: u64) -> Result<Self, GameError> {
        Self::with_rng(board, apple_count, StdRng::seed_from_u64(seed), None)
    }
}

impl<R: Rng> GameEngine<R> {
    /// Creates an engine with a one-cell snake at the board center heading
    /// right, and `apple_count` apples placed one at a time.
    pub fn with_rng(
        board: BoardSize,
        apple_count: usize,
        rng: R,
        observer: Option<LifecycleObserver>,
    ) -> Result<Self, GameError> {
        let snake = Snake::new(board.center());
        let too_small = GameError::BoardTooSmall {
            width: board.width(),
            height: board.height(),
            apples: apple_count,
        };
        if apple_count > free_cell_count(board, &snake, &[]) {
            return Err(too_small);
        }

        let mut engine = Self {
            board,
            snake,
            apples: Vec::with_capacity(apple_count),
            velocity: Velocity::RIGHT,
            lifecycle: Lifecycle::Running,
            tick_count: 0,
            rng,
            observer,
        };

        for _ in 0..apple_count {
            let apple = place_apple(&mut engine.rng, engine.board, &engine.snake, &engine.apples)
                .ok_or_else(|| too_small.clone())?;
            engine.apples.push(apple);
        }

        Ok(engine)
    }

    /// Restores a running engine from an explicit layout.
    ///
    /// `segments` lists the body head first. The layout must satisfy every
    /// board invariant: segments and apples in bounds, no shared cells, and a
    /// non-zero velocity.
    pub fn from_layout(
        board: BoardSize,
        segments: Vec<Position>,
        velocity: Velocity,
        apples: Vec<Position>,
        rng: R,
        observer: Option<LifecycleObserver>,
    ) -> Result<Self, GameError> {
        let snake = Snake::from_segments(segments)
            .ok_or_else(|| GameError::InvalidLayout("snake needs at least one segment".into()))?;

        if velocity.is_zero() {
            return Err(GameError::InvalidLayout("velocity must be non-zero".into()));
        }
        if let Some(segment) = snake.segments().find(|segment| !board.contains(**segment)) {
            return Err(GameError::InvalidLayout(format!(
                "segment ({}, {}) is outside the {board} board",
                segment.x, segment.y
            )));
        }
        if snake.has_duplicates() {
            return Err(GameError::InvalidLayout("snake segments overlap".into()));
        }
        for (index, apple) in apples.iter().enumerate() {
            if !board.contains(*apple) {
                return Err(GameError::InvalidLayout(format!(
                    "apple ({}, {}) is outside the {board} board",
                    apple.x, apple.y
                )));
            }
            if snake.occupies(*apple) || apples[..index].contains(apple) {
                return Err(GameError::InvalidLayout(format!(
                    "apple ({}, {}) shares a cell",
                    apple.x, apple.y
                )));
            }
        }

        Ok(Self {
            board,
            snake,
            apples,
            velocity,
            lifecycle: Lifecycle::Running,
            tick_count: 0,
            rng,
            observer,
        })
    }

    /// Advances the simulation by one step.
    ///
    /// `input` is an optional steering vector. A zero vector or a direct
    /// reversal keeps the current velocity. Malformed input fails with
    /// [`GameError::InvalidDirection`] before any state changes. Ticking a
    /// dead engine is a no-op. Returns the lifecycle after the step.
    pub fn tick(&mut self, input: Option<Vector2>) -> Result<Lifecycle, GameError> {
        if !self.lifecycle.is_running() {
            return Ok(self.lifecycle);
        }

        if let Some(raw) = input {
            let requested = Velocity::try_from(raw)?;
            if !requested.is_zero() && requested != self.velocity.reversed() {
                self.velocity = requested;
            }
        }

        self.tick_count += 1;
        let next_head = self.snake.head().offset(self.velocity);

        // Self-collision wins over bounds. The fatal head stays in the body so
        // the collision is visible.
        if self.snake.occupies(next_head) {
            self.snake.push_head(next_head);
            self.transition_to(Lifecycle::DeadByBody);
            return Ok(self.lifecycle);
        }

        if !self.board.contains(next_head) {
            self.transition_to(Lifecycle::DeadByOutOfBounds);
            return Ok(self.lifecycle);
        }

        self.snake.push_head(next_head);

        if let Some(index) = self.apples.iter().position(|apple| *apple == next_head) {
            self.apples.remove(index);
            match place_apple(&mut self.rng, self.board, &self.snake, &self.apples) {
                Some(apple) => {
                    trace!("apple eaten at {next_head:?}, replacement at {apple:?}");
                    self.apples.push(apple);
                }
                None => debug!(
                    "apple eaten at {next_head:?}, board saturated, {} apple(s) left",
                    self.apples.len()
                ),
            }
        } else {
            self.snake.pop_tail();
        }

        Ok(self.lifecycle)
    }

    /// Moves the lifecycle to `next` and notifies the observer.
    fn transition_to(&mut self, next: Lifecycle) {
        if self.lifecycle == next {
            return;
        }

        debug!(
            "lifecycle {:?} -> {next:?} after {} tick(s), length {}",
            self.lifecycle,
            self.tick_count,
            self.snake.len()
        );
        self.lifecycle = next;

        if let Some(mut observer) = self.observer.take() {
            let snapshot = self.snapshot();
            observer(next, &snapshot);
            self.observer = Some(observer);
        }
    }
}

impl<R> GameEngine<R> {
    #[must_use]
    pub fn board(&self) -> BoardSize {
        self.board
    }

    #[must_use]
    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    #[must_use]
    pub fn apples(&self) -> &[Position] {
        &self.apples
    }

    #[must_use]
    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Number of ticks processed while running.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Distinct cells covered by the snake. After a body death this is one
    /// less than `snake().len()`.
    #[must_use]
    pub fn length(&self) -> usize {
        played_length(self.snake.len(), self.lifecycle)
    }

    /// Copies the observable state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board,
            snake: self.snake.segments().copied().collect(),
            apples: self.apples.clone(),
            velocity: self.velocity,
            lifecycle: self.lifecycle,
            tick_count: self.tick_count,
        }
    }
}

impl<R> fmt::Debug for GameEngine<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameEngine")
            .field("board", &self.board)
            .field("snake", &self.snake)
            .field("apples", &self.apples)
            .field("velocity", &self.velocity)
            .field("lifecycle", &self.lifecycle)
            .field("tick_count", &self.tick_count)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::config::BoardSize;
    use crate::error::GameError;
    use crate::input::{Direction, Vector2};
    use crate::snake::{Position, Velocity};

    use super::{GameEngine, Lifecycle, LifecycleObserver};

    fn board(width: u16, height: u16) -> BoardSize {
        BoardSize::new(width, height).expect("test board should be valid")
    }

    fn layout(
        board: BoardSize,
        segments: Vec<Position>,
        velocity: Velocity,
        apples: Vec<Position>,
    ) -> GameEngine {
        GameEngine::from_layout(
            board,
            segments,
            velocity,
            apples,
            StdRng::seed_from_u64(99),
            None,
        )
        .expect("test layout should be valid")
    }

    fn steer(direction: Direction) -> Option<Vector2> {
        Some(direction.into())
    }

    #[test]
    fn snake_starts_centered_heading_right() {
        for (width, height) in [(5, 5), (4, 7), (1, 1), (30, 15), (2, 9)] {
            let engine = GameEngine::new_with_seed(board(width, height), 0, 1).unwrap();

            assert_eq!(engine.snake().len(), 1);
            assert_eq!(
                engine.snake().head(),
                Position::new(i32::from(width / 2), i32::from(height / 2))
            );
            assert_eq!(engine.velocity(), Velocity::RIGHT);
            assert_eq!(engine.lifecycle(), Lifecycle::Running);
        }
    }

    #[test]
    fn construction_places_requested_apples_on_free_cells() {
        let engine = GameEngine::new_with_seed(board(30, 15), 5, 8).unwrap();

        assert_eq!(engine.apples().len(), 5);
        for (index, apple) in engine.apples().iter().enumerate() {
            assert!(engine.board().contains(*apple));
            assert!(!engine.snake().occupies(*apple));
            assert!(!engine.apples()[..index].contains(apple));
        }
    }

    #[test]
    fn construction_fails_when_apples_do_not_fit() {
        assert!(matches!(
            GameEngine::new_with_seed(board(1, 1), 1, 0),
            Err(GameError::BoardTooSmall { apples: 1, .. })
        ));
        assert!(GameEngine::new_with_seed(board(1, 2), 1, 0).is_ok());
        assert!(GameEngine::new_with_seed(board(1, 2), 2, 0).is_err());
        assert!(GameEngine::new_with_seed(board(1, 1), 0, 0).is_ok());
    }

    #[test]
    fn leaving_the_board_marks_out_of_bounds_without_appending_head() {
        let mut engine = GameEngine::new_with_seed(board(5, 5), 0, 0).unwrap();
        assert_eq!(engine.snake().head(), Position::new(2, 2));

        assert_eq!(engine.tick(None), Ok(Lifecycle::Running));
        assert_eq!(engine.snake().head(), Position::new(3, 2));
        assert_eq!(engine.tick(None), Ok(Lifecycle::Running));
        assert_eq!(engine.snake().head(), Position::new(4, 2));

        assert_eq!(engine.tick(None), Ok(Lifecycle::DeadByOutOfBounds));
        assert_eq!(engine.snake().len(), 1);
        assert_eq!(engine.snake().head(), Position::new(4, 2));

        assert_eq!(engine.tick(None), Ok(Lifecycle::DeadByOutOfBounds));
        assert_eq!(engine.snake().head(), Position::new(4, 2));
    }

    #[test]
    fn eating_an_apple_grows_the_snake_and_replaces_the_apple() {
        let mut engine = layout(
            board(3, 3),
            vec![Position::new(1, 2)],
            Velocity::RIGHT,
            vec![Position::new(2, 2)],
        );

        engine.tick(None).unwrap();

        assert_eq!(engine.lifecycle(), Lifecycle::Running);
        assert_eq!(engine.snake().len(), 2);
        assert_eq!(engine.snake().head(), Position::new(2, 2));
        assert_eq!(engine.snake().tail(), Position::new(1, 2));
        assert_eq!(engine.apples().len(), 1);
        let apple = engine.apples()[0];
        assert!(engine.board().contains(apple));
        assert!(!engine.snake().occupies(apple));
    }

    #[test]
    fn sliding_keeps_length_and_translates_by_velocity() {
        let mut engine = layout(
            board(20, 5),
            vec![Position::new(3, 2), Position::new(2, 2), Position::new(1, 2)],
            Velocity::RIGHT,
            Vec::new(),
        );

        for step in 1..=10 {
            engine.tick(None).unwrap();
            assert_eq!(engine.snake().len(), 3);
            assert_eq!(engine.snake().head(), Position::new(3 + step, 2));
            assert_eq!(engine.snake().tail(), Position::new(1 + step, 2));
        }
    }

    #[test]
    fn reversal_is_rejected() {
        let mut engine = GameEngine::new_with_seed(board(9, 9), 0, 0).unwrap();

        engine.tick(Some(Vector2::new(-1.0, 0.0))).unwrap();

        assert_eq!(engine.velocity(), Velocity::RIGHT);
        assert_eq!(engine.snake().head(), Position::new(5, 4));
    }

    #[test]
    fn zero_vector_keeps_velocity() {
        let mut engine = GameEngine::new_with_seed(board(9, 9), 0, 0).unwrap();
        engine.tick(steer(Direction::Down)).unwrap();

        engine.tick(Some(Vector2::new(0.0, 0.0))).unwrap();

        assert_eq!(engine.velocity(), Velocity::DOWN);
        assert_eq!(engine.snake().head(), Position::new(4, 6));
    }

    #[test]
    fn perpendicular_turn_is_applied_before_moving() {
        let mut engine = GameEngine::new_with_seed(board(9, 9), 0, 0).unwrap();

        engine.tick(steer(Direction::Up)).unwrap();

        assert_eq!(engine.velocity(), Velocity::UP);
        assert_eq!(engine.snake().head(), Position::new(4, 3));
    }

    #[test]
    fn diagonal_input_fails_without_changing_state() {
        let mut engine = GameEngine::new_with_seed(board(9, 9), 3, 4).unwrap();
        let before = engine.snapshot();

        assert_eq!(
            engine.tick(Some(Vector2::new(1.0, 1.0))),
            Err(GameError::InvalidDirection { x: 1.0, y: 1.0 })
        );
        assert!(engine.tick(Some(Vector2::new(0.0, 2.0))).is_err());

        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn self_collision_keeps_the_fatal_head() {
        // Hook shape: head at (1,1) moving left, (1,2) is a mid-body segment.
        let mut engine = layout(
            board(6, 6),
            vec![
                Position::new(1, 1),
                Position::new(2, 1),
                Position::new(2, 2),
                Position::new(1, 2),
                Position::new(0, 2),
            ],
            Velocity::LEFT,
            Vec::new(),
        );

        assert_eq!(engine.tick(steer(Direction::Down)), Ok(Lifecycle::DeadByBody));

        assert_eq!(engine.snake().len(), 6);
        assert_eq!(engine.snake().head(), Position::new(1, 2));
        assert!(engine.snake().has_duplicates());
    }

    #[test]
    fn moving_into_the_current_tail_cell_is_fatal() {
        let mut engine = layout(
            board(4, 4),
            vec![
                Position::new(1, 0),
                Position::new(1, 1),
                Position::new(0, 1),
                Position::new(0, 0),
            ],
            Velocity::UP,
            Vec::new(),
        );

        assert_eq!(engine.tick(steer(Direction::Left)), Ok(Lifecycle::DeadByBody));
        assert_eq!(engine.snake().head(), Position::new(0, 0));
        assert_eq!(engine.snake().len(), 5);
    }

    #[test]
    fn ticking_a_dead_engine_is_a_no_op() {
        let mut engine = layout(board(2, 1), vec![Position::new(1, 0)], Velocity::RIGHT, Vec::new());
        engine.tick(None).unwrap();
        let dead = engine.snapshot();

        assert_eq!(engine.tick(steer(Direction::Left)), Ok(Lifecycle::DeadByOutOfBounds));
        // Even malformed input is ignored once dead.
        assert_eq!(
            engine.tick(Some(Vector2::new(1.0, 1.0))),
            Ok(Lifecycle::DeadByOutOfBounds)
        );
        assert_eq!(engine.snapshot(), dead);
    }

    #[test]
    fn saturated_board_shrinks_the_apple_count() {
        let mut engine = layout(
            board(3, 1),
            vec![Position::new(0, 0)],
            Velocity::RIGHT,
            vec![Position::new(1, 0), Position::new(2, 0)],
        );

        engine.tick(None).unwrap();
        assert_eq!(engine.snake().len(), 2);
        assert_eq!(engine.apples(), &[Position::new(2, 0)]);

        engine.tick(None).unwrap();
        assert_eq!(engine.snake().len(), 3);
        assert!(engine.apples().is_empty());
        assert_eq!(engine.lifecycle(), Lifecycle::Running);

        assert_eq!(engine.tick(None), Ok(Lifecycle::DeadByOutOfBounds));
    }

    #[test]
    fn observer_fires_once_with_the_dead_state() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let observer: LifecycleObserver = Box::new(move |state, snapshot| {
            sink.borrow_mut().push((state, snapshot.lifecycle, snapshot.snake.len()));
        });
        let mut engine = GameEngine::with_rng(
            board(3, 3),
            0,
            StdRng::seed_from_u64(0),
            Some(observer),
        )
        .unwrap();

        engine.tick(None).unwrap();
        assert!(calls.borrow().is_empty());

        engine.tick(None).unwrap();
        engine.tick(None).unwrap();
        engine.tick(None).unwrap();

        assert_eq!(
            *calls.borrow(),
            vec![(Lifecycle::DeadByOutOfBounds, Lifecycle::DeadByOutOfBounds, 1)]
        );
    }

    #[test]
    fn snapshot_serializes_for_logging() {
        let engine = GameEngine::new_with_seed(board(5, 4), 1, 2).unwrap();

        let json = serde_json::to_value(engine.snapshot()).unwrap();

        assert_eq!(json["board"]["width"], 5);
        assert_eq!(json["snake"][0]["x"], 2);
        assert_eq!(json["velocity"]["x"], 1);
        assert_eq!(json["lifecycle"], "Running");
        assert_eq!(json["apples"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn length_ignores_the_fatal_head_after_a_body_death() {
        let segments = vec![
            Position::new(1, 0),
            Position::new(1, 1),
            Position::new(0, 1),
            Position::new(0, 0),
        ];
        let mut engine = GameEngine::from_layout(
            board(3, 3),
            segments,
            Velocity::DOWN,
            Vec::new(),
            StdRng::seed_from_u64(0),
            None,
        )
        .unwrap();
        assert_eq!(engine.length(), 4);

        assert_eq!(engine.tick(None), Ok(Lifecycle::DeadByBody));
        assert_eq!(engine.snake().len(), 5);
        assert_eq!(engine.length(), 4);
        assert_eq!(engine.snapshot().length(), 4);
    }

    #[test]
    fn layout_rejects_broken_invariants() {
        let rng = || StdRng::seed_from_u64(0);
        let b = board(4, 4);
        let one = vec![Position::new(1, 1)];

        let cases = [
            (Vec::new(), Velocity::RIGHT, Vec::new()),
            (one.clone(), Velocity::ZERO, Vec::new()),
            (vec![Position::new(4, 0)], Velocity::RIGHT, Vec::new()),
            (
                vec![Position::new(1, 1), Position::new(1, 1)],
                Velocity::RIGHT,
                Vec::new(),
            ),
            (one.clone(), Velocity::RIGHT, vec![Position::new(1, 1)]),
            (one.clone(), Velocity::RIGHT, vec![Position::new(0, -1)]),
            (
                one.clone(),
                Velocity::RIGHT,
                vec![Position::new(2, 2), Position::new(2, 2)],
            ),
        ];

        for (segments, velocity, apples) in cases {
            assert!(matches!(
                GameEngine::from_layout(b, segments, velocity, apples, rng(), None),
                Err(GameError::InvalidLayout(_))
            ));
        }
    }

    #[test]
    fn random_play_preserves_board_invariants() {
        let directions = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

        for seed in 0..40 {
            let mut driver = StdRng::seed_from_u64(1_000 + seed);
            let mut engine = GameEngine::new_with_seed(board(6, 5), 3, seed).unwrap();

            for _ in 0..300 {
                let before = engine.snake().len();
                let apples_before = engine.apples().to_vec();
                let input = match driver.gen_range(0..6usize) {
                    0 => None,
                    1 => Some(Vector2::new(0.0, 0.0)),
                    n => steer(directions[n - 2]),
                };

                engine.tick(input).unwrap();
                assert_invariants(&engine);

                if !engine.lifecycle().is_running() {
                    break;
                }
                let ate = apples_before.contains(&engine.snake().head());
                assert_eq!(engine.snake().len(), before + usize::from(ate));
            }
        }
    }

    fn assert_invariants(engine: &GameEngine) {
        let board = engine.board();
        let segments: Vec<_> = engine.snake().segments().copied().collect();

        match engine.lifecycle() {
            Lifecycle::Running | Lifecycle::DeadByOutOfBounds => {
                assert!(segments.iter().all(|segment| board.contains(*segment)));
                assert!(!engine.snake().has_duplicates());
                assert!(segments.len() + engine.apples().len() <= board.total_cells());
            }
            Lifecycle::DeadByBody => {
                let head = segments[0];
                assert_eq!(segments[1..].iter().filter(|s| **s == head).count(), 1);
                let rest = crate::snake::Snake::from_segments(segments[1..].to_vec()).unwrap();
                assert!(!rest.has_duplicates());
            }
        }

        for (index, apple) in engine.apples().iter().enumerate() {
            assert!(board.contains(*apple));
            assert!(!engine.snake().occupies(*apple));
            assert!(!engine.apples()[..index].contains(apple));
        }
    }
}
