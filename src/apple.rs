use rand::Rng;

use crate::config::BoardSize;
use crate::snake::{Position, Snake};

/// Number of cells that are neither snake nor apple, by count alone.
#[must_use]
pub fn free_cell_count(board: BoardSize, snake: &Snake, apples: &[Position]) -> usize {
    board
        .total_cells()
        .saturating_sub(apples.len())
        .saturating_sub(snake.len())
}

/// Picks a uniformly random cell that holds neither a snake segment nor an
/// apple.
///
/// Returns `None` when the board is saturated. Free cells are enumerated
/// exactly, so this always terminates and finds a cell whenever one exists.
#[must_use]
pub fn place_apple<R: Rng + ?Sized>(
    rng: &mut R,
    board: BoardSize,
    snake: &Snake,
    apples: &[Position],
) -> Option<Position> {
    if free_cell_count(board, snake, apples) < 1 {
        return None;
    }

    let mut candidates = Vec::new();
    for y in 0..i32::from(board.height()) {
        for x in 0..i32::from(board.width()) {
            let position = Position { x, y };
            if !snake.occupies(position) && !apples.contains(&position) {
                candidates.push(position);
            }
        }
    }

    if candidates.is_empty() {
        return None;
    }

    let index = rng.gen_range(0..candidates.len());
    Some(candidates[index])
}
