mod board;
mod types;

pub use board::{Board, COLS, ROWS};
pub use types::{Cell, GameMove, GameState, Player};
