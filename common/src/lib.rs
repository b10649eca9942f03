//! A bot that plays minesweeper against a game service.
//!
//! Each game is driven by a [`Solver`]: it proves bombs and safe cells from the
//! revealed counts, opens the safe ones one at a time, and falls back to the
//! least risky guess when nothing is certain.

pub mod audit;
pub mod board;
pub mod controller;
pub mod inference;
pub mod queue;
pub mod render;
pub mod risk;
pub mod safe;
pub mod service;
pub mod snapshot;

pub use board::{Board, Cell, GameStatus, Location};
pub use controller::{Advice, Advisory, GameResult, Phase, Solver, SolverOptions, advise, play_game};
pub use inference::{BombMarks, FullyRevealed};
pub use queue::OpenQueue;
pub use service::{GameService, LocalConfig, LocalService};
pub use snapshot::{BoardSnapshot, SnapshotError};
