use std::collections::BTreeSet;

use crate::board::{Board, Location};
use crate::inference::{BombMarks, FullyRevealed};

/// Unknown cells proven safe: neighbours of a numbered cell that already sees
/// all of its bombs. Returned row-major by triggering cell, without repeats.
///
/// `board` must carry the marks overlaid, as after
/// [`refresh_bombs`](crate::inference::refresh_bombs).
pub fn find_safe(board: &Board, marks: &BombMarks, fully_revealed: &FullyRevealed) -> Vec<Location> {
    let mut seen = BTreeSet::new();
    let mut safe = Vec::new();

    for (at, count) in board.numbered() {
        if fully_revealed.contains(&at) {
            continue;
        }
        if board.bombs_around(at).len() != count as usize {
            continue;
        }
        for loc in board.unknowns_around(at) {
            if !marks.contains(&loc) && seen.insert(loc) {
                safe.push(loc);
            }
        }
    }

    safe
}
