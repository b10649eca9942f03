use std::collections::BTreeSet;

use crate::board::{Board, Location};

/// Locations deduced to hold a mine. Only ever grows within a game.
pub type BombMarks = BTreeSet<Location>;

/// Locations with no unknown cell around them. A cache: recomputing it from
/// the board and marks always gives the same set.
pub type FullyRevealed = BTreeSet<Location>;

/// Proves new mines from a single numbered cell.
///
/// `board` is the working copy, with every mark in `marks` already overlaid.
/// Scans numbered cells outside `fully_revealed` row-major and returns the
/// unknown neighbours of the first cell whose count can only be met by all of
/// them being mines. Counts are trusted: a cell that cannot be reconciled
/// simply never triggers.
pub fn infer_bombs(board: &Board, marks: &BombMarks, fully_revealed: &FullyRevealed) -> Vec<Location> {
    for (at, count) in board.numbered() {
        if fully_revealed.contains(&at) {
            continue;
        }
        let count = count as usize;
        let visible_bombs = board.bombs_around(at);
        if visible_bombs.len() == count {
            continue;
        }

        let unknowns: Vec<Location> = board
            .unknowns_around(at)
            .into_iter()
            .filter(|loc| !marks.contains(loc))
            .collect();
        if !unknowns.is_empty() && unknowns.len() + visible_bombs.len() == count {
            log::trace!("{at} needs {count} bombs, all of {unknowns:?} must be mines");
            return unknowns;
        }
    }
    Vec::new()
}

/// Runs [`infer_bombs`] to a fixpoint, recording every proven mine in `marks`
/// and on `board`. Returns the newly found mines in discovery order.
pub fn refresh_bombs(board: &mut Board, marks: &mut BombMarks, fully_revealed: &FullyRevealed) -> Vec<Location> {
    let mut found = Vec::new();
    board.overlay_bombs(marks.iter());

    loop {
        let new_bombs = infer_bombs(board, marks, fully_revealed);
        if new_bombs.is_empty() {
            break;
        }
        for loc in new_bombs {
            if marks.insert(loc) {
                log::debug!("found new bomb at {loc}");
                found.push(loc);
            }
        }
        board.overlay_bombs(marks.iter());
    }

    found
}

/// Adds every location whose neighbourhood no longer holds an unknown cell.
pub fn refresh_fully_revealed(board: &Board, fully_revealed: &mut FullyRevealed) {
    for at in board.locations() {
        if fully_revealed.contains(&at) {
            continue;
        }
        if board.unknowns_around(at).is_empty() {
            fully_revealed.insert(at);
        }
    }
}
