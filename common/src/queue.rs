use std::collections::{HashSet, VecDeque};

use crate::board::{Board, Location};

/// Pending opens, first in first out, each location at most once.
#[derive(Debug, Default, Clone)]
pub struct OpenQueue {
    order: VecDeque<Location>,
    pending: HashSet<Location>,
}

impl OpenQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `loc` unless it is already waiting. Returns whether it was added.
    pub fn enqueue(&mut self, loc: Location) -> bool {
        if !self.pending.insert(loc) {
            return false;
        }
        self.order.push_back(loc);
        true
    }

    /// Pops the oldest location that is still unknown on `board`. Entries the
    /// board has resolved since they were queued are dropped on the way.
    pub fn dequeue(&mut self, board: &Board) -> Option<Location> {
        while let Some(loc) = self.order.pop_front() {
            self.pending.remove(&loc);
            if board.contains(loc) && board.is_unknown(loc) {
                return Some(loc);
            }
            log::trace!("skipping stale open at {loc}");
        }
        None
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
