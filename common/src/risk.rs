use std::collections::BTreeMap;

use crate::board::{Board, Location};
use crate::inference::{BombMarks, FullyRevealed};

/// Accumulated risk per unknown location, ordered row-major.
pub type RiskMap = BTreeMap<Location, f64>;

/// Scores every unknown cell that borders an unsettled numbered cell.
///
/// Each numbered cell spreads its missing bombs evenly over its unknown
/// neighbours, `(count - visible) / unknowns`, and contributions from
/// different cells are summed. The total is a ranking heuristic, not a
/// probability: a cell squeezed between several constraints scores above 1.
pub fn risk_map(board: &Board, marks: &BombMarks, fully_revealed: &FullyRevealed) -> RiskMap {
    let mut risks = RiskMap::new();

    for (at, count) in board.numbered() {
        if fully_revealed.contains(&at) {
            continue;
        }
        let unknowns: Vec<Location> = board
            .unknowns_around(at)
            .into_iter()
            .filter(|loc| !marks.contains(loc))
            .collect();
        if unknowns.is_empty() {
            continue;
        }

        let missing = count as f64 - board.bombs_around(at).len() as f64;
        let additional_risk = missing / unknowns.len() as f64;
        for loc in unknowns {
            log::trace!("new risk from cell {at} for cell {loc}: {additional_risk}");
            *risks.entry(loc).or_insert(0.0) += additional_risk;
        }
    }

    risks
}

/// The unknown cell with the lowest accumulated risk, with that risk.
///
/// Ties go to the lowest `(y, x)`. `None` when no numbered cell borders an
/// unknown one, i.e. there is nothing to rank.
pub fn least_risky(board: &Board, marks: &BombMarks, fully_revealed: &FullyRevealed) -> Option<(Location, f64)> {
    let risks = risk_map(board, marks, fully_revealed);
    log::debug!("bomb risks {risks:?}");

    let mut best: Option<(Location, f64)> = None;
    for (loc, risk) in risks {
        match best {
            Some((_, least)) if risk >= least => {}
            _ => best = Some((loc, risk)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;

    #[test]
    fn test_shared_neighbor_risk_is_summed() {
        // [?, 1, A, 1, ?]: each 1 splits its bomb over two unknowns.
        let board = Board::from_cells(
            5,
            1,
            1,
            vec![
                Cell::Unknown,
                Cell::Revealed(1),
                Cell::Unknown,
                Cell::Revealed(1),
                Cell::Unknown,
            ],
        )
        .unwrap();
        let risks = risk_map(&board, &BombMarks::new(), &FullyRevealed::new());
        assert_eq!(risks[&Location::new(2, 0)], 1.0);
        assert_eq!(risks[&Location::new(0, 0)], 0.5);
        assert_eq!(risks[&Location::new(4, 0)], 0.5);
    }

    #[test]
    fn test_overlapping_constraints_compound() {
        //   1 1 1
        //   A 2 ?
        let board = Board::from_cells(
            3,
            2,
            1,
            vec![
                Cell::Revealed(1), Cell::Revealed(1), Cell::Revealed(1),
                Cell::Unknown, Cell::Revealed(2), Cell::Unknown,
            ],
        )
        .unwrap();
        let risks = risk_map(&board, &BombMarks::new(), &FullyRevealed::new());
        // (0,0) sees only A=(0,1); (1,0) sees both unknowns; (2,0) sees only (2,1);
        // (1,1) is a 2 over both unknowns.
        assert_eq!(risks[&Location::new(0, 1)], 1.0 + 0.5 + 1.0);
        assert_eq!(risks[&Location::new(2, 1)], 1.0 + 0.5 + 1.0);
    }

    #[test]
    fn test_additive_not_normalised() {
        // A is the only unknown of two separate 1s; B is the only unknown of one 1.
        //   1 A 1 . 1 B
        let board = Board::from_cells(
            6,
            1,
            2,
            vec![
                Cell::Revealed(1),
                Cell::Unknown,
                Cell::Revealed(1),
                Cell::Revealed(0),
                Cell::Revealed(1),
                Cell::Unknown,
            ],
        )
        .unwrap();
        let risks = risk_map(&board, &BombMarks::new(), &FullyRevealed::new());
        assert_eq!(risks[&Location::new(1, 0)], 2.0);
        assert_eq!(risks[&Location::new(5, 0)], 1.0);
        assert!(risks[&Location::new(1, 0)] > risks[&Location::new(5, 0)]);

        let (loc, risk) = least_risky(&board, &BombMarks::new(), &FullyRevealed::new()).unwrap();
        assert_eq!(loc, Location::new(5, 0));
        assert_eq!(risk, 1.0);
    }

    #[test]
    fn test_ties_break_row_major() {
        let board = Board::from_cells(
            3,
            3,
            1,
            vec![
                Cell::Unknown, Cell::Unknown, Cell::Unknown,
                Cell::Unknown, Cell::Revealed(1), Cell::Unknown,
                Cell::Unknown, Cell::Unknown, Cell::Unknown,
            ],
        )
        .unwrap();
        for _ in 0..5 {
            let (loc, risk) = least_risky(&board, &BombMarks::new(), &FullyRevealed::new()).unwrap();
            assert_eq!(loc, Location::new(0, 0));
            assert_eq!(risk, 0.125);
        }
    }

    #[test]
    fn test_isolated_unknowns_are_not_ranked() {
        let board = Board::from_cells(
            3,
            1,
            1,
            vec![Cell::Unknown, Cell::MarkedBomb, Cell::Revealed(1)],
        )
        .unwrap();
        let marks = BombMarks::from([Location::new(1, 0)]);
        assert!(risk_map(&board, &marks, &FullyRevealed::new()).is_empty());
        assert!(least_risky(&board, &marks, &FullyRevealed::new()).is_none());
    }

    #[test]
    fn test_fully_revealed_cells_contribute_nothing() {
        let board =
            Board::from_cells(2, 1, 1, vec![Cell::Revealed(1), Cell::Unknown]).unwrap();
        let skip = FullyRevealed::from([Location::new(0, 0)]);
        assert!(least_risky(&board, &BombMarks::new(), &skip).is_none());
    }
}
