//! Exact cross-check of the rule-based deductions.
//!
//! The board's revealed counts are encoded as a SAT problem over the unknown
//! cells. A claimed mine is proven when the formula becomes unsatisfiable
//! under the assumption that the cell is safe, and the other way around for a
//! claimed safe cell.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

use crate::board::{Board, Cell, Location};

/// Deductions the SAT check could not confirm.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub unsound_mines: Vec<Location>,
    pub unsound_safe: Vec<Location>,
}

impl AuditReport {
    pub fn is_sound(&self) -> bool {
        self.unsound_mines.is_empty() && self.unsound_safe.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.unsound_mines.len() + self.unsound_safe.len()
    }
}

/// Checks claimed mines and safe cells against `board`.
///
/// `board` is the server's view: marked bombs on it are taken as confirmed and
/// must not include the solver's own deductions. Errors when the counts on
/// the board cannot all hold at once.
pub fn audit(board: &Board, mines: &[Location], safe: &[Location]) -> anyhow::Result<AuditReport> {
    let mut solver = Solver::new();
    let mut formula = CnfFormula::new();
    let mut vars: BTreeMap<Location, Var> = BTreeMap::new();

    for (at, count) in board.numbered() {
        let unknowns = board.unknowns_around(at);
        let confirmed = board.bombs_around(at).len();
        let Some(required) = (count as usize).checked_sub(confirmed) else {
            anyhow::bail!("{at} shows {count} but touches {confirmed} confirmed mines");
        };

        let lits: Vec<Lit> = unknowns
            .iter()
            .map(|&loc| Lit::from_var(*vars.entry(loc).or_insert_with(|| solver.new_var()), true))
            .collect();
        encode_exactly(&mut formula, &lits, required);
    }

    // Claims off the frontier get a free variable and can never be proven.
    let claimed: BTreeSet<Location> = mines.iter().chain(safe).copied().collect();
    for &loc in &claimed {
        if board.contains(loc) && board.is_unknown(loc) {
            vars.entry(loc).or_insert_with(|| solver.new_var());
        }
    }

    solver.add_formula(&formula);
    if !solver.solve()? {
        anyhow::bail!("solve_fail");
    }

    let mut report = AuditReport::default();
    for &loc in mines {
        let proven = match cell_at(board, loc) {
            Some(Cell::MarkedBomb) => true,
            Some(Cell::Unknown) => !possible(&mut solver, Lit::from_var(vars[&loc], false))?,
            _ => false,
        };
        if !proven {
            report.unsound_mines.push(loc);
        }
    }
    for &loc in safe {
        let proven = match cell_at(board, loc) {
            Some(Cell::Revealed(_)) => true,
            Some(Cell::Unknown) => !possible(&mut solver, Lit::from_var(vars[&loc], true))?,
            _ => false,
        };
        if !proven {
            report.unsound_safe.push(loc);
        }
    }

    Ok(report)
}

fn cell_at(board: &Board, loc: Location) -> Option<Cell> {
    board.contains(loc).then(|| board.get(loc))
}

/// Whether the formula stays satisfiable with `lit` assumed.
fn possible(solver: &mut Solver<'_>, lit: Lit) -> anyhow::Result<bool> {
    solver.assume(&[lit]);
    let result = solver.solve();
    solver.assume(&[]);
    Ok(result?)
}

/// Exactly `k` of `lits` are true. A cell has at most eight unknown
/// neighbours, so the direct combination encoding stays small.
fn encode_exactly(formula: &mut CnfFormula, lits: &[Lit], k: usize) {
    if k > lits.len() {
        formula.add_clause(&[]);
        return;
    }
    // At most k: no k + 1 of them are all true.
    if k < lits.len() {
        for combo in lits.iter().copied().combinations(k + 1) {
            let clause: Vec<Lit> = combo.iter().map(|&lit| !lit).collect();
            formula.add_clause(&clause);
        }
    }
    // At least k: any n - k + 1 of them contain a true one.
    if k > 0 {
        for combo in lits.iter().copied().combinations(lits.len() - k + 1) {
            formula.add_clause(&combo);
        }
    }
}
