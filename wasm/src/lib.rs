use minesweeper_bot as ms;
use wasm_bindgen::prelude::*;

/// A fresh, all-hidden snapshot as BCS bytes.
#[wasm_bindgen]
pub fn create_board(width: usize, height: usize, mines: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    ms::LocalConfig { width, height, mines }
        .validate()
        .map_err(|e| e.to_string())?;
    let board = ms::Board::new(width, height, mines);
    ms::BoardSnapshot::from_board("", &board, ms::GameStatus::InProgress)
        .serialize()
        .map_err(|e| e.to_string())
}

/// Recommends the next move for a BCS-encoded snapshot.
///
/// Returns flat `i32`s: a kind tag (`0` safe, `1` guess, `2` stuck), the
/// number of bombs `n`, then `n` bomb `x, y` pairs, then the move `x, y`
/// pairs (every safe cell, or the single guess).
#[wasm_bindgen]
pub fn advise(bts: Vec<u8>) -> Result<Vec<i32>, String> {
    console_error_panic_hook::set_once();

    let snapshot = ms::BoardSnapshot::deserialize(&bts).map_err(|e| e.to_string())?;
    let board = snapshot.board().map_err(|e| e.to_string())?;
    let advisory = ms::advise(&board);

    let (kind, moves) = match advisory.advice {
        ms::Advice::Safe(cells) => (0, cells),
        ms::Advice::Guess { at, .. } => (1, vec![at]),
        ms::Advice::Stuck => (2, Vec::new()),
    };

    let mut out = vec![kind, advisory.bombs.len() as i32];
    for loc in advisory.bombs.iter().chain(&moves) {
        out.push(loc.x as i32);
        out.push(loc.y as i32);
    }
    Ok(out)
}

/// The snapshot's cells as `-1` (hidden), `-2` (mine) or the revealed count.
#[wasm_bindgen]
pub fn get_cells(bts: Vec<u8>) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let snapshot = ms::BoardSnapshot::deserialize(&bts).map_err(|e| e.to_string())?;
    let board = snapshot.board().map_err(|e| e.to_string())?;
    Ok(board
        .cells()
        .iter()
        .map(|cell| match cell {
            ms::Cell::Unknown => -1,
            ms::Cell::MarkedBomb => -2,
            ms::Cell::Revealed(n) => *n as i8,
        })
        .collect())
}
