use std::io::{self, Write};

use crate::board::{Board, Cell, Location};

const TOP_LEFT: char = '\u{250c}';
const TOP_RIGHT: char = '\u{2510}';
const BOTTOM_LEFT: char = '\u{2514}';
const BOTTOM_RIGHT: char = '\u{2518}';
const HORIZONTAL: char = '\u{2500}';
const VERTICAL: char = '\u{2502}';

/// Draws the board in a box, with a column ruler above and below and row
/// numbers on both sides.
pub fn write_board(w: &mut impl Write, board: &Board) -> io::Result<()> {
    let rule: String = std::iter::repeat_n(HORIZONTAL, board.width() * 2).collect();

    write_ruler(w, board.width())?;
    writeln!(w, "  {TOP_LEFT}{rule}{TOP_RIGHT}")?;
    for y in 0..board.height() {
        write!(w, "{y:2}{VERTICAL}")?;
        for x in 0..board.width() {
            write!(w, "{} ", symbol(board.get(Location::new(x, y))))?;
        }
        writeln!(w, "{VERTICAL}{y}")?;
    }
    writeln!(w, "  {BOTTOM_LEFT}{rule}{BOTTOM_RIGHT}")?;
    write_ruler(w, board.width())
}

/// The board as a string, for logs.
pub fn board_to_string(board: &Board) -> String {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_board(&mut out, board);
    String::from_utf8_lossy(&out).into_owned()
}

fn write_ruler(w: &mut impl Write, width: usize) -> io::Result<()> {
    write!(w, "  ")?;
    for x in 0..width {
        if x % 10 == 0 {
            write!(w, "{} ", x / 10)?;
        } else {
            write!(w, ". ")?;
        }
    }
    writeln!(w)
}

fn symbol(cell: Cell) -> char {
    match cell {
        Cell::Unknown => '?',
        Cell::MarkedBomb => '*',
        Cell::Revealed(0) => ' ',
        Cell::Revealed(n) => char::from_digit(u32::from(n), 10).unwrap_or('#'),
    }
}
