use crate::board::{Board, Cell, GameStatus};

/// The board state as the game service reports it after every move.
///
/// Cells are row-major tokens: `"?"` for unknown, `"*"` for a confirmed mine,
/// and `"0"`..`"8"` for a revealed neighbour count. The status is empty while
/// the game is running, then `"won"` or `"lost"`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoardSnapshot {
    pub game_id: String,
    pub board_width: usize,
    pub board_height: usize,
    pub mines_count: usize,
    pub board_state: Vec<String>,
    pub status: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("board has {actual} cells but {width}x{height} needs {expected}")]
    SizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unrecognised cell token {token:?} at offset {offset}")]
    BadCell { offset: usize, token: String },
    #[error("unrecognised game status {0:?}")]
    BadStatus(String),
    #[error("malformed snapshot bytes: {0}")]
    Encoding(#[from] bcs::Error),
}

pub const UNKNOWN_TOKEN: &str = "?";
pub const MINE_TOKEN: &str = "*";

impl BoardSnapshot {
    /// Encodes a board. Marked bombs are written as confirmed mines.
    pub fn from_board(game_id: impl Into<String>, board: &Board, status: GameStatus) -> Self {
        BoardSnapshot {
            game_id: game_id.into(),
            board_width: board.width(),
            board_height: board.height(),
            mines_count: board.mines_total(),
            board_state: board.cells().iter().map(|&cell| encode_cell(cell)).collect(),
            status: encode_status(status).to_string(),
        }
    }

    /// Decodes the cell tokens into a typed board.
    pub fn board(&self) -> Result<Board, SnapshotError> {
        let size_mismatch = |expected| SnapshotError::SizeMismatch {
            width: self.board_width,
            height: self.board_height,
            expected,
            actual: self.board_state.len(),
        };
        // Dimensions too large to multiply can never match the cell list.
        let expected = self
            .board_width
            .checked_mul(self.board_height)
            .ok_or_else(|| size_mismatch(usize::MAX))?;
        if self.board_state.len() != expected {
            return Err(size_mismatch(expected));
        }

        let cells = self
            .board_state
            .iter()
            .enumerate()
            .map(|(offset, token)| {
                decode_cell(token).ok_or_else(|| SnapshotError::BadCell {
                    offset,
                    token: token.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Board::from_cells(self.board_width, self.board_height, self.mines_count, cells)
            .ok_or_else(|| size_mismatch(expected))
    }

    pub fn status(&self) -> Result<GameStatus, SnapshotError> {
        match self.status.as_str() {
            "" => Ok(GameStatus::InProgress),
            "won" => Ok(GameStatus::Won),
            "lost" => Ok(GameStatus::Lost),
            other => Err(SnapshotError::BadStatus(other.to_string())),
        }
    }

    /// Deserializes a snapshot from BCS bytes.
    pub fn deserialize(bts: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bcs::from_bytes(bts)?)
    }

    /// Serializes the snapshot to BCS bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bcs::to_bytes(self)?)
    }
}

fn decode_cell(token: &str) -> Option<Cell> {
    match token {
        UNKNOWN_TOKEN => Some(Cell::Unknown),
        MINE_TOKEN => Some(Cell::MarkedBomb),
        _ => match token.parse::<u8>() {
            Ok(count) if count <= 8 => Some(Cell::Revealed(count)),
            _ => None,
        },
    }
}

fn encode_cell(cell: Cell) -> String {
    match cell {
        Cell::Unknown => UNKNOWN_TOKEN.to_string(),
        Cell::MarkedBomb => MINE_TOKEN.to_string(),
        Cell::Revealed(count) => count.to_string(),
    }
}

fn encode_status(status: GameStatus) -> &'static str {
    match status {
        GameStatus::Won => "won",
        GameStatus::Lost => "lost",
        // The service has no word for a solver giving up.
        GameStatus::InProgress | GameStatus::Unsure => "",
    }
}
