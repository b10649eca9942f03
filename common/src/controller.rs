use crate::audit::audit;
use crate::board::{Board, Cell, GameStatus, Location};
use crate::inference::{BombMarks, FullyRevealed, refresh_bombs, refresh_fully_revealed};
use crate::queue::OpenQueue;
use crate::risk::least_risky;
use crate::safe::find_safe;
use crate::service::GameService;
use crate::snapshot::BoardSnapshot;

/// Where a [`Solver`] is in its play-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingInitialMove,
    /// Bomb inference to fixpoint, then the fully revealed cache.
    Propagating,
    /// Opening queued cells one at a time.
    Draining,
    SafeScan,
    Guessing,
    Terminal(GameStatus),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverOptions {
    /// Cross-check every safe scan with the SAT audit.
    pub audit: bool,
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    pub status: GameStatus,
    /// Deduced bombs that the final board confirms as mines.
    pub mines_found: usize,
    pub mines_total: usize,
    pub moves: usize,
    pub guesses: usize,
    pub audit_failures: usize,
}

impl GameResult {
    pub fn mines_found_ratio(&self) -> f64 {
        if self.mines_total == 0 {
            return 0.0;
        }
        self.mines_found as f64 / self.mines_total as f64
    }
}

/// Plays one game against a [`GameService`].
///
/// The solver never extends the service's snapshot. It keeps the last one
/// next to its own state: the bomb marks, the fully revealed cache and the
/// queue of cells to open. All of it lives and dies with this value.
pub struct Solver {
    game_id: String,
    /// The last board exactly as the service reported it.
    raw: Board,
    /// `raw` with the bomb marks overlaid; every scan reads this one.
    board: Board,
    marks: BombMarks,
    fully_revealed: FullyRevealed,
    queue: OpenQueue,
    phase: Phase,
    options: SolverOptions,
    moves: usize,
    guesses: usize,
    audit_failures: usize,
}

impl Solver {
    pub fn new(snapshot: BoardSnapshot) -> anyhow::Result<Self> {
        Self::with_options(snapshot, SolverOptions::default())
    }

    pub fn with_options(snapshot: BoardSnapshot, options: SolverOptions) -> anyhow::Result<Self> {
        let raw = snapshot.board()?;
        let status = snapshot.status()?;
        let phase = if status.is_terminal() {
            Phase::Terminal(status)
        } else {
            Phase::AwaitingInitialMove
        };

        Ok(Solver {
            game_id: snapshot.game_id,
            board: raw.clone(),
            raw,
            marks: BombMarks::new(),
            fully_revealed: FullyRevealed::new(),
            queue: OpenQueue::new(),
            phase,
            options,
            moves: 0,
            guesses: 0,
            audit_failures: 0,
        })
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The working board, with deduced bombs marked.
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn bomb_marks(&self) -> &BombMarks {
        &self.marks
    }

    pub fn fully_revealed(&self) -> &FullyRevealed {
        &self.fully_revealed
    }

    /// Plays until the game ends. Service failures end the game with an error.
    pub fn play(mut self, service: &mut impl GameService) -> anyhow::Result<GameResult> {
        loop {
            if let Phase::Terminal(_) = self.step(service)? {
                return Ok(self.result());
            }
        }
    }

    /// Advances by one state and returns the new one. Terminal is absorbing.
    pub fn step(&mut self, service: &mut impl GameService) -> anyhow::Result<Phase> {
        self.phase = match self.phase {
            Phase::AwaitingInitialMove => {
                // The first move is never a mine.
                self.queue.enqueue(self.board.center());
                Phase::Propagating
            }
            Phase::Propagating => {
                refresh_bombs(&mut self.board, &mut self.marks, &self.fully_revealed);
                refresh_fully_revealed(&self.board, &mut self.fully_revealed);
                Phase::Draining
            }
            Phase::Draining => match self.queue.dequeue(&self.board) {
                Some(loc) => self.open(service, loc)?,
                None => Phase::SafeScan,
            },
            Phase::SafeScan => {
                let safe = find_safe(&self.board, &self.marks, &self.fully_revealed);
                if self.options.audit {
                    self.run_audit(&safe);
                }
                for loc in safe {
                    self.queue.enqueue(loc);
                }
                if self.queue.is_empty() {
                    Phase::Guessing
                } else {
                    Phase::Draining
                }
            }
            Phase::Guessing => match least_risky(&self.board, &self.marks, &self.fully_revealed) {
                Some((loc, risk)) => {
                    log::debug!("{}: guessing {loc} with risk {risk}", self.game_id);
                    self.guesses += 1;
                    self.queue.enqueue(loc);
                    Phase::Draining
                }
                None => {
                    log::debug!("{}: nothing left to rank", self.game_id);
                    service.abandon(&self.game_id);
                    Phase::Terminal(GameStatus::Unsure)
                }
            },
            Phase::Terminal(status) => Phase::Terminal(status),
        };
        Ok(self.phase)
    }

    fn open(&mut self, service: &mut impl GameService, loc: Location) -> anyhow::Result<Phase> {
        log::debug!("{}: turn {}, opening {loc}", self.game_id, self.moves);
        let snapshot = service.open(&self.game_id, loc)?;
        self.moves += 1;

        let status = snapshot.status()?;
        self.raw = snapshot.board()?;
        self.board = self.raw.clone();
        self.board.overlay_bombs(self.marks.iter());

        if status.is_terminal() {
            log::debug!("{}: finished as {status}", self.game_id);
            return Ok(Phase::Terminal(status));
        }
        if self.raw.contains(loc) && self.raw.is_unknown(loc) {
            anyhow::bail!("service left {loc} unopened in game {}", self.game_id);
        }
        Ok(Phase::Propagating)
    }

    fn run_audit(&mut self, safe: &[Location]) {
        let mines: Vec<Location> = self.marks.iter().copied().collect();
        match audit(&self.raw, &mines, safe) {
            Ok(report) if !report.is_sound() => {
                log::warn!("{}: unproven deductions {report:?}", self.game_id);
                self.audit_failures += report.failures();
            }
            Ok(_) => {}
            Err(err) => log::warn!("{}: audit skipped: {err}", self.game_id),
        }
    }

    /// The result so far. `status` stays `InProgress` until the game ends.
    pub fn result(&self) -> GameResult {
        let status = match self.phase {
            Phase::Terminal(status) => status,
            _ => GameStatus::InProgress,
        };
        let mines_found = self
            .marks
            .iter()
            .filter(|&&loc| self.raw.contains(loc) && self.raw.get(loc) == Cell::MarkedBomb)
            .count();

        GameResult {
            status,
            mines_found,
            mines_total: self.raw.mines_total(),
            moves: self.moves,
            guesses: self.guesses,
            audit_failures: self.audit_failures,
        }
    }
}

/// Starts a new game on `service` and plays it to the end.
pub fn play_game(service: &mut impl GameService, options: SolverOptions) -> anyhow::Result<GameResult> {
    let snapshot = service.new_game()?;
    Solver::with_options(snapshot, options)?.play(service)
}

/// A one-off recommendation for a single board.
#[derive(Debug, Clone, PartialEq)]
pub enum Advice {
    /// Cells certain to be safe, row-major.
    Safe(Vec<Location>),
    Guess { at: Location, risk: f64 },
    Stuck,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Advisory {
    /// Every bomb the board proves, in discovery order.
    pub bombs: Vec<Location>,
    pub advice: Advice,
}

/// Runs the same deductions as a [`Solver`] turn on a board without history:
/// bombs to fixpoint, then safe cells, then the least risky guess.
pub fn advise(board: &Board) -> Advisory {
    let mut working = board.clone();
    let mut marks: BombMarks = board
        .locations()
        .filter(|&loc| board.get(loc) == Cell::MarkedBomb)
        .collect();
    let mut fully_revealed = FullyRevealed::new();

    let bombs = refresh_bombs(&mut working, &mut marks, &fully_revealed);
    refresh_fully_revealed(&working, &mut fully_revealed);

    let safe = find_safe(&working, &marks, &fully_revealed);
    let advice = if !safe.is_empty() {
        Advice::Safe(safe)
    } else if board.locations().all(|loc| !board.is_unknown(loc)) {
        Advice::Stuck
    } else if board.numbered().next().is_none() {
        // Nothing revealed yet: open the centre like a fresh game does.
        Advice::Guess {
            at: board.center(),
            risk: 0.0,
        }
    } else {
        match least_risky(&working, &marks, &fully_revealed) {
            Some((at, risk)) => Advice::Guess { at, risk },
            None => Advice::Stuck,
        }
    };

    Advisory { bombs, advice }
}
