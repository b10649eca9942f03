use std::collections::{HashMap, HashSet, VecDeque};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::board::{Board, Cell, GameStatus, Location};
use crate::snapshot::BoardSnapshot;

/// The game server as the solver sees it: one call to start a game and one
/// blocking call per opened cell. Every call answers with the whole board.
pub trait GameService {
    fn new_game(&mut self) -> anyhow::Result<BoardSnapshot>;
    fn open(&mut self, game_id: &str, at: Location) -> anyhow::Result<BoardSnapshot>;

    /// Tells the service the player walked away from an unfinished game.
    fn abandon(&mut self, _game_id: &str) {}
}

/// Dimensions and mine count of the games a [`LocalService`] creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalConfig {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
}

impl Default for LocalConfig {
    fn default() -> Self {
        LocalConfig {
            width: 16,
            height: 16,
            mines: 40,
        }
    }
}

impl LocalConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.width == 0 || self.height == 0 {
            anyhow::bail!("board must have at least one cell, got {}x{}", self.width, self.height);
        }
        let Some(cells) = self.width.checked_mul(self.height) else {
            anyhow::bail!("a {}x{} board is too large", self.width, self.height);
        };
        // The first opened cell is always safe.
        if self.mines >= cells {
            anyhow::bail!(
                "{} mines do not fit a {}x{} board with a safe first move",
                self.mines,
                self.width,
                self.height
            );
        }
        Ok(())
    }
}

/// One game held by the local service. Mines are placed on the first open so
/// that the first move never loses.
struct LocalGame {
    visible: Board,
    mines: Option<HashSet<Location>>,
    status: GameStatus,
}

/// In-process game server with real, fixed mine layouts.
pub struct LocalService {
    config: LocalConfig,
    rng: StdRng,
    games: HashMap<String, LocalGame>,
    next_id: u64,
}

impl LocalService {
    pub fn new(config: LocalConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self::with_rng(config, StdRng::from_os_rng()))
    }

    /// A service whose mine layouts are reproducible.
    pub fn with_seed(config: LocalConfig, seed: u64) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self::with_rng(config, StdRng::seed_from_u64(seed)))
    }

    fn with_rng(config: LocalConfig, rng: StdRng) -> Self {
        LocalService {
            config,
            rng,
            games: HashMap::new(),
            next_id: 0,
        }
    }

    /// Starts a game with a known mine layout instead of a random one.
    pub fn new_game_with_mines(&mut self, mines: impl IntoIterator<Item = Location>) -> anyhow::Result<BoardSnapshot> {
        let mines: HashSet<Location> = mines.into_iter().collect();
        let visible = Board::new(self.config.width, self.config.height, mines.len());
        if let Some(outside) = mines.iter().find(|&&loc| !visible.contains(loc)) {
            anyhow::bail!("mine {outside} lies outside the board");
        }
        if mines.len() >= visible.cells().len() {
            anyhow::bail!("{} mines leave no safe cell", mines.len());
        }

        let game = LocalGame {
            visible,
            mines: Some(mines),
            status: GameStatus::InProgress,
        };
        Ok(self.insert(game))
    }

    fn insert(&mut self, game: LocalGame) -> BoardSnapshot {
        self.next_id += 1;
        let game_id = format!("local-{}", self.next_id);
        let snapshot = game.snapshot(&game_id);
        self.games.insert(game_id, game);
        snapshot
    }

    /// Picks mine positions away from the first click and its neighbours,
    /// shrinking the safe zone to the click alone on very crowded boards.
    fn place_mines(config: LocalConfig, rng: &mut StdRng, first: Location) -> HashSet<Location> {
        let board = Board::new(config.width, config.height, config.mines);
        let mut safe_zone: HashSet<Location> = board.neighbors(first).collect();
        safe_zone.insert(first);
        if board.locations().filter(|loc| !safe_zone.contains(loc)).count() < config.mines {
            safe_zone = HashSet::from([first]);
        }

        let mut candidates: Vec<Location> = board
            .locations()
            .filter(|loc| !safe_zone.contains(loc))
            .collect();
        candidates.shuffle(rng);
        candidates.truncate(config.mines);
        candidates.into_iter().collect()
    }
}

impl GameService for LocalService {
    fn new_game(&mut self) -> anyhow::Result<BoardSnapshot> {
        let game = LocalGame {
            visible: Board::new(self.config.width, self.config.height, self.config.mines),
            mines: None,
            status: GameStatus::InProgress,
        };
        Ok(self.insert(game))
    }

    fn open(&mut self, game_id: &str, at: Location) -> anyhow::Result<BoardSnapshot> {
        let config = self.config;
        let game = self
            .games
            .get_mut(game_id)
            .ok_or_else(|| anyhow::anyhow!("no such game: {game_id}"))?;

        if !game.visible.contains(at) {
            anyhow::bail!("{at} is outside the {}x{} board", config.width, config.height);
        }
        if game.mines.is_none() {
            game.mines = Some(Self::place_mines(config, &mut self.rng, at));
        }

        game.reveal(at);
        let snapshot = game.snapshot(game_id);
        // Finished games are not kept; later moves on them get "no such game".
        if game.status.is_terminal() {
            self.games.remove(game_id);
        }
        Ok(snapshot)
    }

    fn abandon(&mut self, game_id: &str) {
        self.games.remove(game_id);
    }
}

impl LocalGame {
    fn reveal(&mut self, at: Location) {
        let Some(mines) = self.mines.as_ref() else {
            return;
        };
        if !self.visible.is_unknown(at) {
            return;
        }
        if mines.contains(&at) {
            self.status = GameStatus::Lost;
            self.show_mines();
            return;
        }

        // Cascade through zero cells.
        let mut queue = VecDeque::from([at]);
        let mut visited = HashSet::from([at]);
        while let Some(loc) = queue.pop_front() {
            if !self.visible.is_unknown(loc) {
                continue;
            }
            let count = self.visible.neighbors(loc).filter(|n| mines.contains(n)).count();
            self.visible.set(loc, Cell::Revealed(count as u8));

            if count == 0 {
                for neighbor in self.visible.neighbors(loc) {
                    if self.visible.is_unknown(neighbor) && visited.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        let hidden = self.visible.cells().iter().filter(|&&c| c == Cell::Unknown).count();
        if hidden == mines.len() {
            self.status = GameStatus::Won;
            self.show_mines();
        }
    }

    fn show_mines(&mut self) {
        if let Some(mines) = &self.mines {
            for &loc in mines {
                self.visible.set(loc, Cell::MarkedBomb);
            }
        }
    }

    fn snapshot(&self, game_id: &str) -> BoardSnapshot {
        BoardSnapshot::from_board(game_id, &self.visible, self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(width: usize, height: usize, mines: usize) -> LocalConfig {
        LocalConfig { width, height, mines }
    }

    #[test]
    fn test_config_validation() {
        assert!(config(0, 5, 1).validate().is_err());
        assert!(config(3, 3, 9).validate().is_err());
        assert!(config(3, 3, 8).validate().is_ok());
        assert!(config(usize::MAX, 2, 1).validate().is_err());
        assert!(LocalConfig::default().validate().is_ok());
    }

    #[test]
    fn test_new_game_is_hidden() {
        let mut service = LocalService::with_seed(config(5, 4, 3), 1).unwrap();
        let snap = service.new_game().unwrap();
        assert_eq!(snap.board_width, 5);
        assert_eq!(snap.board_height, 4);
        assert_eq!(snap.mines_count, 3);
        assert!(snap.board_state.iter().all(|t| t == "?"));
        assert_eq!(snap.status().unwrap(), GameStatus::InProgress);
        assert_ne!(service.new_game().unwrap().game_id, snap.game_id);
    }

    #[test]
    fn test_first_move_is_always_safe() {
        for seed in 0..20 {
            let mut service = LocalService::with_seed(config(5, 5, 10), seed).unwrap();
            let snap = service.new_game().unwrap();
            let after = service.open(&snap.game_id, Location::new(2, 2)).unwrap();
            assert_ne!(after.status().unwrap(), GameStatus::Lost);
            assert!(matches!(
                after.board().unwrap().get(Location::new(2, 2)),
                Cell::Revealed(_)
            ));
        }
    }

    #[test]
    fn test_crowded_board_still_spares_first_click() {
        let mut service = LocalService::with_seed(config(3, 3, 8), 9).unwrap();
        let snap = service.new_game().unwrap();
        let after = service.open(&snap.game_id, Location::new(1, 1)).unwrap();
        assert_eq!(after.board_state[4], "8");
        assert_eq!(after.status().unwrap(), GameStatus::Won);
    }

    #[test]
    fn test_zero_cascades_and_wins() {
        let mut service = LocalService::with_seed(config(4, 1, 1), 0).unwrap();
        let snap = service.new_game_with_mines([Location::new(3, 0)]).unwrap();
        let after = service.open(&snap.game_id, Location::new(0, 0)).unwrap();
        assert_eq!(after.board_state, vec!["0", "0", "1", "*"]);
        assert_eq!(after.status, "won");
    }

    #[test]
    fn test_opening_a_mine_loses_and_shows_mines() {
        let mut service = LocalService::with_seed(config(3, 1, 2), 0).unwrap();
        let snap = service
            .new_game_with_mines([Location::new(0, 0), Location::new(2, 0)])
            .unwrap();
        let after = service.open(&snap.game_id, Location::new(2, 0)).unwrap();
        assert_eq!(after.status().unwrap(), GameStatus::Lost);
        assert_eq!(after.board_state, vec!["*", "?", "*"]);

        let again = service.open(&snap.game_id, Location::new(1, 0));
        assert!(again.is_err());
    }

    #[test]
    fn test_fixed_layout_reports_its_own_mine_count() {
        let mut service = LocalService::with_seed(config(4, 4, 5), 0).unwrap();
        let snap = service
            .new_game_with_mines([Location::new(0, 0), Location::new(3, 3)])
            .unwrap();
        assert_eq!(snap.mines_count, 2);

        let after = service.open(&snap.game_id, Location::new(1, 1)).unwrap();
        assert_eq!(after.mines_count, 2);
        assert_eq!(after.board().unwrap().mines_total(), 2);
    }

    #[test]
    fn test_finished_and_abandoned_games_are_dropped() {
        let mut service = LocalService::with_seed(config(9, 9, 10), 5).unwrap();
        for _ in 0..50 {
            let result = crate::controller::play_game(&mut service, Default::default()).unwrap();
            assert!(result.status.is_terminal());
        }
        assert!(service.games.is_empty());

        let snap = service.new_game().unwrap();
        assert_eq!(service.games.len(), 1);
        service.abandon(&snap.game_id);
        assert!(service.games.is_empty());
        assert!(service.open(&snap.game_id, Location::new(0, 0)).is_err());
    }

    #[test]
    fn test_bad_requests_are_errors() {
        let mut service = LocalService::with_seed(config(3, 3, 1), 0).unwrap();
        let snap = service.new_game().unwrap();
        assert!(service.open("nope", Location::new(0, 0)).is_err());
        assert!(service.open(&snap.game_id, Location::new(3, 0)).is_err());
        assert!(service.new_game_with_mines([Location::new(5, 5)]).is_err());
    }
}
