use minesweeper_bot::render::board_to_string;
use minesweeper_bot::*;
use std::collections::BTreeMap;
use std::sync::mpsc;
use threadpool::ThreadPool;

const USAGE: &str = "usage: minesweeper-bot [--games N] [--jobs N] [--width N] [--height N] \
[--mines N] [--seed N] [--audit] [--verbose]";

#[derive(Debug, Clone, Copy, PartialEq)]
struct BotConfig {
    games: usize,
    jobs: usize,
    board: LocalConfig,
    /// Worker `i` seeds its service with `seed + i`.
    seed: Option<u64>,
    audit: bool,
    verbose: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        BotConfig {
            games: 100,
            jobs: 4,
            board: LocalConfig::default(),
            seed: None,
            audit: false,
            verbose: false,
        }
    }
}

impl BotConfig {
    fn from_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut config = BotConfig::default();
        let mut args = args.into_iter();

        while let Some(flag) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| anyhow::anyhow!("{flag} needs a value\n{USAGE}"))
            };
            match flag.as_str() {
                "--games" => config.games = value()?.parse()?,
                "--jobs" => config.jobs = value()?.parse()?,
                "--width" => config.board.width = value()?.parse()?,
                "--height" => config.board.height = value()?.parse()?,
                "--mines" => config.board.mines = value()?.parse()?,
                "--seed" => config.seed = Some(value()?.parse()?),
                "--audit" => config.audit = true,
                "--verbose" => config.verbose = true,
                other => anyhow::bail!("unknown argument {other:?}\n{USAGE}"),
            }
        }

        if config.jobs == 0 {
            anyhow::bail!("--jobs must be at least 1");
        }
        config.board.validate()?;
        Ok(config)
    }
}

/// Outcome counts over all games played.
#[derive(Debug, Default)]
struct Tally {
    by_status: BTreeMap<GameStatus, usize>,
    /// Games per number of correctly deduced mines.
    by_mines_found: BTreeMap<usize, usize>,
    found_ratio_sum: f64,
    failed: usize,
}

impl Tally {
    fn record(&mut self, result: &GameResult) {
        *self.by_status.entry(result.status).or_default() += 1;
        *self.by_mines_found.entry(result.mines_found).or_default() += 1;
        self.found_ratio_sum += result.mines_found_ratio();
    }

    fn played(&self) -> usize {
        self.by_status.values().sum()
    }

    fn summary(&self) -> String {
        let counts: Vec<String> = self
            .by_status
            .iter()
            .map(|(status, count)| format!("{status}: {count}"))
            .collect();
        format!("{{{}}}", counts.join(", "))
    }

    fn print_progress_stats(&self) {
        println!("progress in games");
        for (found, games) in &self.by_mines_found {
            println!("Mines found: {found}, games: {games}");
        }
        if self.played() > 0 {
            println!(
                "Average share of mines found: {:.1}%",
                100.0 * self.found_ratio_sum / self.played() as f64
            );
        }
        if self.failed > 0 {
            println!("Games abandoned on service errors: {}", self.failed);
        }
    }
}

/// Plays one game step by step so the final board can be shown.
fn play_one(service: &mut LocalService, options: SolverOptions, verbose: bool) -> anyhow::Result<GameResult> {
    let mut solver = Solver::with_options(service.new_game()?, options)?;
    while !matches!(solver.step(service)?, Phase::Terminal(_)) {}

    let result = solver.result();
    if verbose {
        println!("{} ended {}:\n{}", solver.game_id(), result.status, board_to_string(solver.board()));
    }
    Ok(result)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = BotConfig::from_args(std::env::args().skip(1))?;

    println!("--- Autonomous Minesweeper Bot ---");
    println!(
        "Playing {} games on {}x{} boards with {} mines, {} at a time.",
        config.games, config.board.width, config.board.height, config.board.mines, config.jobs
    );

    let options = SolverOptions { audit: config.audit };
    let pool = ThreadPool::new(config.jobs);
    let (tx, rx) = mpsc::channel();

    // Each worker owns its service and plays its share of the games.
    for job in 0..config.jobs {
        let share = config.games / config.jobs + usize::from(job < config.games % config.jobs);
        if share == 0 {
            continue;
        }
        let tx = tx.clone();
        pool.execute(move || {
            let service = match config.seed {
                Some(seed) => LocalService::with_seed(config.board, seed + job as u64),
                None => LocalService::new(config.board),
            };
            let mut service = match service {
                Ok(service) => service,
                Err(err) => {
                    let _ = tx.send(Err(err));
                    return;
                }
            };
            for _ in 0..share {
                if tx.send(play_one(&mut service, options, config.verbose)).is_err() {
                    return;
                }
            }
        });
    }
    drop(tx);

    let mut tally = Tally::default();
    let mut audit_failures = 0;
    for outcome in rx {
        match outcome {
            Ok(result) => {
                tally.record(&result);
                audit_failures += result.audit_failures;
                println!(
                    "game {}: {} ({}/{} mines found, {} moves, {} guesses) {}",
                    tally.played(),
                    result.status,
                    result.mines_found,
                    result.mines_total,
                    result.moves,
                    result.guesses,
                    tally.summary()
                );
            }
            Err(err) => {
                tally.failed += 1;
                eprintln!("game abandoned: {err:#}");
            }
        }
    }
    pool.join();

    println!("\n--- Results ---");
    println!("{}", tally.summary());
    tally.print_progress_stats();
    if config.audit {
        println!("Unproven deductions: {audit_failures}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_config() {
        let config = BotConfig::from_args(Vec::new()).unwrap();
        assert_eq!(config, BotConfig::default());
    }

    #[test]
    fn test_parse_flags() {
        let config = BotConfig::from_args(args(&[
            "--games", "10", "--jobs", "2", "--width", "9", "--height", "8", "--mines", "10",
            "--seed", "7", "--audit",
        ]))
        .unwrap();
        assert_eq!(config.games, 10);
        assert_eq!(config.jobs, 2);
        assert_eq!(config.board, LocalConfig { width: 9, height: 8, mines: 10 });
        assert_eq!(config.seed, Some(7));
        assert!(config.audit);
        assert!(!config.verbose);
    }

    #[test]
    fn test_rejects_bad_flags() {
        assert!(BotConfig::from_args(args(&["--games"])).is_err());
        assert!(BotConfig::from_args(args(&["--games", "many"])).is_err());
        assert!(BotConfig::from_args(args(&["--fast"])).is_err());
        assert!(BotConfig::from_args(args(&["--jobs", "0"])).is_err());
        assert!(BotConfig::from_args(args(&["--width", "3", "--height", "3", "--mines", "9"])).is_err());
    }

    #[test]
    fn test_tally_counts() {
        let mut tally = Tally::default();
        let won = GameResult {
            status: GameStatus::Won,
            mines_found: 4,
            mines_total: 4,
            moves: 10,
            guesses: 1,
            audit_failures: 0,
        };
        let lost = GameResult {
            status: GameStatus::Lost,
            mines_found: 0,
            ..won
        };
        tally.record(&won);
        tally.record(&lost);
        tally.record(&won);
        assert_eq!(tally.played(), 3);
        assert_eq!(tally.summary(), "{won: 2, lost: 1}");
        assert_eq!(tally.by_mines_found[&4], 2);
        assert_eq!(tally.by_mines_found[&0], 1);
    }

    #[test]
    fn test_play_one_seeded() {
        let mut service = LocalService::with_seed(LocalConfig { width: 9, height: 9, mines: 10 }, 3).unwrap();
        let result = play_one(&mut service, SolverOptions::default(), false).unwrap();
        assert!(result.status.is_terminal());
        assert_eq!(result.mines_total, 10);
    }
}
