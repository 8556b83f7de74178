use anyhow::{anyhow, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rayon::prelude::*;

use connect4_engine::{transposition_table::DEFAULT_CAPACITY, *};

mod render;

/// Plays the alpha-beta solver against Monte-Carlo tree search
#[derive(Parser, Debug)]
#[command(name = "connect4_selfplay")]
struct Args {
    /// Number of games to play, the solver moves first in every even game
    #[arg(short, long, default_value_t = 10)]
    games: usize,

    /// Alpha-beta search depth in plies
    #[arg(short, long, default_value_t = 8)]
    depth: u32,

    /// MCTS rollouts per root expansion
    #[arg(short, long, default_value_t = 500)]
    simulations: u32,

    /// Seed for MCTS, game `i` uses `seed + i`
    #[arg(long)]
    seed: Option<u64>,

    /// Transposition table slots of each solver
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    table_capacity: usize,

    /// Draw the final position of the first game
    #[arg(long)]
    show_board: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Outcome {
    AlphaBeta,
    Mcts,
    Draw,
}

struct GameRecord {
    outcome: Outcome,
    board: BitBoard,
}

fn play_game(index: usize, args: &Args) -> Result<GameRecord> {
    let alpha_beta_first = index % 2 == 0;

    let mut solver = Solver::with_config(
        SolverConfig::default()
            .with_depth(args.depth)
            .with_table_capacity(args.table_capacity),
    );
    let mut mcts_config = MctsConfig::default().with_simulations(args.simulations);
    if let Some(seed) = args.seed {
        mcts_config = mcts_config.with_seed(seed.wrapping_add(index as u64));
    }
    let mut mcts = MctsEngine::new(mcts_config);

    let mut board = BitBoard::new();
    let outcome = loop {
        if board.is_winning_state() {
            let alpha_beta_won = (board.last_mover() == 0) == alpha_beta_first;
            break if alpha_beta_won {
                Outcome::AlphaBeta
            } else {
                Outcome::Mcts
            };
        }
        if board.is_full() {
            break Outcome::Draw;
        }

        let alpha_beta_to_move = (board.current_player() == 0) == alpha_beta_first;
        let column = if alpha_beta_to_move {
            solver.best_move(&mut board)
        } else {
            mcts.search(&board).best_column()
        }
        .ok_or_else(|| anyhow!("no move offered in an unfinished game:\n{}", board))?;

        board.play(column)?;
    };

    debug!(
        "game {} ({} first): {:?} after {} moves",
        index,
        if alpha_beta_first { "alpha-beta" } else { "mcts" },
        outcome,
        board.move_count()
    );
    Ok(GameRecord { outcome, board })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!(
        "playing {} games: alpha-beta depth {} against mcts with {} rollouts per expansion",
        args.games, args.depth, args.simulations
    );

    let progress = ProgressBar::new(args.games as u64);
    progress.set_style(ProgressStyle::default_bar().template("{bar:40} {pos}/{len} games ({eta})"));

    // every game owns its own solver and table
    let records = (0..args.games)
        .into_par_iter()
        .map(|index| {
            let record = play_game(index, &args);
            progress.inc(1);
            record
        })
        .collect::<Result<Vec<_>>>()?;
    progress.finish_and_clear();

    let count = |outcome: Outcome| records.iter().filter(|r| r.outcome == outcome).count();
    info!(
        "alpha-beta wins: {}, mcts wins: {}, draws: {}",
        count(Outcome::AlphaBeta),
        count(Outcome::Mcts),
        count(Outcome::Draw)
    );

    if args.show_board {
        if let Some(record) = records.first() {
            render::display(&record.board)?;
        }
    }
    Ok(())
}
