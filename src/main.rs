//! Command-line driver: searches one position and prints the chosen move.
//!
//! Progress lines go to stdout once per completed depth; set `RUST_LOG` for
//! the engine's own logging.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use chess_search::{
    CacheStrategy, Engine, Evaluator, Game, HashKey, KeyPair, Move, Position, PvSource, SearchConfig,
    SearchLimits, ZobristKeys, MAX_DEPTH, START_FEN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// Full-width negamax, nothing else
    Negamax,
    AlphaBeta,
    /// Alpha-beta with hash, PV, killer and history ordering
    Ordered,
    /// Ordered plus quiescence
    Quiescent,
    /// Everything, including hash cutoffs
    Full,
}

impl Preset {
    fn config(self) -> SearchConfig {
        match self {
            Preset::Negamax => SearchConfig::negamax(),
            Preset::AlphaBeta => SearchConfig::alpha_beta(),
            Preset::Ordered => SearchConfig::ordered(),
            Preset::Quiescent => SearchConfig::quiescent(),
            Preset::Full => SearchConfig::full(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EvalChoice {
    Material,
    PieceSquare,
}

#[derive(Parser, Debug)]
#[command(name = "chess_search", about = "Search a chess position and print the best move")]
struct Args {
    /// Position to search
    #[arg(long, default_value = START_FEN)]
    fen: String,

    /// Maximum depth in plies
    #[arg(long, default_value_t = 6)]
    depth: u8,

    /// Time budget in milliseconds; unlimited when omitted
    #[arg(long)]
    movetime: Option<u64>,

    #[arg(long, value_enum, default_value_t = Preset::Full)]
    preset: Preset,

    /// Override the preset's cache strategy
    #[arg(long, value_enum)]
    strategy: Option<CacheStrategy>,

    /// Override the preset's cache budget, in bytes
    #[arg(long)]
    cache_bytes: Option<usize>,

    #[arg(long, value_enum, default_value_t = PvSource::Table)]
    pv_source: PvSource,

    #[arg(long, value_enum, default_value_t = EvalChoice::PieceSquare)]
    eval: EvalChoice,

    /// Use paired 32-bit fingerprints instead of one 64-bit key
    #[arg(long)]
    wide: bool,

    /// Seed for the fingerprint keys
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Restrict the root to these moves, in long algebraic notation
    #[arg(long, num_args = 1..)]
    searchmoves: Vec<String>,
}

impl Args {
    fn search_config(&self) -> SearchConfig {
        let mut config = self.preset.config();
        if let Some(strategy) = self.strategy {
            config.cache_strategy = strategy;
        }
        if let Some(bytes) = self.cache_bytes {
            config.cache_bytes = bytes;
        }
        config.pv_source = self.pv_source;
        config
    }

    fn evaluator(&self) -> Evaluator {
        match self.eval {
            EvalChoice::Material => Evaluator::Material,
            EvalChoice::PieceSquare => Evaluator::PieceSquare,
        }
    }
}

fn run<K: HashKey>(args: &Args, position: Position) -> Result<(), Box<dyn Error>> {
    let keys = Arc::new(ZobristKeys::<K>::from_seed(args.seed));
    let mut game = Game::with_keys(position.clone(), keys).with_evaluator(args.evaluator());

    let mut subset: Vec<Move> = Vec::new();
    for text in &args.searchmoves {
        match game.parse_move(text) {
            Some(mv) => subset.push(mv),
            None => eprintln!("ignoring illegal move {}", text),
        }
    }

    let mut engine = Engine::new(game, args.search_config())?;
    engine.set_reporter(|report| println!("info {}", report));

    let result = engine.next_move(
        &position,
        (!args.searchmoves.is_empty()).then_some(subset.as_slice()),
        args.movetime.map(Duration::from_millis),
        SearchLimits::depth(args.depth.min(MAX_DEPTH)),
    )?;

    println!("bestmove {} score {} depth {} nodes {}", result.best_move, result.score, result.depth, result.nodes);
    println!("{}", engine.cache_stats());
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let outcome = Position::from_fen(&args.fen)
        .map_err(Box::<dyn Error>::from)
        .and_then(|position| if args.wide { run::<KeyPair>(&args, position) } else { run::<u64>(&args, position) });

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
