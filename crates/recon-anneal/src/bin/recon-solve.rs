//! Reads an instance on stdin, searches for a zero-contradiction
//! hypothesis and prints the completed door table. Layered instances print
//! the expanded table over every room.

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use rand::rngs::StdRng;
use rand::SeedableRng;
use recon_anneal::{solve_portfolio, SearchOutcome, Solver, SolverConfig, WallClock};
use recon_complete::{replay, Completion, DoorTable, GraphCompleter, LayeredTable};
use recon_trace::{parse_input, CandidatePool, Layering, Mirror, Orientation, Plain, TraceStore, Triad};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    search: recon_anneal::SearchReport,
    layering: Layering,
    completion: Option<&'a Completion>,
    rooms: Option<&'a DoorTable>,
}

fn cli() -> Command {
    Command::new("recon-solve")
        .version(recon_anneal::VERSION)
        .about("Reconstruct a door graph consistent with observed walks")
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(value_parser!(u64))
                .help("Random seed for reproducibility"),
        )
        .arg(
            Arg::new("time-limit")
                .long("time-limit")
                .value_parser(value_parser!(f64))
                .help("Search time budget in seconds"),
        )
        .arg(
            Arg::new("start-temp")
                .long("start-temp")
                .value_parser(value_parser!(f64))
                .help("Initial annealing temperature"),
        )
        .arg(
            Arg::new("layers")
                .long("layers")
                .value_parser(value_parser!(usize))
                .help("Copies of the base graph the rooms split into (1, 2 or 3)"),
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("Independent searches to run in parallel, seeds seed..seed+workers"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print a JSON report instead of the text table"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Debug-level logging"),
        )
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(args: &ArgMatches) -> Result<SolverConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => SolverConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => SolverConfig::default(),
    };
    if let Some(&seed) = args.get_one::<u64>("seed") {
        config.seed = seed;
    }
    if let Some(&secs) = args.get_one::<f64>("time-limit") {
        config.anneal.time_limit_secs = secs;
    }
    if let Some(&temp) = args.get_one::<f64>("start-temp") {
        config.anneal.start_temp = temp;
    }
    if let Some(&layers) = args.get_one::<usize>("layers") {
        config.layering = Layering::from_layers(layers).with_context(|| format!("unsupported layer count {layers}"))?;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Complete the base table, attach the found door codes and replay
fn complete<O: Orientation>(outcome: &SearchOutcome<O>) -> Result<(Completion, DoorTable)> {
    let completion = GraphCompleter::complete(&outcome.engine);
    let layered = LayeredTable::new(
        completion.table.clone(),
        outcome.store.codes().to_vec(),
        outcome.store.orientation().clone(),
    )?;
    let check = replay(&layered, outcome.store.traces())?;
    if !check.is_consistent() {
        bail!(
            "completed table disagrees with {} of {} observed steps",
            check.mismatches,
            check.steps
        );
    }
    tracing::info!(
        determined = completion.determined,
        ambiguous = completion.ambiguous,
        "table verified by replay"
    );
    Ok((completion, layered.expand()))
}

fn main() -> Result<()> {
    let args = cli().get_matches();
    init_tracing(args.get_flag("verbose"));
    let config = load_config(&args)?;

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("reading stdin")?;
    let parsed = parse_input(&input).context("parsing instance")?;

    let json = args.get_flag("json");
    let workers = args.get_one::<usize>("workers").copied().unwrap_or(1);
    match config.layering {
        Layering::Plain => run(parsed.into_layered_store(Plain)?, config, workers, json),
        Layering::Mirror => run(parsed.into_layered_store(Mirror)?, config, workers, json),
        Layering::Triad => run(parsed.into_layered_store(Triad)?, config, workers, json),
    }
}

fn run<O: Orientation>(mut store: TraceStore<O>, config: SolverConfig, workers: usize, json: bool) -> Result<()> {
    let layering = config.layering;
    tracing::info!(
        vertices = store.vertex_count(),
        layers = store.orientation().layers(),
        traces = store.trace_count(),
        positions = store.movable_positions(),
        seed = config.seed,
        "instance loaded"
    );

    let outcome = if workers > 1 {
        let outcome = solve_portfolio(&store, &config, workers, WallClock::new)?;
        if !json {
            println!("start : {:.6}", outcome.report().start_score);
        }
        outcome
    } else {
        let mut rng = StdRng::seed_from_u64(config.seed);
        store.randomize(&CandidatePool::new(store.vertex_count()), &mut rng);
        let solver = Solver::new(store, config, rng, WallClock::new())?;
        if !json {
            println!("start : {:.6}", solver.score_value());
        }
        solver.run()?
    };
    let completed = if outcome.solved { Some(complete(&outcome)?) } else { None };

    if json {
        let report = JsonReport {
            search: outcome.report(),
            layering,
            completion: completed.as_ref().map(|(completion, _)| completion),
            rooms: completed.as_ref().map(|(_, rooms)| rooms),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("end : {:.6}", outcome.best_value);
    if let Some((_, rooms)) = completed {
        println!("{rooms}");
        println!("solved");
    }
    Ok(())
}
