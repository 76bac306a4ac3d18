use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use evocomp::benchmark::{average_histories, condition_generation, Benchmark};
use evocomp::evolution::{Evolution, GenerationSnapshot};
use evocomp::io::{
    statistics_formatter, write_statistics, CsvWriter, History, HistoryWriter, StatisticsSink,
};
use evocomp::problems::{Evolution2D, Landscape, Point, TourMove, Tsp, TspConfig, ValueRange};
use evocomp::settings::{settings_from_file, EvolutionSettings};
use evocomp::view::{Layout, TextView};
use flexi_logger::Logger;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Rounding applied to every statistics file.
const DIGITS: u32 = 2;

/// Statistics file of the interactive landscape view.
const VIEW_STATISTICS: &str = "functions.csv";

#[derive(Parser)]
#[command(name = "evocomp")]
#[command(about = "Evolutionary algorithms on 2D landscapes and the traveling salesperson problem")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve points on a 2D function, one evolution per settings row
    Landscape(LandscapeArgs),

    /// Evolve tours through random nodes
    Tsp(TspArgs),
}

#[derive(Args)]
#[command(allow_negative_numbers = true)]
struct LandscapeArgs {
    /// Function to evolve on: sine or parabola
    function: Landscape,

    /// Lower bound of both coordinates
    min: f64,

    /// Upper bound of both coordinates
    max: f64,

    /// Grid step used to sample the landscape
    step: f64,

    /// Settings file, one `<distribution> <param>,<population>,<probability>` row per evolution
    #[arg(short = 'f', long = "from-file")]
    from_file: PathBuf,

    /// Run headless for this many generations, writing `<NAME_PATTERN><i>.csv`
    #[arg(short = 'b', long, requires = "name_pattern")]
    benchmark: Option<usize>,

    /// File name prefix of the benchmark statistics files
    #[arg(long, requires = "benchmark")]
    name_pattern: Option<String>,

    /// Run every setting this many times and write the per-generation average
    #[arg(long, requires = "benchmark", value_parser = clap::value_parser!(u64).range(1..))]
    mean: Option<u64>,

    /// Milliseconds between two frames of the text view
    #[arg(short = 'i', long, default_value_t = 50)]
    interval: u64,

    /// Generations shown by the text view
    #[arg(long, default_value_t = 100)]
    generations: usize,

    /// Seed of the first evolution; evolution `i` uses `seed + i`, wrapping on overflow
    #[arg(long)]
    seed: Option<u64>,

    /// Also write the sampled landscape as `x,y,z` rows
    #[arg(long)]
    grid: Option<PathBuf>,
}

#[derive(Args)]
struct TspArgs {
    /// Number of nodes
    nodecount: usize,

    /// Population size
    popsize: usize,

    /// Swap probability in percent
    mprob: f64,

    /// Swap attempts per tour
    mnum: usize,

    /// Statistics output file
    output: PathBuf,

    #[arg(long, default_value_t = 500)]
    generations: usize,

    #[arg(long)]
    seed: Option<u64>,

    /// Nodes are drawn from `[0, RANGE)²`
    #[arg(long, default_value_t = 1.0)]
    coordinate_range: f64,

    /// Recombine tours with order crossover before mutating
    #[arg(long)]
    crossover: bool,

    /// Mutate by reversing random segments instead of swapping two nodes
    #[arg(long)]
    invert: bool,

    /// Save the generated nodes as an `x,y` table
    #[arg(long)]
    nodes: Option<PathBuf>,
}

fn main() -> Result<()> {
    let _logger = Logger::try_with_env_or_str("info")?
        .format(flexi_logger::colored_opt_format)
        .start()?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Landscape(args) => run_landscape(args),
        Commands::Tsp(args) => run_tsp(args),
    }
}

fn run_landscape(args: LandscapeArgs) -> Result<()> {
    let settings = load_settings(&args.from_file);
    let range = ValueRange::new(args.min, args.max)?;

    if let Some(path) = &args.grid {
        write_grid(path, args.function, range, args.step)?;
    }

    let builders: Vec<Evolution2D> = settings
        .into_iter()
        .enumerate()
        .map(|(i, setting)| {
            let builder = Evolution2D::new(args.function, setting, range);
            match args.seed {
                Some(seed) => builder.with_seed(seed_for(seed, i as u64)),
                None => builder,
            }
        })
        .collect();

    match (args.benchmark, &args.name_pattern, args.mean) {
        (Some(generations), Some(prefix), Some(amount)) => {
            run_landscape_mean(&builders, generations, prefix, amount, args.seed)
        }
        (Some(generations), Some(prefix), None) => {
            run_landscape_benchmark(&builders, generations, prefix)
        }
        _ => run_landscape_view(&builders, args.generations, args.interval),
    }
}

/// Seed of run `index` when the first run uses `seed`.
fn seed_for(seed: u64, index: u64) -> u64 {
    seed.wrapping_add(index)
}

/// Reads the settings file or exits with status 1.
fn load_settings(path: &Path) -> Vec<EvolutionSettings> {
    match settings_from_file(path) {
        Ok(settings) if !settings.is_empty() => settings,
        Ok(_) => invalid_input(path, &"no settings rows"),
        Err(err) => invalid_input(path, &err),
    }
}

fn invalid_input(path: &Path, reason: &dyn std::fmt::Display) -> ! {
    log::error!("{}: {}", path.display(), reason);
    println!("Invalid input file!");
    std::process::exit(1);
}

fn run_landscape_benchmark(builders: &[Evolution2D], generations: usize, prefix: &str) -> Result<()> {
    let evolutions = builders
        .iter()
        .enumerate()
        .map(|(i, builder)| {
            let path = format!("{prefix}{i}.csv");
            let sink = CsvWriter::statistics(&path, DIGITS)?;
            log::info!("evolution {}: {} -> {}", i, builder.settings(), path);
            builder.build_with_sink(sink)
        })
        .collect::<evocomp::Result<Vec<_>>>()?;

    let mut benchmark = Benchmark::new(evolutions, condition_generation(generations));
    benchmark.run()?;
    Ok(())
}

/// Runs each setting `amount` times and writes the averaged statistics of
/// setting `i` to `<prefix><i>.csv`.
fn run_landscape_mean(
    builders: &[Evolution2D],
    generations: usize,
    prefix: &str,
    amount: u64,
    seed: Option<u64>,
) -> Result<()> {
    for (i, builder) in builders.iter().enumerate() {
        let evolutions = (0..amount)
            .map(|k| {
                let run = match seed {
                    Some(seed) => builder
                        .clone()
                        .with_seed(seed_for(seed, (i as u64).wrapping_mul(amount).wrapping_add(k))),
                    None => builder.clone(),
                };
                run.build_with_sink(HistoryWriter::new())
            })
            .collect::<evocomp::Result<Vec<_>>>()?;

        let mut benchmark = Benchmark::new(evolutions, condition_generation(generations));
        benchmark.run()?;
        let histories: Vec<History<Point>> = benchmark
            .into_evolutions()
            .into_iter()
            .map(|evolution| evolution.into_sink().into_history())
            .collect();

        let path = format!("{prefix}{i}.csv");
        write_statistics(&path, &average_histories(&histories, DIGITS))?;
        log::info!(
            "evolution {}: mean of {} runs of {} -> {}",
            i,
            amount,
            builder.settings(),
            path
        );
    }
    Ok(())
}

fn run_landscape_view(builders: &[Evolution2D], generations: usize, interval: u64) -> Result<()> {
    let mut evolutions = builders
        .iter()
        .map(Evolution2D::build)
        .collect::<evocomp::Result<Vec<Evolution<Point>>>>()?;

    let view = TextView::new(Layout::square(evolutions.len()), evolutions.len())?
        .with_titles(builders.iter().map(|b| b.settings().to_string()));

    let statistics = statistics_formatter::<Point>(DIGITS);
    let mut writer = CsvWriter::create(
        VIEW_STATISTICS,
        &["generation", "fittest", "mean", "median"],
        move |snapshot: &GenerationSnapshot<'_, Point>| {
            let mut row = vec![snapshot.generation().to_string()];
            row.extend(statistics(snapshot));
            row
        },
    )?;

    for generation in 0..=generations {
        let snapshots: Vec<_> = evolutions.iter().map(|e| e.snapshot()).collect();
        print!("{}", view.render(&snapshots)?);
        for snapshot in &snapshots {
            writer.on_generation(snapshot)?;
        }

        if generation == generations {
            break;
        }
        thread::sleep(Duration::from_millis(interval));
        for evolution in &mut evolutions {
            evolution.step()?;
        }
    }

    writer.finalize()?;
    log::info!("statistics written to {VIEW_STATISTICS}");
    Ok(())
}

fn write_grid(path: &Path, landscape: Landscape, range: ValueRange, step: f64) -> Result<()> {
    let grid = landscape.sample_grid(range, step)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["x", "y", "z"])?;
    for (x, row) in grid.xs.iter().zip(&grid.zs) {
        for (y, z) in grid.ys.iter().zip(row) {
            writer.write_record([x.to_string(), y.to_string(), z.to_string()])?;
        }
    }
    writer.flush()?;
    log::info!("{} grid written to {}", landscape, path.display());
    Ok(())
}

fn run_tsp(args: TspArgs) -> Result<()> {
    if !(0.0..=100.0).contains(&args.mprob) {
        bail!("mutation probability must be a percentage, got {}", args.mprob);
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let tsp = Arc::new(Tsp::random(args.nodecount, args.coordinate_range, &mut rng)?);
    log::info!("{}", tsp);
    if let Some(path) = &args.nodes {
        tsp.save_csv(path)?;
    }

    let mut config = TspConfig::new(args.popsize)
        .with_mutation(args.mprob / 100.0, args.mnum)
        .with_crossover(args.crossover)
        .with_tour_move(if args.invert {
            TourMove::Invert
        } else {
            TourMove::Swap
        });
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let sink = CsvWriter::statistics(&args.output, DIGITS)?;
    let mut evolution = Tsp::evolution(Arc::clone(&tsp), &config, sink)?;

    for _ in 0..args.generations {
        log::info!("{} : {}", evolution.generation(), evolution.fittest_individual().1);
        evolution.step()?;
    }
    evolution.finalize()?;

    let (tour, cost) = evolution.fittest_individual();
    log::info!(
        "best tour after {} generations: {:?} (cost {})",
        evolution.generation(),
        tour,
        cost
    );
    Ok(())
}
