use anyhow::Result;
use clap::Parser;
use drift_rs::quantiles::DEFAULT_LEVELS;
use drift_rs::*;
use flate2::Compression;
use flate2::write::GzEncoder;
use rand::Rng;
use std::fs::File;
use std::io::Write;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(about = "Neutral-locus drift simulation with separate male and female gamete draws")]
struct Args {
    /// Initial allele frequency/ies
    #[arg(short, long, num_args = 1.., value_name = "FREQ")]
    initial: Option<Vec<f64>>,
    /// Step between initial frequencies; e.g. 0.1 simulates 0, 0.1, ..., 1
    #[arg(short = 'e', long)]
    step: Option<f64>,
    /// Population size in each generation (number of progeny)
    #[arg(short, long, default_value_t = 96)]
    total_pop: usize,
    /// Number of males contributing gametes
    #[arg(short = 'm', long, default_value_t = 48)]
    no_males: usize,
    /// Number of females contributing gametes
    #[arg(short = 'f', long, default_value_t = 48)]
    no_females: usize,
    /// Number of generations of random mating
    #[arg(short, long, default_value_t = 1)]
    cycles: usize,
    /// Number of simulations to perform per initial frequency
    #[arg(short, long, default_value_t = 1)]
    sims: usize,
    /// Random seed (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Quantile levels to compute over each batch of final frequencies
    #[arg(short, long, num_args = 1.., value_name = "LEVEL")]
    quantiles: Option<Vec<f64>>,
    /// Do not compute or write the quantile table
    #[arg(long)]
    skip_quantiles: bool,
    /// Rebuild the gamete pool from each generation's frequency (compounding
    /// drift) instead of reusing the initial pool for every generation
    #[arg(long)]
    update_pool: bool,
    /// Prefix for the output tables
    #[arg(short, long, default_value = "drift_simulation")]
    outfile: String,
    /// Print the run as JSON to stdout instead of writing tables
    #[arg(long)]
    json: bool,
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    let grid = FrequencyGrid::resolve(args.initial, args.step)?;
    let random_seed = args
        .seed
        .unwrap_or_else(|| rand::rng().random_range(1..u64::MAX));

    let params = Parameters {
        random_seed,
        total_pop: args.total_pop,
        no_males: args.no_males,
        no_females: args.no_females,
        cycles: args.cycles,
        sims: args.sims,
        pool_mode: if args.update_pool {
            GametePoolMode::PerGeneration
        } else {
            GametePoolMode::Static
        },
    };

    eprintln!(
        "=== Drift: {} initial frequencies x {} replicates ===",
        grid.len(),
        params.sims
    );
    eprintln!("{:?}", params);

    let levels: Option<Vec<f64>> = if args.skip_quantiles {
        None
    } else {
        Some(args.quantiles.unwrap_or_else(|| DEFAULT_LEVELS.to_vec()))
    };

    let mut sim = DriftSimulator::new(params)?;
    let run = sim.run(&grid, levels.as_deref())?;

    if args.json {
        println!("{}", serde_json::to_string(&run)?);
        return Ok(());
    }

    let sim_path = format!("{}_sim_frequencies.csv.gz", args.outfile);
    write_table_gz(&sim_path, &run.sim_frequencies)?;
    eprintln!("Wrote {sim_path}");

    if let Some(table) = &run.quantiles {
        let quantile_path = format!("{}_quantiles.csv.gz", args.outfile);
        write_table_gz(&quantile_path, table)?;
        eprintln!("Wrote {quantile_path}");
    }
    Ok(())
}

// ── Output ───────────────────────────────────────────────────────────────────

fn write_table_gz(path: &str, rows: &[Vec<f64>]) -> Result<()> {
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    for row in rows {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(encoder, "{}", cells.join(","))?;
    }
    encoder.finish()?;
    Ok(())
}
