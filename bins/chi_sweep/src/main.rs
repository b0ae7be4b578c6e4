use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use rayon::prelude::*;

use dmrg::{BlockGenerator, BlockParams, DmrgEngine, Endpoint, Evolutor, Truncation};
use quantum::hamiltonian::{heisenberg, transverse_ising};
use quantum::OpCollection;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about = "Finite DMRG convergence in the kept-state budget")]
struct Args {
    /// Number of sites
    #[arg(long, default_value_t = 40)]
    n: usize,

    /// Transverse field; the Heisenberg chain is used when absent
    #[arg(long)]
    field: Option<f64>,

    /// Comma-separated list of max bond dimensions
    #[arg(long, default_value = "8,16,32,64")]
    max_bond: String,

    /// Sweep passes per run
    #[arg(long, default_value_t = 4)]
    passes: usize,

    /// Weight floor of kept states
    #[arg(long, default_value_t = 0.0)]
    cutoff: f64,

    /// Base RNG seed (shared across max_bond runs)
    #[arg(long, default_value = "chi-sweep")]
    seed: String,

    /// Number of Rayon worker threads (0 = Rayon default)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Output CSV path
    #[arg(long, default_value = "chi_sweep.csv")]
    out: String,
}

struct Row {
    max_bond: usize,
    energy: f64,
    truncation_error: f64,
    chi_max: usize,
    entropy: f64,
    seconds: f64,
}

fn chain(args: &Args) -> OpCollection {
    match args.field {
        Some(h) => transverse_ising(args.n, 1.0, h),
        None => heisenberg(args.n, 1.0),
    }
}

fn run(args: &Args, max_bond: usize) -> Result<Row> {
    let chain = chain(args);
    let gen = BlockGenerator::new(chain.space.clone(), Evolutor::Isometric);
    let mut engine = DmrgEngine::new(chain, gen, None, false).with_seed(args.seed.as_bytes());
    let schedule = vec![
        Truncation {
            max_bond,
            cutoff: args.cutoff,
        };
        args.passes
    ];
    let end = Endpoint {
        pass: args.passes,
        ..Endpoint::default()
    };
    let start = Instant::now();
    let (energy, mps) = engine
        .run_finite(end, 1e-10, &schedule, &BlockParams::default())
        .with_context(|| format!("run with max_bond {}", max_bond))?;
    let seconds = start.elapsed().as_secs_f64();

    let last_pass = engine
        .records()
        .iter()
        .filter(|r| r.pass == Some(args.passes));
    let truncation_error = last_pass.map(|r| r.truncation_error).fold(0.0, f64::max);
    let chi_max = mps.to_mps().bond_dims().into_iter().max().unwrap_or(1);
    info!(
        "max_bond={} E/site={:.12} err={:.3e} chi_max={} ({:.2} s)",
        max_bond, energy, truncation_error, chi_max, seconds
    );
    Ok(Row {
        max_bond,
        energy,
        truncation_error,
        chi_max,
        entropy: mps.entanglement_entropy(),
        seconds,
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
            .context("failed to build Rayon thread pool")?;
    }
    if args.passes == 0 {
        bail!("passes must be > 0");
    }
    let max_bonds = parse_max_bonds(&args.max_bond);
    if max_bonds.is_empty() {
        bail!("max_bond must contain at least one integer value");
    }

    // independent engines, one per budget
    let rows = max_bonds
        .par_iter()
        .map(|&m| run(&args, m))
        .collect::<Result<Vec<Row>>>()?;

    for r in &rows {
        println!(
            "max_bond={} E/site={:.12} err={:.3e} chi_max={}",
            r.max_bond, r.energy, r.truncation_error, r.chi_max
        );
    }
    write_csv(&args.out, &rows)
}

fn write_csv(path: &str, rows: &[Row]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path))?;
    let mut w = BufWriter::new(file);
    writeln!(w, "max_bond,energy,truncation_error,chi_max,entropy,seconds")?;
    for r in rows {
        writeln!(
            w,
            "{},{},{},{},{},{}",
            r.max_bond, r.energy, r.truncation_error, r.chi_max, r.entropy, r.seconds
        )?;
    }
    w.flush()?;
    Ok(())
}

fn parse_max_bonds(input: &str) -> Vec<usize> {
    input
        .split(',')
        .filter_map(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                t.parse::<usize>().ok()
            }
        })
        .collect()
}
