use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use std::collections::BTreeMap;
use std::time::Instant;

use dmrg::output::write_records;
use dmrg::{
    BlockGenerator, BlockParams, Direction, DmrgEngine, Endpoint, Evolutor, SectorRule,
    Truncation, TruncationStrategy,
};
use quantum::hamiltonian::{spinless_fermions, transverse_ising, xxz};
use quantum::{BlockLabeling, OpCollection};

/// Ground-state DMRG for 1D chains
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model Hamiltonian
    #[arg(long, value_enum, default_value_t = Model::Heisenberg)]
    model: Model,

    /// Number of sites
    #[arg(long, default_value_t = 20)]
    n: usize,

    /// Infinite-size growth instead of finite sweeps
    #[arg(long)]
    infinite: bool,

    /// Comma-separated kept-state budget per pass
    #[arg(long, default_value = "20,40,60,60")]
    max_bond: String,

    /// Weight floor of kept states
    #[arg(long, default_value_t = 0.0)]
    cutoff: f64,

    /// Energy tolerance
    #[arg(long, default_value_t = 1e-8)]
    tol: f64,

    /// Infinite growth iterations
    #[arg(long, default_value_t = 50)]
    maxiter: usize,

    /// Coupling (J, hopping t)
    #[arg(long, default_value_t = 1.0)]
    j: f64,

    /// Second parameter (Ising field h, XXZ Jz ratio, interaction V)
    #[arg(long, default_value_t = 1.0)]
    g: f64,

    /// Single-ion anisotropy of the spin-1 chain
    #[arg(long, default_value_t = 0.0)]
    d: f64,

    /// Target the zero-magnetization or half-filled sector
    #[arg(long)]
    conserve: bool,

    /// Use the chain's mirror symmetry
    #[arg(long)]
    reflect: bool,

    /// Reflection parity of the target state (+1 or -1), needs --reflect
    #[arg(long, allow_hyphen_values = true)]
    parity: Option<i8>,

    /// Number of lowest levels targeted together
    #[arg(long, default_value_t = 1)]
    nlevel: usize,

    /// Truncate via reduced density matrices instead of SVD
    #[arg(long)]
    rdm: bool,

    /// RNG seed for start vectors
    #[arg(long, default_value = "dmrg")]
    seed: String,

    /// Per-step CSV output
    #[arg(long)]
    out: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Model {
    Ising,
    Heisenberg,
    Xxz,
    Spin1,
    Fermions,
}

fn chain(args: &Args) -> (OpCollection, BlockLabeling) {
    match args.model {
        Model::Ising => (
            transverse_ising(args.n, args.j, args.g),
            BlockLabeling::trivial(2),
        ),
        Model::Heisenberg => (xxz(args.n, 1, args.j, args.j, 0.0), BlockLabeling::magnetization(1)),
        Model::Xxz => (
            xxz(args.n, 1, args.j, args.j * args.g, 0.0),
            BlockLabeling::magnetization(1),
        ),
        Model::Spin1 => (
            xxz(args.n, 2, args.j, args.j, args.d),
            BlockLabeling::magnetization(2),
        ),
        Model::Fermions => (
            spinless_fermions(args.n, args.j, args.g, 0.0),
            BlockLabeling::particle_number(),
        ),
    }
}

fn sector(args: &Args, labeling: &BlockLabeling) -> Result<SectorRule> {
    if !args.conserve {
        return Ok(SectorRule::None);
    }
    let Some(name) = labeling.names.first() else {
        bail!("model {:?} has no conserved quantity", args.model);
    };
    Ok(if name == "N" {
        let mut m = BTreeMap::new();
        m.insert(name.clone(), (1, 2));
        SectorRule::PerSite(m)
    } else {
        let mut m = BTreeMap::new();
        m.insert(name.clone(), 0);
        SectorRule::Fixed(m)
    })
}

fn parse_max_bonds(input: &str) -> Result<Vec<usize>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().with_context(|| format!("bad max_bond `{}`", s)))
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let budgets = parse_max_bonds(&args.max_bond)?;
    if budgets.is_empty() {
        bail!("max_bond must contain at least one integer value");
    }
    let schedule: Vec<Truncation> = budgets
        .iter()
        .map(|&max_bond| Truncation {
            max_bond,
            cutoff: args.cutoff,
        })
        .collect();

    let (chain, labeling) = chain(&args);
    let params = BlockParams {
        nlevel: args.nlevel,
        target_sector: sector(&args, &labeling)?,
        parity: args.parity,
        c_detect_scope: None,
        strategy: if args.rdm {
            TruncationStrategy::DensityMatrix
        } else {
            TruncationStrategy::Svd
        },
    };
    let labeling = if args.conserve { Some(labeling) } else { None };
    let gen = BlockGenerator::new(chain.space.clone(), Evolutor::Isometric);
    let mut engine =
        DmrgEngine::new(chain, gen, labeling, args.reflect).with_seed(args.seed.as_bytes());

    let start = Instant::now();
    if args.infinite {
        let energies = engine.run_infinite(args.maxiter, args.tol, schedule[0], &params)?;
        let last = energies.last().copied().unwrap_or(f64::NAN);
        println!(
            "infinite DMRG: {} iterations, E/site = {:.12} ({:.3} s)",
            energies.len(),
            last,
            start.elapsed().as_secs_f64()
        );
    } else {
        let end = Endpoint {
            pass: schedule.len(),
            direction: Direction::Left,
            site: 0,
        };
        let (energy, mps) = engine.run_finite(end, args.tol, &schedule, &params)?;
        info!("bond dimensions {:?}", mps.to_mps().bond_dims());
        println!(
            "finite DMRG: E/site = {:.12}, E = {:.12}, S(center) = {:.6} ({:.3} s)",
            energy,
            energy * args.n as f64,
            mps.entanglement_entropy(),
            start.elapsed().as_secs_f64()
        );
    }

    if let Some(path) = &args.out {
        write_records(path, engine.records())
            .with_context(|| format!("failed to write {}", path))?;
        info!("wrote {} records to {}", engine.records().len(), path);
    }
    Ok(())
}
