use dmrg::{BlockGenerator, BlockParams, Direction, DmrgEngine, Endpoint, Evolutor, Truncation};
use quantum::energy::energy;
use quantum::exact::{lowest_levels, statevector};
use quantum::hamiltonian::{heisenberg, spinless_fermions, transverse_ising};
use quantum::OpCollection;

fn engine(chain: OpCollection) -> DmrgEngine {
    let gen = BlockGenerator::new(chain.space.clone(), Evolutor::Isometric);
    DmrgEngine::new(chain, gen, None, false)
}

fn schedule(max_bond: usize, passes: usize) -> Vec<Truncation> {
    vec![Truncation::new(max_bond); passes]
}

#[test]
fn two_site_ising_is_exact() {
    let chain = transverse_ising(2, 1.0, 0.5);
    let mut e = engine(chain);
    let end = Endpoint {
        pass: 1,
        direction: Direction::Left,
        site: 0,
    };
    let (per_site, mps) = e
        .run_finite(end, 1e-10, &schedule(4, 1), &BlockParams::default())
        .unwrap();
    let exact = -(1.0f64 + 4.0 * 0.25).sqrt();
    assert!((2.0 * per_site - exact).abs() < 1e-10, "E = {}", 2.0 * per_site);
    assert_eq!(mps.nsite(), 2);
}

#[test]
fn ising_chain_matches_exact_diagonalization() {
    // middle superblocks exceed the dense limit and go through lanczos
    let chain = transverse_ising(10, 1.0, 1.0);
    let exact = lowest_levels(&chain, 1).unwrap()[0];
    let mut e = engine(chain.clone());
    let (per_site, mps) = e
        .run_finite(Endpoint::default(), 1e-8, &schedule(32, 4), &BlockParams::default())
        .unwrap();
    assert!((10.0 * per_site - exact).abs() < 1e-6, "E = {} vs {}", 10.0 * per_site, exact);

    // the assembled state carries the same energy
    let psi = mps.to_mps();
    assert_eq!(psi.len(), 10);
    let e_mps = energy(&psi, &chain);
    assert!((e_mps - exact).abs() < 1e-6, "<H> = {} vs {}", e_mps, exact);
}

#[test]
fn mps_at_a_right_moving_endpoint() {
    let chain = heisenberg(6, 1.0);
    let exact = lowest_levels(&chain, 1).unwrap()[0];
    let mut e = engine(chain.clone());
    let end = Endpoint {
        pass: 2,
        direction: Direction::Right,
        site: 2,
    };
    let (per_site, mps) = e
        .run_finite(end, 1e-8, &schedule(8, 2), &BlockParams::default())
        .unwrap();
    assert!((6.0 * per_site - exact).abs() < 1e-6);
    assert_eq!(mps.center(), 3);
    let psi = mps.to_mps();
    let amp = statevector(&psi);
    let n2: f64 = amp.iter().map(|a| a.norm_sqr()).sum();
    assert!((n2 - 1.0).abs() < 1e-8);
    assert!((energy(&psi, &chain) - exact).abs() < 1e-6);
}

#[test]
fn free_fermions_fill_the_negative_levels() {
    let n = 8;
    let chain = spinless_fermions(n, 1.0, 0.0, 0.0);
    let free: f64 = (1..=n)
        .map(|k| -2.0 * (k as f64 * std::f64::consts::PI / (n + 1) as f64).cos())
        .filter(|e| *e < 0.0)
        .sum();
    let mut e = engine(chain.clone());
    let (per_site, mps) = e
        .run_finite(Endpoint::default(), 1e-8, &schedule(16, 4), &BlockParams::default())
        .unwrap();
    let total = n as f64 * per_site;
    assert!((total - free).abs() < 1e-6, "E = {} vs {}", total, free);
    let e_mps = energy(&mps.to_mps(), &chain);
    assert!((e_mps - free).abs() < 1e-6, "<H> = {} vs {}", e_mps, free);
}

#[test]
fn interacting_fermions_match_exact() {
    let chain = spinless_fermions(6, 1.0, 0.8, 0.3);
    let exact = lowest_levels(&chain, 1).unwrap()[0];
    let mut e = engine(chain);
    let (per_site, _) = e
        .run_finite(Endpoint::default(), 1e-8, &schedule(8, 4), &BlockParams::default())
        .unwrap();
    assert!((6.0 * per_site - exact).abs() < 1e-6);
}

#[test]
fn records_follow_the_sweep() {
    let mut e = engine(transverse_ising(6, 1.0, 0.5));
    let end = Endpoint {
        pass: 2,
        direction: Direction::Left,
        site: 0,
    };
    e.run_finite(end, 1e-8, &schedule(8, 2), &BlockParams::default())
        .unwrap();
    let records = e.records();
    // two passes of 5 steps in each direction
    assert_eq!(records.len(), 20);
    assert_eq!(records[0].window, 2);
    assert_eq!(records[2].window, 6);
    assert!(records.iter().all(|r| r.truncation_error >= 0.0));
    assert!(records.iter().all(|r| r.overlap <= 1.0 + 1e-12));
    let last = records.last().unwrap();
    assert_eq!((last.pass, last.direction, last.site), (Some(2), Direction::Left, 0));
}

#[test]
fn small_budget_reports_truncation() {
    let chain = heisenberg(10, 1.0);
    let mut e = engine(chain);
    let (_, mps) = e
        .run_finite(Endpoint::default(), 1e-8, &schedule(4, 4), &BlockParams::default())
        .unwrap();
    assert!(mps.to_mps().bond_dims().iter().all(|&d| d <= 4));
    let worst = e
        .records()
        .iter()
        .map(|r| r.truncation_error)
        .fold(0.0, f64::max);
    assert!(worst > 0.0);
}

#[test]
fn density_spectra_agree_across_the_cut() {
    let mut e = engine(transverse_ising(8, 1.0, 0.9));
    let params = BlockParams {
        strategy: dmrg::TruncationStrategy::DensityMatrix,
        ..BlockParams::default()
    };
    let end = Endpoint {
        pass: 2,
        direction: Direction::Left,
        site: 0,
    };
    e.run_finite(end, 1e-8, &schedule(16, 2), &params).unwrap();
    let mid = e
        .records()
        .iter()
        .rev()
        .find(|r| r.direction == Direction::Right && r.site == 3)
        .unwrap();
    for (a, b) in mid.spectrum_left.iter().zip(&mid.spectrum_right).take(4) {
        assert!((a - b).abs() < 1e-8, "{} vs {}", a, b);
    }
}

#[test]
fn several_levels_keep_the_ground_energy() {
    let chain = transverse_ising(6, 1.0, 0.8);
    let exact = lowest_levels(&chain, 1).unwrap()[0];
    let mut e = engine(chain);
    let params = BlockParams {
        nlevel: 2,
        ..BlockParams::default()
    };
    let (per_site, _) = e
        .run_finite(Endpoint::default(), 1e-8, &schedule(8, 4), &params)
        .unwrap();
    assert!((6.0 * per_site - exact).abs() < 1e-6);
}

#[test]
fn predicted_start_vectors_are_close() {
    let mut e = engine(transverse_ising(8, 1.0, 1.0));
    e.run_finite(Endpoint::default(), 1e-8, &schedule(16, 4), &BlockParams::default())
        .unwrap();
    let predicted: Vec<_> = e
        .records()
        .iter()
        .filter(|r| r.pass == Some(3) && r.site >= 1 && r.site <= 5)
        .collect();
    assert_eq!(predicted.len(), 10);
    for r in predicted {
        assert!(r.overlap > 0.999, "{} {}: overlap {}", r.direction, r.site, r.overlap);
    }
}
