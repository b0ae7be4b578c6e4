use dmrg::{
    BlockGenerator, BlockParams, Direction, DmrgEngine, DmrgError, Endpoint, Evolutor,
    SectorRule, Truncation,
};
use quantum::exact::{ground_energy_in_reflection_sector, lowest_levels};
use quantum::hamiltonian::{heisenberg, spinless_fermions, transverse_ising};
use quantum::{BlockLabeling, OpCollection};
use std::collections::BTreeMap;

fn labeled(chain: OpCollection, labeling: BlockLabeling) -> DmrgEngine {
    let gen = BlockGenerator::new(chain.space.clone(), Evolutor::Isometric);
    DmrgEngine::new(chain, gen, Some(labeling), false)
}

fn reflected(chain: OpCollection) -> DmrgEngine {
    let gen = BlockGenerator::new(chain.space.clone(), Evolutor::Isometric);
    DmrgEngine::new(chain, gen, None, true)
}

fn fixed(name: &str, value: i32) -> SectorRule {
    let mut m = BTreeMap::new();
    m.insert(name.to_string(), value);
    SectorRule::Fixed(m)
}

#[test]
fn heisenberg_in_zero_magnetization() {
    let chain = heisenberg(8, 1.0);
    let exact = lowest_levels(&chain, 1).unwrap()[0];
    let mut e = labeled(chain, BlockLabeling::magnetization(1));
    let params = BlockParams {
        target_sector: fixed("2Sz", 0),
        ..BlockParams::default()
    };
    let (per_site, mps) = e
        .run_finite(Endpoint::default(), 1e-8, &[Truncation::new(16); 4], &params)
        .unwrap();
    assert!((8.0 * per_site - exact).abs() < 1e-6, "E = {} vs {}", 8.0 * per_site, exact);
    assert_eq!(mps.nsite(), 8);
}

#[test]
fn half_filling_scales_with_the_window() {
    let n = 8;
    let chain = spinless_fermions(n, 1.0, 0.0, 0.0);
    let mut m = BTreeMap::new();
    m.insert("N".to_string(), (1, 2));
    let params = BlockParams {
        target_sector: SectorRule::PerSite(m),
        ..BlockParams::default()
    };
    let mut e = labeled(chain, BlockLabeling::particle_number());
    let (per_site, _) = e
        .run_finite(Endpoint::default(), 1e-8, &[Truncation::new(16); 4], &params)
        .unwrap();
    // four particles in the lowest single-particle levels
    let filled: f64 = (1..=4)
        .map(|k| -2.0 * (k as f64 * std::f64::consts::PI / (n + 1) as f64).cos())
        .sum();
    assert!((n as f64 * per_site - filled).abs() < 1e-6);
}

#[test]
fn unreachable_sector_is_a_configuration_error() {
    let mut e = labeled(heisenberg(4, 1.0), BlockLabeling::magnetization(1));
    let params = BlockParams {
        target_sector: fixed("2Sz", 7),
        ..BlockParams::default()
    };
    let err = e
        .run_finite(Endpoint::default(), 1e-8, &[Truncation::new(8); 4], &params)
        .unwrap_err();
    assert!(matches!(err, DmrgError::Configuration(_)), "{}", err);
}

#[test]
fn reflection_parity_selects_the_sector() {
    let chain = heisenberg(8, 1.0);
    for parity in [1i8, -1] {
        let exact = ground_energy_in_reflection_sector(&chain, parity).unwrap();
        let mut e = reflected(chain.clone());
        let params = BlockParams {
            parity: Some(parity),
            c_detect_scope: Some(8),
            ..BlockParams::default()
        };
        e.run_finite(Endpoint::default(), 1e-8, &[Truncation::new(16); 4], &params)
            .unwrap();
        // the symmetric step covers the whole chain without truncation
        let mid = e
            .records()
            .iter()
            .rev()
            .find(|r| r.direction == Direction::Right && r.site == 3)
            .unwrap();
        assert!(
            (8.0 * mid.energy - exact).abs() < 1e-8,
            "C = {}: E = {} vs {}",
            parity,
            8.0 * mid.energy,
            exact
        );
    }
}

#[test]
fn reflected_sweep_matches_plain_sweep() {
    let chain = transverse_ising(8, 1.0, 0.7);
    let exact = lowest_levels(&chain, 1).unwrap()[0];
    let mut e = reflected(chain);
    let (per_site, mps) = e
        .run_finite(Endpoint::default(), 1e-8, &[Truncation::new(16); 4], &BlockParams::default())
        .unwrap();
    assert!((8.0 * per_site - exact).abs() < 1e-6);
    assert_eq!(mps.nsite(), 8);
    // reflected sweeps stay in the left half
    assert!(e.records().iter().all(|r| r.site <= 3));
}

#[test]
fn reflected_midpoint_spectra_agree() {
    let mut e = reflected(transverse_ising(8, 1.0, 0.9));
    let params = BlockParams {
        strategy: dmrg::TruncationStrategy::DensityMatrix,
        ..BlockParams::default()
    };
    let end = Endpoint {
        pass: 2,
        direction: Direction::Left,
        site: 0,
    };
    e.run_finite(end, 1e-8, &[Truncation::new(16); 2], &params)
        .unwrap();
    let mid = e
        .records()
        .iter()
        .rev()
        .find(|r| r.direction == Direction::Right && r.site == 3)
        .unwrap();
    assert_eq!(mid.pass, Some(2));
    assert!(!mid.spectrum_left.is_empty());
    for (a, b) in mid.spectrum_left.iter().zip(&mid.spectrum_right).take(4) {
        assert!((a - b).abs() < 1e-8, "{} vs {}", a, b);
    }
}
