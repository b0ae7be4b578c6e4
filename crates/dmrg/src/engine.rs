//! Infinite and finite DMRG runs over a chain Hamiltonian.

use crate::analysis::{analyze, combined_wavefunction};
use crate::assemble::assemble;
use crate::block_generator::{BlockGenerator, Evolutor};
use crate::cache::{BlockCache, BlockPair, Side};
use crate::config::{BlockParams, Direction, Endpoint, Truncation};
use crate::error::{DmrgError, Result};
use crate::predict::predict;
use crate::superblock::{Restricted, SuperBlock};
use crate::symmetry::SymmetryHandler;
use faer::Mat;
use log::{debug, info, warn};
use quantum::{BlockLabeling, OpCollection, OpString};
use rng::ShakeRng;
use std::time::Instant;
use tn::block_marker::BlockMarker;
use tn::lanczos::{lanczos, LanczosOptions};
use tn::linalg::{eigh, norm};
use tn::mps::{CanonicalMps, Tensor4};
use tn::truncation::ZERO_REF;
use tn::{LinalgError, C64};

/// Below this many states the superblock is diagonalized densely.
pub const DENSE_LIMIT: usize = 400;

const DEFAULT_SEED: &[u8] = b"dmrg";

/// Diagnostics of one step.
#[derive(Clone, Debug)]
pub struct StepRecord {
    /// Pass index (from 1) of a finite run, `None` for infinite growth.
    pub pass: Option<usize>,
    pub direction: Direction,
    /// Sweep position, or the growth iteration of an infinite run.
    pub site: usize,
    /// Sites covered by the superblock.
    pub window: usize,
    /// Ground-state energy per site.
    pub energy: f64,
    /// Change of `energy` with respect to the previous step.
    pub delta: f64,
    pub truncation_error: f64,
    /// Retained states of the left block.
    pub kept: usize,
    /// Overlap of the selected eigenvector with the start vector.
    pub overlap: f64,
    /// Kept Schmidt weights of both sides, descending.
    pub spectrum_left: Vec<f64>,
    pub spectrum_right: Vec<f64>,
    /// Wall time of the step in seconds.
    pub elapsed: f64,
}

/// Result of one step before it is logged.
struct StepOutput {
    /// Total energies of the retained levels.
    energies: Vec<f64>,
    /// Retained eigenvectors as `(a, s1, r, s2)` tensors.
    wavefunctions: Vec<Tensor4>,
    truncation_error: f64,
    kept: usize,
    overlap: f64,
    spectrum_left: Vec<f64>,
    spectrum_right: Vec<f64>,
    /// Truncated blocks.
    pair: BlockPair,
}

enum WarmStart {
    Unbiased,
    Predict,
}

/// Whether the step after `(direction, i)` starts from a prediction.
///
/// Growth steps, turning points and the steps whose successor swaps the
/// blocks under reflection start from a random vector.
fn warm_start(n: usize, window: usize, reflect: bool, direction: Direction, i: usize) -> WarmStart {
    let half = n / 2;
    let unbiased = window != n
        || (reflect
            && n % 2 == 0
            && ((direction == Direction::Right && i + 2 == half)
                || (direction == Direction::Left && i == half)))
        || (reflect && direction == Direction::Right && i + 1 == half)
        || (direction == Direction::Right && i + 2 == n)
        || (direction == Direction::Left && i == 0);
    if unbiased {
        WarmStart::Unbiased
    } else {
        WarmStart::Predict
    }
}

fn per_state(spectrum: &[f64], mask: &[bool]) -> Vec<f64> {
    let mut kept: Vec<f64> = spectrum
        .iter()
        .zip(mask)
        .filter(|(_, &k)| k)
        .map(|(&w, _)| w)
        .collect();
    kept.sort_by(|a, b| b.total_cmp(a));
    kept
}

fn overlap(a: &[C64], b: &[C64]) -> f64 {
    let (na, nb) = (norm(a), norm(b));
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    let dot: C64 = a.iter().zip(b).map(|(x, y)| x.conj() * y).sum();
    dot.norm() / (na * nb)
}

/// Two-block DMRG driver.
///
/// Owns the chain, the initial block and the cache of truncated blocks
/// built along the sweeps.
pub struct DmrgEngine {
    chain: OpCollection,
    generator: BlockGenerator,
    labeling: Option<BlockLabeling>,
    reflect: bool,
    cache: BlockCache,
    rng: ShakeRng,
    records: Vec<StepRecord>,
    pub lanczos: LanczosOptions,
}

impl DmrgEngine {
    /// `generator` is the empty block every run grows from. With a labeling
    /// the blocks carry quantum-number labels and the vacuum label is
    /// attached here. `reflect` declares the chain mirror symmetric.
    pub fn new(
        chain: OpCollection,
        generator: BlockGenerator,
        labeling: Option<BlockLabeling>,
        reflect: bool,
    ) -> Self {
        let generator = match &labeling {
            Some(l) => generator.with_marker(BlockMarker::vacuum(l.nqn())),
            None => generator,
        };
        let cache = BlockCache::new(&generator, reflect);
        Self {
            chain,
            generator,
            labeling,
            reflect,
            cache,
            rng: ShakeRng::new(DEFAULT_SEED),
            records: Vec::new(),
            lanczos: LanczosOptions::default(),
        }
    }

    /// Reseeds the random start vectors.
    pub fn with_seed(mut self, seed: &[u8]) -> Self {
        self.rng = ShakeRng::new(seed);
        self
    }

    pub fn nsite(&self) -> usize {
        self.chain.nsite
    }

    pub fn chain(&self) -> &OpCollection {
        &self.chain
    }

    pub fn reflect(&self) -> bool {
        self.reflect
    }

    /// Steps of every run so far.
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn cache(&self) -> &BlockCache {
        &self.cache
    }

    fn check_common(&self, params: &BlockParams) -> Result<()> {
        if self.generator.evolutor() == Evolutor::Null {
            return Err(DmrgError::Configuration(
                "DMRG needs an isometric evolutor".to_string(),
            ));
        }
        if !self.generator.is_empty() {
            return Err(DmrgError::Configuration(format!(
                "initial block must be empty, got length {}",
                self.generator.len()
            )));
        }
        if self.generator.space() != &self.chain.space {
            return Err(DmrgError::Configuration(
                "block and chain act on different site spaces".to_string(),
            ));
        }
        if params.nlevel == 0 {
            return Err(DmrgError::Configuration("nlevel must be positive".to_string()));
        }
        if let Some(p) = params.parity {
            if p != 1 && p != -1 {
                return Err(DmrgError::Configuration(format!(
                    "reflection parity must be +1 or -1, got {}",
                    p
                )));
            }
        }
        if params.nlevel > 1 && (!params.target_sector.is_none() || params.parity.is_some()) {
            return Err(DmrgError::UnsupportedConfiguration(
                "several levels cannot be combined with a target sector or parity".to_string(),
            ));
        }
        match &self.labeling {
            None if !params.target_sector.is_none() => {
                return Err(DmrgError::UnsupportedConfiguration(
                    "a target sector needs a labeled block".to_string(),
                ));
            }
            Some(l) => {
                if l.site_labels.len() != self.chain.space.dim {
                    return Err(DmrgError::Configuration(format!(
                        "labeling has {} site labels for a {}-state site",
                        l.site_labels.len(),
                        self.chain.space.dim
                    )));
                }
                params.target_sector.validate(l)?;
            }
            None => {}
        }
        Ok(())
    }

    /// Splits the chain terms for a step with blocks of `nl` and `nr` sites.
    ///
    /// Left terms end on the new left site, right terms start on the new
    /// right site (mapped into the right frame), everything else straddling
    /// the cut couples the blocks.
    fn partition(&self, nl: usize, nr: usize) -> (Vec<OpString>, Vec<OpString>, Vec<OpString>) {
        let window = nl + nr + 2;
        let (mut left, mut right, mut coupling) = (Vec::new(), Vec::new(), Vec::new());
        let mut dropped = 0;
        for op in &self.chain.ops {
            let (Some(lo), Some(hi)) = (op.min_site(), op.max_site()) else {
                continue;
            };
            if hi >= window {
                dropped += 1;
            } else if hi <= nl {
                if hi == nl {
                    left.push(op.clone());
                }
            } else if lo > nl {
                if lo == nl + 1 {
                    right.push(op.site_image(nl + 1, nr + 1));
                }
            } else {
                coupling.push(op.clone());
            }
        }
        if dropped > 0 {
            debug!("{} terms fall outside the {}-site window", dropped, window);
        }
        (left, right, coupling)
    }

    /// Lowest `k` eigenpairs of a `dim`-dimensional operator.
    fn eigensolve<F, D>(
        &mut self,
        apply: F,
        dense: D,
        dim: usize,
        k: usize,
        v0: &[C64],
        tol: f64,
    ) -> Result<(Vec<f64>, Vec<Vec<C64>>)>
    where
        F: Fn(&[C64]) -> Vec<C64>,
        D: FnOnce() -> Mat<C64>,
    {
        let k = k.min(dim);
        if dim < DENSE_LIMIT {
            let (values, vecs) = eigh(&dense())?;
            let vectors = (0..k)
                .map(|j| (0..dim).map(|i| vecs.read(i, j)).collect())
                .collect();
            return Ok((values[..k].to_vec(), vectors));
        }

        let mut opts = self.lanczos;
        if tol > 0.0 {
            opts.tol = opts.tol.min(tol * 1e-2);
        }
        let pairs = match lanczos(&apply, dim, k, v0, &opts, &mut self.rng) {
            Ok(p) => p,
            Err(LinalgError::ConvergenceFailure { requested, matvecs }) => {
                warn!(
                    "lanczos missed {} levels after {} products, retrying with {}",
                    requested,
                    matvecs,
                    k + 1
                );
                let mut p = lanczos(&apply, dim, k + 1, v0, &opts, &mut self.rng).map_err(
                    |e| match e {
                        LinalgError::ConvergenceFailure { requested, matvecs } => {
                            DmrgError::ConvergenceFailure(format!(
                                "{} levels of a {}-state superblock not converged after {} products",
                                requested, dim, matvecs
                            ))
                        }
                        other => other.into(),
                    },
                )?;
                p.truncate(k);
                p
            }
            Err(e) => return Err(e.into()),
        };
        Ok((pairs.values, pairs.vectors))
    }

    /// One superblock step: expands both blocks, finds the targeted states
    /// and truncates the blocks to the dominant basis.
    fn step(
        &mut self,
        pair: BlockPair,
        trunc: &Truncation,
        params: &BlockParams,
        initial: Option<Vec<C64>>,
        handler: &mut SymmetryHandler,
        tol: f64,
    ) -> Result<StepOutput> {
        let (nl, nr) = (pair.left().len(), pair.right().len());
        let window = nl + nr + 2;
        let (left_ops, right_ops, coupling) = self.partition(nl, nr);

        let mut pair = pair;
        match &mut pair {
            BlockPair::Shared(g) => {
                g.expand(&left_ops)?;
            }
            BlockPair::Distinct(l, r) => {
                l.expand(&left_ops)?;
                r.expand(&right_ops)?;
            }
        }
        let (dl, dr) = (pair.left().dim_at(nl), pair.right().dim_at(nr));
        let d = self.chain.space.dim;

        let (bml, bmr) = match &self.labeling {
            Some(l) => {
                let site = l.site_marker();
                (
                    pair.left().expanded_marker(&site),
                    pair.right().expanded_marker(&site),
                )
            }
            None => (None, None),
        };
        handler.target = match &self.labeling {
            Some(l) => params.target_sector.resolve(l, window),
            None => None,
        };

        let sb = SuperBlock::new(pair.left(), pair.right(), &coupling);
        let (ndiml, ndimr) = (sb.ndiml(), sb.ndimr());
        let dim = sb.dim();

        if handler.detects_c() {
            if nl == nr && ndiml == ndimr {
                let odd = pair
                    .left()
                    .expanded_parity()
                    .iter()
                    .map(|&p| usize::from(p < 0))
                    .collect();
                handler.update_handlers(Some(odd));
            } else {
                handler.update_handlers(None);
            }
        }

        let v00 = match initial {
            Some(v) if v.len() == dim => v,
            other => {
                if let Some(v) = other {
                    debug!("discarding start vector of length {} for dimension {}", v.len(), dim);
                }
                self.rng
                    .uniform_vector(dim, b"DMRG_V0")
                    .into_iter()
                    .map(|x| C64::new(x, 0.0))
                    .collect()
            }
        };

        let k = params
            .nlevel
            .max(if handler.detects_c() { handler.c_detect_scope } else { 1 });

        let (values, vectors) = match (&handler.target, &bml, &bmr) {
            (Some(target), Some(l), Some(r)) => {
                let indices = l.kron(r).extract_block(target);
                if indices.is_empty() {
                    return Err(DmrgError::Configuration(format!(
                        "target sector {:?} is empty for a {}-site window",
                        target, window
                    )));
                }
                let restricted = Restricted {
                    indices: &indices,
                    dim,
                    apply: |v: &[C64]| sb.apply(v),
                };
                let n = indices.len();
                let v0 = restricted.extract(&v00);
                let dense = || {
                    let cols: Vec<Vec<C64>> = (0..n)
                        .map(|j| {
                            let mut e = vec![C64::new(0.0, 0.0); n];
                            e[j] = C64::new(1.0, 0.0);
                            restricted.apply(&e)
                        })
                        .collect();
                    Mat::from_fn(n, n, |i, j| cols[j][i])
                };
                let (values, sub) =
                    self.eigensolve(|v: &[C64]| restricted.apply(v), dense, n, k, &v0, tol)?;
                (values, sub.iter().map(|v| restricted.embed(v)).collect::<Vec<_>>())
            }
            _ => self.eigensolve(|v: &[C64]| sb.apply(v), || sb.dense(), dim, k, &v00, tol)?,
        };

        let overlaps: Vec<f64> = vectors.iter().map(|v| overlap(&v00, v)).collect();
        let (energies, mut vectors, overlaps) = if handler.detects_c() {
            let chosen = if handler.use_c() {
                let found = handler.locate(&vectors);
                let Some(&first) = found.first() else {
                    return Err(DmrgError::Configuration(format!(
                        "no state of reflection parity {:?} among the lowest {}",
                        handler.parity,
                        vectors.len()
                    )));
                };
                debug!(
                    "{} of {} candidates carry the requested parity",
                    found.len(),
                    vectors.len()
                );
                first
            } else {
                overlaps
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map_or(0, |(i, _)| i)
            };
            (
                vec![values[chosen]],
                vec![vectors[chosen].clone()],
                vec![overlaps[chosen]],
            )
        } else {
            (values, vectors, overlaps)
        };
        for v in vectors.iter_mut() {
            for x in v.iter_mut() {
                if x.norm() < ZERO_REF {
                    *x = C64::new(0.0, 0.0);
                }
            }
        }

        let phi = combined_wavefunction(&vectors, ndiml, ndimr);
        let analysis = analyze(&phi, bml.as_ref(), bmr.as_ref(), trunc, params.strategy)?;
        let (u, ulabels) = analysis.left.kept(&analysis.left_mask);
        match &mut pair {
            BlockPair::Shared(g) => g.truncate(&u, ulabels)?,
            BlockPair::Distinct(l, r) => {
                let (w, wlabels) = analysis.right.kept(&analysis.right_mask);
                l.truncate(&u, ulabels)?;
                r.truncate(&w, wlabels)?;
            }
        }

        Ok(StepOutput {
            energies,
            wavefunctions: vectors
                .into_iter()
                .map(|v| Tensor4::from_vec(v, dl, d, dr, d))
                .collect(),
            truncation_error: analysis.truncation_error(),
            kept: analysis.left_mask.kept(),
            overlap: overlaps.first().copied().unwrap_or(0.0),
            spectrum_left: per_state(&analysis.left.weights, &analysis.left_mask.mask),
            spectrum_right: per_state(&analysis.right.weights, &analysis.right_mask.mask),
            pair,
        })
    }

    /// Writes the blocks truncated in a step back into the cache.
    fn store(&mut self, pair: &BlockPair) {
        match pair {
            BlockPair::Shared(g) => {
                self.cache.set(Side::Left, g.clone());
                if !self.reflect {
                    self.cache.set(Side::Right, g.clone());
                }
            }
            BlockPair::Distinct(l, r) => {
                self.cache.set(Side::Left, l.clone());
                if !self.reflect || l.len() != r.len() {
                    self.cache.set(Side::Right, r.clone());
                }
            }
        }
    }

    /// Infinite-size growth: a symmetric pair of blocks gains one site on
    /// each side per iteration until the energy per site changes by less
    /// than `tol` or `maxiter` iterations ran.
    ///
    /// Returns the energy per site of every iteration.
    pub fn run_infinite(
        &mut self,
        maxiter: usize,
        tol: f64,
        trunc: Truncation,
        params: &BlockParams,
    ) -> Result<Vec<f64>> {
        self.check_common(params)?;
        if maxiter > self.nsite() {
            warn!(
                "{} iterations exceed the {} sites of the chain",
                maxiter,
                self.nsite()
            );
        }
        if params.parity.is_some() && !self.reflect {
            warn!("reflection parity requested on a chain not declared mirror symmetric");
        }
        let mut handler = SymmetryHandler::new(params.parity, params.c_detect_scope.unwrap_or(3));
        let mut gen = self.generator.clone();
        let mut energies: Vec<f64> = Vec::new();

        for i in 0..maxiter {
            let t0 = Instant::now();
            let out = self.step(BlockPair::Shared(gen), &trunc, params, None, &mut handler, tol)?;
            let energy = out.energies[0] / (2 * (i + 1)) as f64;
            let delta = energies.last().map_or(f64::INFINITY, |&e| energy - e);
            info!(
                "iteration {}: {} sites, E/site = {:.12}, dE = {:.3e}, err = {:.3e}, kept {}",
                i,
                2 * (i + 1),
                energy,
                delta,
                out.truncation_error,
                out.kept
            );
            self.records.push(StepRecord {
                pass: None,
                direction: Direction::Right,
                site: i,
                window: 2 * (i + 1),
                energy,
                delta,
                truncation_error: out.truncation_error,
                kept: out.kept,
                overlap: out.overlap,
                spectrum_left: out.spectrum_left,
                spectrum_right: out.spectrum_right,
                elapsed: t0.elapsed().as_secs_f64(),
            });
            energies.push(energy);
            gen = out.pair.into_left();
            if delta.abs() < tol {
                info!("converged after {} iterations", i + 1);
                break;
            }
        }
        Ok(energies)
    }

    /// Finite-size sweeps.
    ///
    /// Pass `p` scans `->` then `<-` with truncation `schedule[p]`. The first
    /// half of the first `->` scan grows the blocks from scratch. The run
    /// stops at `endpoint` and returns the energy per site there together
    /// with the canonical MPS of that step.
    pub fn run_finite(
        &mut self,
        endpoint: Endpoint,
        tol: f64,
        schedule: &[Truncation],
        params: &BlockParams,
    ) -> Result<(f64, CanonicalMps)> {
        self.check_common(params)?;
        let n = self.nsite();
        let min_sites = if self.reflect { 4 } else { 2 };
        if n < min_sites {
            return Err(DmrgError::Configuration(format!(
                "finite sweeps need at least {} sites, got {}",
                min_sites, n
            )));
        }
        if self.reflect && n % 2 == 1 {
            return Err(DmrgError::Configuration(format!(
                "reflected sweeps need an even number of sites, got {}",
                n
            )));
        }
        if params.parity.is_some() && !self.reflect {
            return Err(DmrgError::Configuration(
                "reflection parity needs a mirror symmetric chain".to_string(),
            ));
        }
        if endpoint.pass == 0 || schedule.len() < endpoint.pass {
            return Err(DmrgError::Configuration(format!(
                "endpoint at pass {} with a schedule of {} passes",
                endpoint.pass,
                schedule.len()
            )));
        }
        let last_site = if self.reflect { n / 2 - 2 } else { n - 2 };
        if endpoint.site > last_site {
            return Err(DmrgError::Configuration(format!(
                "endpoint site {} beyond the last sweep position {}",
                endpoint.site, last_site
            )));
        }
        if endpoint.pass == 1
            && endpoint.direction == Direction::Right
            && endpoint.site < (n + 1) / 2
        {
            return Err(DmrgError::Configuration(format!(
                "endpoint {} {} lies in the warmup of the first pass",
                endpoint.direction, endpoint.site
            )));
        }

        self.cache = BlockCache::new(&self.generator, self.reflect);
        let mut handler = SymmetryHandler::new(params.parity, params.c_detect_scope.unwrap_or(2));
        let mut initial: Option<Vec<C64>> = None;
        let mut previous: Option<f64> = None;
        let mut endpoint_prev: Option<f64> = None;

        for (pass, trunc) in schedule.iter().take(endpoint.pass).enumerate() {
            info!("pass {} with {:?}", pass + 1, trunc);
            for direction in [Direction::Right, Direction::Left] {
                let sites: Vec<usize> = match (self.reflect, direction) {
                    (false, Direction::Right) => (0..n - 1).collect(),
                    (false, Direction::Left) => (0..n - 1).rev().collect(),
                    (true, Direction::Right) => (0..n / 2).collect(),
                    (true, Direction::Left) => (0..=n / 2 - 2).rev().collect(),
                };
                for i in sites {
                    let t0 = Instant::now();
                    let shared = (pass == 0 && direction == Direction::Right && i < (n + 1) / 2)
                        || (self.reflect && n % 2 == 0 && i == n / 2);
                    let left = self.cache.query(Side::Left, i)?;
                    let pair = if shared {
                        BlockPair::Shared(left)
                    } else {
                        BlockPair::Distinct(left, self.cache.query(Side::Right, n - i - 2)?)
                    };
                    let window = pair.window();
                    let out = self.step(pair, trunc, params, initial.take(), &mut handler, tol)?;
                    self.store(&out.pair);

                    let energy = out.energies[0] / window as f64;
                    let delta = previous.map_or(f64::INFINITY, |e| energy - e);
                    previous = Some(energy);
                    info!(
                        "pass {} {} site {}: E/site = {:.12}, dE = {:.3e}, err = {:.3e}, kept {}, ovl {:.4}",
                        pass + 1,
                        direction,
                        i,
                        energy,
                        delta,
                        out.truncation_error,
                        out.kept,
                        out.overlap
                    );

                    initial = match warm_start(n, window, self.reflect, direction, i) {
                        WarmStart::Unbiased => None,
                        WarmStart::Predict => {
                            let (l, r) = (out.pair.left(), out.pair.right());
                            let mut sum: Option<Vec<C64>> = None;
                            for phi in &out.wavefunctions {
                                let next = predict(phi, l, r, direction)?;
                                sum = Some(match sum {
                                    None => next.data,
                                    Some(acc) => {
                                        acc.iter().zip(&next.data).map(|(a, b)| a + b).collect()
                                    }
                                });
                            }
                            sum
                        }
                    };

                    let at_endpoint = direction == endpoint.direction && i == endpoint.site;
                    let finished = at_endpoint && pass + 1 == endpoint.pass;
                    if at_endpoint {
                        info!(
                            "pass {} endpoint: E/site = {:.12}, dE = {:.3e}",
                            pass + 1,
                            energy,
                            endpoint_prev.map_or(f64::INFINITY, |e| energy - e)
                        );
                        endpoint_prev = Some(energy);
                    }
                    let mps = if finished {
                        Some(assemble(
                            &out.wavefunctions[0],
                            out.pair.left(),
                            out.pair.right(),
                            direction,
                        )?)
                    } else {
                        None
                    };
                    self.records.push(StepRecord {
                        pass: Some(pass + 1),
                        direction,
                        site: i,
                        window,
                        energy,
                        delta,
                        truncation_error: out.truncation_error,
                        kept: out.kept,
                        overlap: out.overlap,
                        spectrum_left: out.spectrum_left,
                        spectrum_right: out.spectrum_right,
                        elapsed: t0.elapsed().as_secs_f64(),
                    });
                    if let Some(mps) = mps {
                        info!("reached endpoint {} {} of pass {}", direction, i, pass + 1);
                        return Ok((energy, mps));
                    }
                }
            }
        }
        Err(DmrgError::Configuration(
            "sweep schedule ended before the endpoint".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantum::hamiltonian::transverse_ising;
    use quantum::SiteSpace;

    fn engine(n: usize, reflect: bool) -> DmrgEngine {
        let chain = transverse_ising(n, 1.0, 0.7);
        let gen = BlockGenerator::new(SiteSpace::spin_half(), Evolutor::Isometric);
        DmrgEngine::new(chain, gen, None, reflect)
    }

    #[test]
    fn warm_start_at_turning_points() {
        assert!(matches!(warm_start(8, 6, false, Direction::Right, 1), WarmStart::Unbiased));
        assert!(matches!(warm_start(8, 8, false, Direction::Right, 6), WarmStart::Unbiased));
        assert!(matches!(warm_start(8, 8, false, Direction::Left, 0), WarmStart::Unbiased));
        assert!(matches!(warm_start(8, 8, false, Direction::Right, 3), WarmStart::Predict));
        assert!(matches!(warm_start(8, 8, true, Direction::Right, 3), WarmStart::Unbiased));
        assert!(matches!(warm_start(8, 8, true, Direction::Right, 2), WarmStart::Unbiased));
        assert!(matches!(warm_start(8, 8, true, Direction::Left, 4), WarmStart::Unbiased));
        assert!(matches!(warm_start(8, 8, true, Direction::Left, 1), WarmStart::Predict));
    }

    #[test]
    fn partition_routes_terms_by_position() {
        let e = engine(6, false);
        let (left, right, coupling) = e.partition(1, 2);
        // 5-site window: left ends on 1, right starts on 2 (frame 2)
        assert!(left.iter().all(|op| op.max_site() == Some(1)));
        assert!(right.iter().all(|op| op.max_site() == Some(2)));
        assert_eq!(coupling.len(), 1);
        assert_eq!(coupling[0].sites(), vec![1, 2]);
        // ZZ(0,1), X(1) on the left, X(2) and ZZ(2,3) on the right
        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 2);
    }

    #[test]
    fn endpoint_in_warmup_is_rejected() {
        let mut e = engine(6, false);
        let end = Endpoint {
            pass: 1,
            direction: Direction::Right,
            site: 1,
        };
        let err = e
            .run_finite(end, 1e-8, &[Truncation::new(8)], &BlockParams::default())
            .unwrap_err();
        assert!(matches!(err, DmrgError::Configuration(_)));
    }
}
