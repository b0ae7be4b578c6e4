use tn::block_marker::Label;
use tn::C64;

/// Tolerance on `⟨v|C|v⟩` when matching a reflection parity.
const PARITY_TOL: f64 = 1e-2;

/// Target sector and reflection parity of the current step.
#[derive(Clone, Debug)]
pub struct SymmetryHandler {
    /// Joint label the ground state is searched in.
    pub target: Option<Label>,
    /// Requested reflection parity.
    pub parity: Option<i8>,
    /// Number of candidates inspected when a parity is requested.
    pub c_detect_scope: usize,
    use_c: bool,
    /// Fermion parity (0/1) of the expanded left basis; the right basis is
    /// its mirror image.
    odd: Vec<usize>,
}

impl SymmetryHandler {
    pub fn new(parity: Option<i8>, c_detect_scope: usize) -> Self {
        Self {
            target: None,
            parity,
            c_detect_scope,
            use_c: false,
            odd: Vec::new(),
        }
    }

    pub fn detects_c(&self) -> bool {
        self.parity.is_some()
    }

    /// Whether the reflection can be applied in this step.
    pub fn use_c(&self) -> bool {
        self.use_c
    }

    /// Enables the reflection with the occupation parity of the expanded left
    /// basis, or disables it (`None`) when the blocks are not mirror images.
    pub fn update_handlers(&mut self, odd: Option<Vec<usize>>) {
        match odd {
            Some(odd) => {
                self.use_c = true;
                self.odd = odd;
            }
            None => {
                self.use_c = false;
                self.odd.clear();
            }
        }
    }

    /// `(C v)[x, y] = (-1)^{n(x) n(y)} v[y, x]`.
    pub fn reflect(&self, v: &[C64]) -> Vec<C64> {
        let m = self.odd.len();
        let mut out = vec![C64::new(0.0, 0.0); v.len()];
        for x in 0..m {
            for y in 0..m {
                let sign = if self.odd[x] * self.odd[y] == 1 { -1.0 } else { 1.0 };
                out[x * m + y] = v[y * m + x] * sign;
            }
        }
        out
    }

    /// `⟨v|C|v⟩ / ⟨v|v⟩`.
    pub fn reflection_parity(&self, v: &[C64]) -> f64 {
        let cv = self.reflect(v);
        let num: C64 = v.iter().zip(&cv).map(|(a, b)| a.conj() * b).sum();
        let den: f64 = v.iter().map(|a| a.norm_sqr()).sum();
        if den == 0.0 {
            0.0
        } else {
            num.re / den
        }
    }

    /// Indices of the candidates carrying the requested parity.
    pub fn locate(&self, vectors: &[Vec<C64>]) -> Vec<usize> {
        let Some(target) = self.parity else {
            return (0..vectors.len()).collect();
        };
        vectors
            .iter()
            .enumerate()
            .filter(|(_, v)| (self.reflection_parity(v) - target as f64).abs() < PARITY_TOL)
            .map(|(i, _)| i)
            .collect()
    }
}
