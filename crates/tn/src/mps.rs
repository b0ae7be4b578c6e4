use num_complex::Complex64;

pub type C64 = Complex64;

/// Three-leg tensor stored as `(left link, site, right link)`.
#[derive(Clone, Debug)]
pub struct Tensor3 {
    pub data: Vec<C64>,
    pub dl: usize,
    pub dp: usize,
    pub dr: usize,
}

impl Tensor3 {
    pub fn zeros(dl: usize, dp: usize, dr: usize) -> Self {
        Self {
            data: vec![C64::new(0.0, 0.0); dl * dp * dr],
            dl,
            dp,
            dr,
        }
    }

    pub fn from_fn<F>(dl: usize, dp: usize, dr: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize) -> C64,
    {
        let mut t = Self::zeros(dl, dp, dr);
        for l in 0..dl {
            for p in 0..dp {
                for r in 0..dr {
                    t.set(l, p, r, f(l, p, r));
                }
            }
        }
        t
    }

    #[inline]
    fn idx(&self, l: usize, p: usize, r: usize) -> usize {
        (l * self.dp + p) * self.dr + r
    }

    pub fn get(&self, l: usize, p: usize, r: usize) -> C64 {
        self.data[self.idx(l, p, r)]
    }

    pub fn set(&mut self, l: usize, p: usize, r: usize, v: C64) {
        let i = self.idx(l, p, r);
        self.data[i] = v;
    }
}

/// Four-leg two-site wavefunction `(left basis, left site, right basis, right site)`.
///
/// The flat layout matches the joint basis of a superblock: the row index of
/// the left expanded block is `l * d1 + s1`, the right one is `r * d2 + s2`,
/// and the joint index is `left * (dr * d2) + right`.
#[derive(Clone, Debug)]
pub struct Tensor4 {
    pub data: Vec<C64>,
    pub dl: usize,
    pub d1: usize,
    pub dr: usize,
    pub d2: usize,
}

impl Tensor4 {
    pub fn zeros(dl: usize, d1: usize, dr: usize, d2: usize) -> Self {
        Self {
            data: vec![C64::new(0.0, 0.0); dl * d1 * dr * d2],
            dl,
            d1,
            dr,
            d2,
        }
    }

    pub fn from_vec(data: Vec<C64>, dl: usize, d1: usize, dr: usize, d2: usize) -> Self {
        assert_eq!(data.len(), dl * d1 * dr * d2, "wavefunction size mismatch");
        Self { data, dl, d1, dr, d2 }
    }

    #[inline]
    fn idx(&self, l: usize, s1: usize, r: usize, s2: usize) -> usize {
        ((l * self.d1 + s1) * self.dr + r) * self.d2 + s2
    }

    pub fn get(&self, l: usize, s1: usize, r: usize, s2: usize) -> C64 {
        self.data[self.idx(l, s1, r, s2)]
    }

    pub fn set(&mut self, l: usize, s1: usize, r: usize, s2: usize, v: C64) {
        let i = self.idx(l, s1, r, s2);
        self.data[i] = v;
    }

    pub fn norm(&self) -> f64 {
        self.data.iter().map(|x| x.norm_sqr()).sum::<f64>().sqrt()
    }

    /// Rows of the left expanded block.
    pub fn left_dim(&self) -> usize {
        self.dl * self.d1
    }

    /// Columns of the right expanded block.
    pub fn right_dim(&self) -> usize {
        self.dr * self.d2
    }
}

/// Matrix product state in chain order.
#[derive(Clone, Debug)]
pub struct MPS {
    pub sites: Vec<Tensor3>,
}

impl MPS {
    /// Product state with site `k` in local basis state `states[k]`.
    pub fn product(states: &[usize], d: usize) -> Self {
        let sites = states
            .iter()
            .map(|&p| {
                let mut t = Tensor3::zeros(1, d, 1);
                t.set(0, p, 0, C64::new(1.0, 0.0));
                t
            })
            .collect();
        Self { sites }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn bond_dims(&self) -> Vec<usize> {
        self.sites.iter().skip(1).map(|s| s.dl).collect()
    }
}

/// Mixed-canonical MPS: `A[0] … A[l-1] · diag(s) · B[l] … B[n-1]`.
///
/// Left tensors are left-orthonormal, right tensors are right-orthonormal,
/// and `s` holds the Schmidt values of the bond between them.
#[derive(Clone, Debug)]
pub struct CanonicalMps {
    pub left: Vec<Tensor3>,
    pub s: Vec<f64>,
    pub right: Vec<Tensor3>,
}

impl CanonicalMps {
    pub fn nsite(&self) -> usize {
        self.left.len() + self.right.len()
    }

    /// Bond index of the singular values (number of left tensors).
    pub fn center(&self) -> usize {
        self.left.len()
    }

    /// Von Neumann entropy of the central bond.
    pub fn entanglement_entropy(&self) -> f64 {
        let total: f64 = self.s.iter().map(|x| x * x).sum();
        if total == 0.0 {
            return 0.0;
        }
        self.s
            .iter()
            .map(|x| x * x / total)
            .filter(|&p| p > 0.0)
            .map(|p| -p * p.ln())
            .sum()
    }

    /// Absorbs the singular values into the first right tensor (or the last
    /// left tensor when no right tensor exists).
    pub fn to_mps(&self) -> MPS {
        let mut sites: Vec<Tensor3> = self.left.clone();
        let mut right = self.right.clone();
        if let Some(b) = right.first_mut() {
            for l in 0..b.dl {
                let w = self.s.get(l).copied().unwrap_or(0.0);
                for p in 0..b.dp {
                    for r in 0..b.dr {
                        let v = b.get(l, p, r);
                        b.set(l, p, r, v * w);
                    }
                }
            }
        } else if let Some(a) = sites.last_mut() {
            for l in 0..a.dl {
                for p in 0..a.dp {
                    for r in 0..a.dr {
                        let w = self.s.get(r).copied().unwrap_or(0.0);
                        let v = a.get(l, p, r);
                        a.set(l, p, r, v * w);
                    }
                }
            }
        }
        sites.extend(right);
        MPS { sites }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_site(p: usize) -> Tensor3 {
        let mut t = Tensor3::zeros(1, 2, 1);
        t.set(0, p, 0, C64::new(1.0, 0.0));
        t
    }

    #[test]
    fn tensor4_layout_matches_joint_index() {
        let mut t = Tensor4::zeros(2, 2, 3, 2);
        t.set(1, 0, 2, 1, C64::new(5.0, 0.0));
        let left = 1 * 2 + 0;
        let right = 2 * 2 + 1;
        assert_eq!(t.data[left * t.right_dim() + right], C64::new(5.0, 0.0));
    }

    #[test]
    fn to_mps_absorbs_singular_values() {
        let mps = CanonicalMps {
            left: vec![product_site(0)],
            s: vec![0.5],
            right: vec![product_site(1)],
        };
        let plain = mps.to_mps();
        assert_eq!(plain.len(), 2);
        assert_eq!(plain.sites[1].get(0, 1, 0), C64::new(0.5, 0.0));
        assert_eq!(plain.sites[0].get(0, 0, 0), C64::new(1.0, 0.0));
    }

    #[test]
    fn entropy_of_maximally_entangled_pair() {
        let s = 1.0 / 2.0_f64.sqrt();
        let mps = CanonicalMps {
            left: vec![],
            s: vec![s, s],
            right: vec![],
        };
        assert!((mps.entanglement_entropy() - 2.0_f64.ln()).abs() < 1e-12);
    }
}
