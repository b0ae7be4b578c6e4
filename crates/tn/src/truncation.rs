/// Weights at or below this value are numerical noise and never kept.
pub const ZERO_REF: f64 = 1e-10;

/// Truncation budget of one sweep pass.
///
/// `max_bond` caps the number of kept states, `cutoff` is an extra floor on
/// the weight of a kept state. When both are set the smaller basis wins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Truncation {
    pub max_bond: usize,
    pub cutoff: f64,
}

impl Truncation {
    pub fn new(max_bond: usize) -> Self {
        Self {
            max_bond,
            cutoff: 0.0,
        }
    }

    /// Selects the states to keep from a spectrum of weights.
    ///
    /// The rank cutoff is the `max_bond`-th largest weight (the smallest one
    /// if fewer states exist). A state survives when its weight reaches the
    /// rank cutoff and exceeds the noise floor, so symmetry-forbidden
    /// zero-weight states are dropped even while the budget has room.
    pub fn keep_mask(&self, weights: &[f64]) -> KeepMask {
        if weights.is_empty() || self.max_bond == 0 {
            return KeepMask {
                discarded: weights.iter().map(|w| w.max(0.0)).sum(),
                mask: vec![false; weights.len()],
            };
        }

        let mut sorted = weights.to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));
        let rank_cut = sorted[self.max_bond.min(sorted.len()) - 1];
        let floor = self.cutoff.max(ZERO_REF);

        let mask: Vec<bool> = weights
            .iter()
            .map(|&w| w >= rank_cut && w > floor)
            .collect();
        let discarded = weights
            .iter()
            .zip(&mask)
            .filter(|&(_, &k)| !k)
            .map(|(w, _)| w.max(0.0))
            .sum();

        KeepMask { mask, discarded }
    }
}

/// Result of a keep-mask selection.
#[derive(Clone, Debug)]
pub struct KeepMask {
    pub mask: Vec<bool>,
    /// Sum of the discarded weights.
    pub discarded: f64,
}

impl KeepMask {
    pub fn kept(&self) -> usize {
        self.mask.iter().filter(|&&k| k).count()
    }

    pub fn kept_indices(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter(|&(_, &k)| k)
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn keeps_largest_weights() {
        let t = Truncation::new(2);
        let km = t.keep_mask(&[0.1, 0.6, 0.3]);
        assert_eq!(km.mask, vec![false, true, true]);
        assert!((km.discarded - 0.1).abs() < 1e-15);
    }

    #[test]
    fn zero_weights_dropped_even_with_spare_budget() {
        let t = Truncation::new(10);
        let km = t.keep_mask(&[0.7, 0.0, 0.3, 1e-14]);
        assert_eq!(km.kept(), 2);
        assert_eq!(km.kept_indices(), vec![0, 2]);
    }

    #[test]
    fn weight_cutoff_tightens_budget() {
        let t = Truncation {
            max_bond: 10,
            cutoff: 0.05,
        };
        let km = t.keep_mask(&[0.9, 0.06, 0.04]);
        assert_eq!(km.kept(), 2);
        assert!((km.discarded - 0.04).abs() < 1e-15);
    }

    #[test]
    fn degenerate_weights_at_the_cut_are_kept_together() {
        let t = Truncation::new(2);
        let km = t.keep_mask(&[0.4, 0.3, 0.3]);
        assert_eq!(km.kept(), 3);
    }

    proptest! {
        #[test]
        fn kept_plus_discarded_is_total(
            raw in prop::collection::vec(0.0f64..1.0, 1..24),
            max_bond in 1usize..30,
        ) {
            let total: f64 = raw.iter().sum();
            let weights: Vec<f64> = raw.iter().map(|w| w / total.max(1e-300)).collect();
            let km = Truncation::new(max_bond).keep_mask(&weights);
            let kept: f64 = weights
                .iter()
                .zip(&km.mask)
                .filter(|&(_, &k)| k)
                .map(|(w, _)| w)
                .sum();
            prop_assert!(km.discarded >= 0.0);
            prop_assert!((kept + km.discarded - weights.iter().sum::<f64>()).abs() < 1e-12);
        }

        #[test]
        fn error_grows_as_budget_shrinks(
            raw in prop::collection::vec(0.0f64..1.0, 2..24),
            max_bond in 2usize..30,
        ) {
            let big = Truncation::new(max_bond).keep_mask(&raw);
            let small = Truncation::new(max_bond - 1).keep_mask(&raw);
            prop_assert!(small.discarded + 1e-15 >= big.discarded);
        }
    }
}
