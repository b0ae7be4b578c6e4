use tn::block_marker::{BlockMarker, Label};

/// Conserved quantities of a site basis.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockLabeling {
    pub names: Vec<String>,
    /// One label per local basis state.
    pub site_labels: Vec<Label>,
}

impl BlockLabeling {
    pub fn new(names: &[&str], site_labels: Vec<Label>) -> Self {
        Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            site_labels,
        }
    }

    /// No conserved quantity, every state in one sector.
    pub fn trivial(d: usize) -> Self {
        Self {
            names: Vec::new(),
            site_labels: vec![Vec::new(); d],
        }
    }

    /// Twice the magnetization, `2m = 2s, 2s-2, …, -2s`.
    pub fn magnetization(twice_s: usize) -> Self {
        let labels = (0..=twice_s)
            .map(|i| vec![twice_s as i32 - 2 * i as i32])
            .collect();
        Self::new(&["2Sz"], labels)
    }

    pub fn particle_number() -> Self {
        Self::new(&["N"], vec![vec![0], vec![1]])
    }

    pub fn nqn(&self) -> usize {
        self.names.len()
    }

    pub fn site_marker(&self) -> BlockMarker {
        BlockMarker::new(self.site_labels.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spin_one_labels() {
        let l = BlockLabeling::magnetization(2);
        assert_eq!(l.site_labels, vec![vec![2], vec![0], vec![-2]]);
        assert_eq!(l.nqn(), 1);
    }

    #[test]
    fn trivial_labeling_has_one_sector() {
        let m = BlockLabeling::trivial(3).site_marker();
        assert_eq!(m.blocks().len(), 1);
    }
}
