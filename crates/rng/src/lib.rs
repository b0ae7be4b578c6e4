use sha3::{digest::{ExtendableOutput, Update, XofReader}, Shake256};

/// Deterministic random source keyed by a seed string.
///
/// Every draw is tagged with a context so that unrelated consumers sharing one
/// generator stay reproducible when the seed is fixed.
pub struct ShakeRng {
    state: [u8; 32],
    step: u64,
}

impl ShakeRng {
    pub fn new(seed: &[u8]) -> Self {
        let mut state = [0u8; 32];
        shake(&[seed, b"DMRG_INIT"], &mut state);
        Self { state, step: 0 }
    }

    /// `dim` uniform samples in `[0, 1]`, drawn from one state advance.
    pub fn uniform_vector(&mut self, dim: usize, ctx: &[u8]) -> Vec<f64> {
        self.step += 1;

        let state = self.state;
        let step_bytes = self.step.to_be_bytes();
        let mut next_state = self.state;
        shake(&[&state, &step_bytes, b"VECTOR"], &mut next_state);
        self.state = next_state;

        let mut bytes = vec![0u8; dim * 8];
        shake(&[&self.state, ctx], &mut bytes);
        bytes
            .chunks_exact(8)
            .map(|c| {
                let mut word = [0u8; 8];
                word.copy_from_slice(c);
                (u64::from_be_bytes(word) as f64) / (u64::MAX as f64)
            })
            .collect()
    }
}

fn shake(parts: &[&[u8]], out: &mut [u8]) {
    let mut h = Shake256::default();
    for p in parts {
        h.update(p);
    }
    let mut r = h.finalize_xof();
    r.read(out);
}
