use faer::Mat;
use std::collections::BTreeMap;
use tn::mps::{C64, Tensor3};

/// Pushes a left environment `env[l * dl + l']` (ket `l`, bra `l'`) through
/// one site, optionally inserting a local operator between bra and ket.
pub(crate) fn transfer(env: &[C64], a: &Tensor3, op: Option<&Mat<C64>>) -> Vec<C64> {
    let ket = match op {
        Some(o) => Tensor3::from_fn(a.dl, a.dp, a.dr, |l, p, r| {
            (0..a.dp).map(|q| o.read(p, q) * a.get(l, q, r)).sum()
        }),
        None => a.clone(),
    };

    let mut next = vec![C64::new(0.0, 0.0); a.dr * a.dr];
    for l in 0..a.dl {
        for lp in 0..a.dl {
            let lval = env[l * a.dl + lp];
            if lval == C64::new(0.0, 0.0) {
                continue;
            }
            for p in 0..a.dp {
                for r in 0..a.dr {
                    let kval = lval * ket.get(l, p, r);
                    for rp in 0..a.dr {
                        next[r * a.dr + rp] += kval * a.get(lp, p, rp).conj();
                    }
                }
            }
        }
    }
    next
}

/// `⟨ψ| ⊗_k O_k |ψ⟩` with the identity on sites missing from `ops`.
pub(crate) fn sandwich(sites: &[Tensor3], ops: &BTreeMap<usize, Mat<C64>>) -> C64 {
    let mut env = vec![C64::new(1.0, 0.0)];
    for (k, a) in sites.iter().enumerate() {
        env = transfer(&env, a, ops.get(&k));
    }
    // open boundaries leave a 1x1 environment
    env.iter().sum()
}
