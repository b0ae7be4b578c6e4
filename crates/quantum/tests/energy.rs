use quantum::energy::energy;
use quantum::hamiltonian::{heisenberg, transverse_ising};
use tn::mps::{C64, MPS, Tensor3};

fn bell() -> MPS {
    let s = 1.0 / 2.0_f64.sqrt();
    let a = Tensor3::from_fn(1, 2, 2, |_, p, r| C64::new(if p == r { s } else { 0.0 }, 0.0));
    let b = Tensor3::from_fn(2, 2, 1, |l, p, _| C64::new(if l == p { 1.0 } else { 0.0 }, 0.0));
    MPS { sites: vec![a, b] }
}

#[test]
fn bell_energy_ising() {
    let e = energy(&bell(), &transverse_ising(2, 1.0, 0.0));
    assert!((e + 1.0).abs() < 1e-12, "E = {}", e);
}

#[test]
fn bell_is_a_triplet() {
    let e = energy(&bell(), &heisenberg(2, 1.0));
    assert!((e - 0.25).abs() < 1e-12, "E = {}", e);
}

#[test]
fn ferromagnetic_product_state() {
    let psi = MPS::product(&[0, 0, 0, 0], 2);
    let e = energy(&psi, &heisenberg(4, 1.0));
    assert!((e - 0.75).abs() < 1e-12);
    let e = energy(&psi, &transverse_ising(4, 1.0, 3.0));
    assert!((e + 3.0).abs() < 1e-12);
}
