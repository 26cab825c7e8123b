/// Shared fixtures for the integration tests.
use ndarray::Array2;
use topoplot::ChannelLayout;

#[allow(unused)]
/// `{A:(0,0), B:(1,0), C:(0,1)}`: the smallest non-degenerate layout.
pub fn triangle_layout() -> ChannelLayout {
    [("A", [0.0, 0.0]), ("B", [1.0, 0.0]), ("C", [0.0, 1.0])]
        .into_iter()
        .collect()
}

#[allow(unused)]
/// 21 channels on concentric rings, in layout units of a typical `.lout`
/// (roughly ±40).
pub fn head_layout() -> ChannelLayout {
    let mut out = ChannelLayout::new();
    out.insert("Cz", [0.0, 0.0]);
    for (ring, (n, radius)) in [(8usize, 18.0_f64), (12, 36.0)].into_iter().enumerate() {
        for i in 0..n {
            let a = i as f64 / n as f64 * std::f64::consts::TAU;
            out.insert(format!("R{ring}_{i}"), [radius * a.cos(), radius * a.sin()]);
        }
    }
    out
}

#[allow(unused)]
/// Deterministic pseudo-random signal `[n_t, n_ch]` in roughly ±50 µV.
pub fn lcg_signal(n_t: usize, n_ch: usize, seed: u64) -> Array2<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    Array2::from_shape_fn((n_t, n_ch), |_| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 11) as f64 / (1u64 << 53) as f64 - 0.5) * 100e-6
    })
}

#[allow(unused)]
/// Deterministic values in `[0.1, 1.1)`, never zero.
pub fn lcg_values(n: usize, seed: u64) -> Vec<f64> {
    lcg_signal(n, 1, seed).iter().map(|v| v / 100e-6 + 0.6).collect()
}
