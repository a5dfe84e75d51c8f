//! Monte Carlo simulation of event moves
//!
//! Draws a seeded ensemble of lognormal terminal-price moves calibrated
//! to the event volatility. Each batch owns its generator, so batches for
//! different shock levels are independent and reproducible in isolation.

use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analytics::event_vol::TRADING_DAYS;

/// One batch of simulated fractional terminal-price moves, tagged by the
/// (event vol, shock) pair that generated it. Immutable once generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedMoveSet {
    pub moves: Array1<f64>,
    pub event_vol: f64,
    /// Vol-of-vol shock in percent; 0 for the base batch
    pub shock_pct: i32,
}

impl SimulatedMoveSet {
    pub fn generate(event_vol: f64, shock_pct: i32, simulations: usize, seed: Option<u64>) -> Self {
        Self {
            moves: simulate_moves(event_vol, simulations, seed),
            event_vol,
            shock_pct,
        }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Simulate lognormal event moves with the Ito drift correction, so the
/// sample mean of simple returns is approximately zero.
///
/// Identical (event_vol, simulations, seed) always yields bit-identical
/// output. A non-positive event vol returns an all-zero array.
pub fn simulate_moves(event_vol: f64, simulations: usize, seed: Option<u64>) -> Array1<f64> {
    if event_vol <= 0.0 {
        return Array1::zeros(simulations);
    }

    let sigma_1d = event_vol / TRADING_DAYS.sqrt();
    let mut rng = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };

    let moves = Array1::from_iter((0..simulations).map(|_| {
        let z: f64 = rng.sample(StandardNormal);
        (-0.5 * sigma_1d * sigma_1d + sigma_1d * z).exp() - 1.0
    }));

    validate(&moves, sigma_1d);
    moves
}

/// Sanity check: sample mean within 3% of sigma from zero and sample std
/// within 3% of sigma. Out-of-tolerance batches are logged, not rejected.
fn validate(moves: &Array1<f64>, sigma_1d: f64) {
    let n = moves.len() as f64;
    if n == 0.0 {
        return;
    }
    let mean = moves.sum() / n;
    let var = moves.mapv(|m| (m - mean) * (m - mean)).sum() / n;
    let std = var.sqrt();

    let mean_ok = mean.abs() <= 0.03 * sigma_1d.abs().max(1e-9);
    let std_ok = (std - sigma_1d).abs() <= 0.03 * sigma_1d.max(1e-9);
    if !mean_ok || !std_ok {
        warn!(
            mean,
            std,
            target = sigma_1d,
            "Monte Carlo sample statistics outside tolerance"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let a = simulate_moves(0.8, 1000, Some(42));
        let b = simulate_moves(0.8, 1000, Some(42));
        assert_eq!(a, b);

        let c = simulate_moves(0.8, 1000, Some(43));
        assert_ne!(a, c);
    }

    #[test]
    fn test_sample_moments() {
        let n = 100_000;
        let event_vol = 0.8;
        let sigma_1d = event_vol / TRADING_DAYS.sqrt();
        let moves = simulate_moves(event_vol, n, Some(7));

        let mean = moves.sum() / n as f64;
        let var = moves.mapv(|m| (m - mean) * (m - mean)).sum() / n as f64;
        let std = var.sqrt();

        assert!(mean.abs() <= 0.03 * sigma_1d);
        assert!((std - sigma_1d).abs() <= 0.03 * sigma_1d);
    }

    #[test]
    fn test_degenerate_vol() {
        let moves = simulate_moves(0.0, 500, Some(1));
        assert_eq!(moves.len(), 500);
        assert!(moves.iter().all(|&m| m == 0.0));

        let negative = simulate_moves(-0.5, 500, Some(1));
        assert!(negative.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_move_set_tagging() {
        let set = SimulatedMoveSet::generate(0.6, -10, 256, Some(3));
        assert_eq!(set.len(), 256);
        assert_eq!(set.shock_pct, -10);
        assert!((set.event_vol - 0.6).abs() < 1e-12);
    }
}
