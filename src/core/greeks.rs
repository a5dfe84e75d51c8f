//! Option Greeks
//!
//! First-order sensitivities and signed net-position accumulation.

use serde::{Deserialize, Serialize};

/// Option Greeks (sensitivities)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    /// Delta: dV/dS
    pub delta: f64,
    /// Gamma: d²V/dS²
    pub gamma: f64,
    /// Vega: dV/dσ, dollars per unit IV
    pub vega: f64,
    /// Theta: dV/dt, per calendar day
    pub theta: f64,
}

impl Greeks {
    pub fn new(delta: f64, gamma: f64, vega: f64, theta: f64) -> Self {
        Self {
            delta,
            gamma,
            vega,
            theta,
        }
    }

    /// Scale by a factor (signed quantity, notional)
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            delta: self.delta * factor,
            gamma: self.gamma * factor,
            vega: self.vega * factor,
            theta: self.theta * factor,
        }
    }

    /// Sum with another set of Greeks
    pub fn add(&self, other: &Greeks) -> Self {
        Self {
            delta: self.delta + other.delta,
            gamma: self.gamma + other.gamma,
            vega: self.vega + other.vega,
            theta: self.theta + other.theta,
        }
    }
}

/// Net Greeks for a multi-leg position, accumulated leg by leg with the
/// leg's signed quantity.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NetGreeks {
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
    pub num_legs: usize,
}

impl NetGreeks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one leg's Greeks with signed quantity (+qty bought, -qty sold)
    pub fn add_leg(&mut self, greeks: &Greeks, signed_qty: f64) {
        self.delta += greeks.delta * signed_qty;
        self.gamma += greeks.gamma * signed_qty;
        self.vega += greeks.vega * signed_qty;
        self.theta += greeks.theta * signed_qty;
        self.num_legs += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_and_add() {
        let g = Greeks::new(0.5, 0.02, 0.3, -0.05);
        let scaled = g.scale(2.0);
        assert!((scaled.delta - 1.0).abs() < 1e-12);

        let sum = g.add(&scaled);
        assert!((sum.gamma - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_net_accumulation() {
        let mut net = NetGreeks::new();
        net.add_leg(&Greeks::new(0.5, 0.02, 0.3, -0.05), 1.0);
        net.add_leg(&Greeks::new(0.5, 0.02, 0.3, -0.05), -1.0);
        assert!(net.delta.abs() < 1e-12);
        assert!(net.gamma.abs() < 1e-12);
        assert_eq!(net.num_legs, 2);
    }
}
