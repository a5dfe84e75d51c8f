//! Market snapshot
//!
//! Flat, read-only view of current conditions, produced once per analysis
//! run and consumed by the gate predicates and the regime classifier.

use serde::{Deserialize, Serialize};

/// Named market fields describing conditions at run time. Immutable for
/// the run; every downstream component reads the same instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub spot: f64,
    /// Execution-adjusted ATM straddle / spot, as a decimal
    pub implied_move: f64,
    /// 75th percentile of absolute historical event moves
    pub historical_p75: f64,
    /// 90th percentile, when enough history exists
    pub historical_p90: Option<f64>,
    /// Front expiry ATM IV
    pub front_iv: f64,
    /// Back (first later) expiry ATM IV
    pub back_iv: f64,
    /// Second back expiry ATM IV, when available
    pub back2_iv: Option<f64>,
    /// Event share of front-expiry total variance, in [0, 1]
    pub event_variance_ratio: f64,
    /// front_iv / back_iv
    pub iv_ratio: f64,
    /// |ATM call delta| at the front expiry
    pub short_delta: f64,
    /// Calendar days since the event; 0 when pre-event
    pub days_after_event: i64,
    pub front_dte: i64,
    pub back_dte: i64,
    /// Net dealer gamma exposure, dollars
    pub gex_net: f64,
    /// Absolute dealer gamma exposure, dollars
    pub gex_abs: f64,
    /// Historical distribution shape of signed event moves
    pub mean_abs_move: f64,
    pub median_abs_move: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl MarketSnapshot {
    /// |gex_net| / gex_abs, 0 when gex_abs is not positive
    pub fn gex_ratio(&self) -> f64 {
        if self.gex_abs > 0.0 {
            self.gex_net.abs() / self.gex_abs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
pub(crate) fn test_snapshot() -> MarketSnapshot {
    MarketSnapshot {
        spot: 100.0,
        implied_move: 0.06,
        historical_p75: 0.08,
        historical_p90: Some(0.10),
        front_iv: 0.80,
        back_iv: 0.50,
        back2_iv: Some(0.45),
        event_variance_ratio: 0.60,
        iv_ratio: 1.60,
        short_delta: 0.52,
        days_after_event: 0,
        front_dte: 5,
        back_dte: 33,
        gex_net: -8.0e8,
        gex_abs: 1.0e9,
        mean_abs_move: 0.055,
        median_abs_move: 0.05,
        skewness: 0.2,
        kurtosis: 3.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gex_ratio() {
        let snap = test_snapshot();
        assert!((snap.gex_ratio() - 0.8).abs() < 1e-12);

        let mut zeroed = snap;
        zeroed.gex_abs = 0.0;
        assert_eq!(zeroed.gex_ratio(), 0.0);
    }
}
