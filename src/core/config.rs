//! Engine configuration
//!
//! One immutable configuration value passed into each component at
//! construction. Nothing in the engine reads ambient global state.

use serde::{Deserialize, Serialize};

/// How a scenario shifts an expiry's target ATM IV
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IvShift {
    /// Front IV collapses onto the back expiry's ATM IV
    CollapseToBack,
    /// No change from the observed ATM IV
    Unchanged,
    /// Multiplicative shift: target = base * (1 + value)
    Relative(f64),
}

/// One post-event IV scenario, applied per leg by expiry side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IvScenario {
    pub name: String,
    pub front: IvShift,
    pub back: IvShift,
}

impl IvScenario {
    pub fn new(name: impl Into<String>, front: IvShift, back: IvShift) -> Self {
        Self {
            name: name.into(),
            front,
            back,
        }
    }
}

/// Composite-score weights over normalized metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub ev: f64,
    pub convexity: f64,
    pub cvar: f64,
    pub robustness: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            ev: 0.4,
            convexity: 0.3,
            cvar: 0.2,
            robustness: 0.1,
        }
    }
}

/// Entry-condition thresholds for conditionally-gated structures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Minimum front/back IV ratio for backspreads
    /// Default: 1.40
    pub backspread_min_iv_ratio: f64,

    /// Minimum event-variance ratio for backspreads
    /// Default: 0.50
    pub backspread_min_event_var_ratio: f64,

    /// Implied move must be <= historical P75 times this factor
    /// Default: 0.90
    pub backspread_max_implied_over_p75: f64,

    /// Minimum ATM short delta for backspreads
    /// Default: 0.08
    pub backspread_min_short_delta: f64,

    /// Back-leg DTE window for backspreads (inclusive)
    /// Default: [21, 45]
    pub backspread_dte_min: i64,
    pub backspread_dte_max: i64,

    /// Minimum absolute wing width (in strike units) between the
    /// backspread short and long strikes
    /// Default: 5.0
    pub backspread_min_wing_width: f64,

    /// Backspread quantity ratio (sell, buy)
    /// Default: (1, 2)
    pub backspread_ratio: (u32, u32),

    /// Minimum |back_dte - front_dte| for a calendar
    /// Default: 14
    pub calendar_min_term_spread_days: i64,

    /// Post-event calendar entry window, days after the event (inclusive)
    /// Default: [1, 3]
    pub post_event_entry_min_days: i64,
    pub post_event_entry_max_days: i64,

    /// Minimum front/back IV ratio for the post-event calendar
    /// Default: 1.10
    pub post_event_min_iv_ratio: f64,

    /// Minimum front DTE for the post-event calendar short leg
    /// Default: 3
    pub post_event_min_short_dte: i64,

    /// IV compression applied to the post-event calendar long leg
    /// when evaluating spot-move scenarios
    /// Default: 0.92
    pub post_event_long_iv_compression: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            backspread_min_iv_ratio: 1.40,
            backspread_min_event_var_ratio: 0.50,
            backspread_max_implied_over_p75: 0.90,
            backspread_min_short_delta: 0.08,
            backspread_dte_min: 21,
            backspread_dte_max: 45,
            backspread_min_wing_width: 5.0,
            backspread_ratio: (1, 2),
            calendar_min_term_spread_days: 14,
            post_event_entry_min_days: 1,
            post_event_entry_max_days: 3,
            post_event_min_iv_ratio: 1.10,
            post_event_min_short_dte: 3,
            post_event_long_iv_compression: 0.92,
        }
    }
}

/// Chain filtering thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Strike moneyness band, as fractions of spot
    /// Default: [0.80, 1.20]
    pub moneyness_low: f64,
    pub moneyness_high: f64,

    /// Minimum open interest
    /// Default: 100
    pub min_open_interest: u64,

    /// Maximum spread as a fraction of mid
    /// Default: 0.05
    pub max_spread_pct: f64,

    /// ATM spread fraction of mid above which a diagnostic is emitted
    /// Default: 0.10
    pub implied_move_max_spread_pct: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            moneyness_low: 0.80,
            moneyness_high: 1.20,
            min_open_interest: 100,
            max_spread_pct: 0.05,
            implied_move_max_spread_pct: 0.10,
        }
    }
}

/// Engine-wide configuration. Immutable for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Risk-free rate (annualized, continuous)
    /// Default: 0.05
    pub risk_free_rate: f64,

    /// Dividend yield (annualized, continuous)
    /// Default: 0.0003
    pub dividend_yield: f64,

    /// Contract multiplier (shares per contract)
    /// Default: 100
    pub contract_multiplier: f64,

    /// Fraction of the half-spread crossed on execution
    /// Default: 0.10
    pub slippage_pct: f64,

    /// Monte Carlo simulation count per move batch
    /// Default: 100_000
    pub mc_simulations: usize,

    /// Exit at expiry intrinsic instead of repricing
    /// Default: false
    pub hold_to_expiry: bool,

    /// Floor for year-fractions and ratio denominators
    /// Default: 1e-6
    pub time_epsilon: f64,

    /// Convexity metric ceiling and near-zero denominator guard
    /// Defaults: 10.0, 1e-6
    pub convexity_cap: f64,
    pub convexity_eps: f64,

    /// Strike band around spot for GEX aggregation, as fraction of spot
    /// Default: 0.05
    pub gex_range_pct: f64,

    /// Strangle wing offset as a multiple of the implied move. The
    /// resulting spot fraction must lie in (0, 0.5)
    /// Default: 0.8
    pub strangle_offset_mult: f64,

    /// IV scenarios evaluated per strategy. The first entry is the base
    /// scenario used for the headline P&L distribution.
    pub iv_scenarios: Vec<IvScenario>,

    /// Vol-of-vol shocks in percent of event vol; 0 (the base batch) is
    /// always included first
    pub vol_shocks: Vec<i32>,

    pub scoring: ScoringWeights,
    pub gates: GateConfig,
    pub filters: FilterConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.05,
            dividend_yield: 0.0003,
            contract_multiplier: 100.0,
            slippage_pct: 0.10,
            mc_simulations: 100_000,
            hold_to_expiry: false,
            time_epsilon: 1e-6,
            convexity_cap: 10.0,
            convexity_eps: 1e-6,
            gex_range_pct: 0.05,
            strangle_offset_mult: 0.8,
            iv_scenarios: vec![
                IvScenario::new("base_crush", IvShift::CollapseToBack, IvShift::CollapseToBack),
                IvScenario::new("hard_crush", IvShift::Relative(-0.35), IvShift::Relative(-0.10)),
                IvScenario::new("expansion", IvShift::Relative(0.10), IvShift::Relative(0.05)),
            ],
            vol_shocks: vec![-10, -5, 5, 10],
            scoring: ScoringWeights::default(),
            gates: GateConfig::default(),
            filters: FilterConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Shock levels evaluated for the robustness grid: base (0) first,
    /// then the configured non-zero shocks.
    pub fn shock_levels(&self) -> Vec<i32> {
        let mut levels = vec![0];
        levels.extend(self.vol_shocks.iter().copied().filter(|s| *s != 0));
        levels
    }

    /// The base scenario name (first configured scenario)
    pub fn base_scenario(&self) -> &IvScenario {
        &self.iv_scenarios[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.iv_scenarios.len(), 3);
        assert_eq!(cfg.base_scenario().name, "base_crush");
        assert_eq!(cfg.shock_levels(), vec![0, -10, -5, 5, 10]);
        let w = cfg.scoring;
        assert!((w.ev + w.convexity + w.cvar + w.robustness - 1.0).abs() < 1e-12);
    }
}
