//! Strategy scoring and ranking
//!
//! Reduces each P&L distribution plus auxiliary metrics to a composite
//! score, then sorts and ranks the candidate set. Normalization is
//! min-max over the current batch: scores are only meaningful within one
//! ranking run.

use std::collections::BTreeMap;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::core::{
    EvError, EvResult, OptionType, ScoringWeights, Side, Strategy,
};

/// Risk classification from leg coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskClass {
    DefinedRisk,
    UndefinedRisk,
}

impl std::fmt::Display for RiskClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskClass::DefinedRisk => write!(f, "defined_risk"),
            RiskClass::UndefinedRisk => write!(f, "undefined_risk"),
        }
    }
}

/// Per-strategy metrics computed from the base-scenario P&L array and
/// the scenario/shock EV grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyMetrics {
    pub strategy: Strategy,
    /// Sample mean of the base P&L distribution
    pub ev: f64,
    /// Mean of the worst 5% tail
    pub cvar: f64,
    /// Best-10%-tail mean over |worst-10%-tail mean|, capped
    pub convexity: f64,
    /// Inverse dispersion of EVs across the scenario x shock grid
    pub robustness: f64,
    pub max_loss: f64,
    /// |max loss| relative to the larger of implied move and P75, in dollars
    pub capital_ratio: f64,
    pub risk: RiskClass,
    /// EV per IV scenario at the base shock level
    pub scenario_evs: BTreeMap<String, f64>,
}

/// A strategy with its composite score and 1-based rank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredStrategy {
    pub metrics: StrategyMetrics,
    pub score: f64,
    pub rank: usize,
    pub risk_penalty_applied: bool,
}

/// Robustness from the per-(scenario x shock) EV grid: 1/(sigma + eps).
///
/// The dispersion of a single P&L array is not an acceptable substitute;
/// a degenerate grid is rejected rather than silently falling back.
pub fn robustness_from_grid(grid_evs: &[f64]) -> EvResult<f64> {
    if grid_evs.len() < 2 {
        return Err(EvError::invalid_input(
            "robustness requires the scenario x shock EV grid, not a single cell",
        ));
    }
    let n = grid_evs.len() as f64;
    let mean = grid_evs.iter().sum::<f64>() / n;
    let var = grid_evs.iter().map(|ev| (ev - mean).powi(2)).sum::<f64>() / n;
    Ok(1.0 / (var.sqrt() + 1e-9))
}

/// Compute scoring metrics for one strategy.
#[allow(clippy::too_many_arguments)]
pub fn compute_metrics(
    strategy: &Strategy,
    pnls: &Array1<f64>,
    grid_evs: &[f64],
    scenario_evs: BTreeMap<String, f64>,
    implied_move: f64,
    historical_p75: f64,
    spot: f64,
    contract_multiplier: f64,
    convexity_cap: f64,
    convexity_eps: f64,
) -> EvResult<StrategyMetrics> {
    if pnls.is_empty() {
        return Err(EvError::invalid_input("empty P&L distribution"));
    }

    let robustness = robustness_from_grid(grid_evs)?;

    let mut sorted: Vec<f64> = pnls.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let n = sorted.len();
    let ev = sorted.iter().sum::<f64>() / n as f64;

    let cvar_tail = ((0.05 * n as f64) as usize).max(1);
    let cvar = sorted[..cvar_tail].iter().sum::<f64>() / cvar_tail as f64;

    let convexity = convexity_from_sorted(&sorted, convexity_cap, convexity_eps);

    let max_loss = sorted[0];
    let expected_move_dollar = implied_move.max(historical_p75) * spot * contract_multiplier;
    let capital_ratio = max_loss.abs() / expected_move_dollar.max(1e-9);

    Ok(StrategyMetrics {
        strategy: strategy.clone(),
        ev,
        cvar,
        convexity,
        robustness,
        max_loss,
        capital_ratio,
        risk: classify_risk(strategy),
        scenario_evs,
    })
}

/// Ratio of the best 10% tail mean to |worst 10% tail mean|, forced to
/// the cap when the loss tail is near zero.
fn convexity_from_sorted(sorted: &[f64], cap: f64, eps: f64) -> f64 {
    let tail = ((0.1 * sorted.len() as f64) as usize).max(1);
    let bottom = sorted[..tail].iter().sum::<f64>() / tail as f64;
    let top = sorted[sorted.len() - tail..].iter().sum::<f64>() / tail as f64;
    if bottom.abs() < eps {
        return cap;
    }
    (top / bottom.abs()).min(cap)
}

/// Undefined risk when any short leg's quantity is not fully covered by
/// long legs of the same type, at an equal-or-better strike (>= for
/// calls, <= for puts), expiring no earlier than the short.
pub fn classify_risk(strategy: &Strategy) -> RiskClass {
    for option_type in [OptionType::Call, OptionType::Put] {
        for short in strategy.legs_of(option_type, Side::Sell) {
            let cover_qty: u32 = strategy
                .legs_of(option_type, Side::Buy)
                .filter(|long| long.expiry >= short.expiry)
                .filter(|long| match option_type {
                    OptionType::Call => long.strike >= short.strike,
                    OptionType::Put => long.strike <= short.strike,
                })
                .map(|long| long.qty)
                .sum();
            if cover_qty < short.qty {
                return RiskClass::UndefinedRisk;
            }
        }
    }
    RiskClass::DefinedRisk
}

/// Min-max normalize each metric over the batch, combine with the
/// configured weights, penalize undefined risk, sort descending, and
/// assign 1-based ranks. Ties keep submission order.
pub fn score_and_rank(
    metrics: Vec<StrategyMetrics>,
    weights: &ScoringWeights,
) -> Vec<ScoredStrategy> {
    let evs: Vec<f64> = metrics.iter().map(|m| m.ev).collect();
    let convexities: Vec<f64> = metrics.iter().map(|m| m.convexity).collect();
    let cvars: Vec<f64> = metrics.iter().map(|m| m.cvar).collect();
    let robustness: Vec<f64> = metrics.iter().map(|m| m.robustness).collect();

    let norm_ev = normalize(&evs);
    let norm_conv = normalize(&convexities);
    let norm_cvar = normalize(&cvars);
    let norm_rob = normalize(&robustness);

    let mut scored: Vec<ScoredStrategy> = metrics
        .into_iter()
        .enumerate()
        .map(|(i, m)| {
            let mut score = weights.ev * norm_ev[i]
                + weights.convexity * norm_conv[i]
                + weights.cvar * norm_cvar[i]
                + weights.robustness * norm_rob[i];
            let penalized = m.risk == RiskClass::UndefinedRisk;
            if penalized {
                score *= 0.9;
            }
            ScoredStrategy {
                metrics: m,
                score,
                rank: 0,
                risk_penalty_applied: penalized,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    for (i, entry) in scored.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    scored
}

/// Min-max normalization over the current batch; a constant batch maps
/// to 0.5 everywhere.
fn normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if (max - min).abs() < 1e-12 {
        return vec![0.5; values.len()];
    }
    values.iter().map(|v| (v - min) / (max - min)).collect()
}
