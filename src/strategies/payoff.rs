//! Strategy pricing and payoff
//!
//! Entry cost from slippage-adjusted execution prices; exit value per
//! simulated terminal spot and per IV scenario, vectorized across the
//! full move array. This is the hot path: it runs once per
//! (strategy x scenario x shock) cell over ~1e5 samples.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ndarray::Array1;

use crate::analytics::event_vol::year_fraction;
use crate::core::{
    execution_price, execution_price_vec, ChainLookup, EngineConfig, EvResult, IvScenario,
    IvShift, OptionChain, Strategy,
};
use crate::models::black_scholes;

/// Shared repricing inputs for one run
pub struct RepriceContext<'a> {
    pub lookup: &'a ChainLookup,
    pub spot: f64,
    pub front_expiry: NaiveDate,
    pub event_date: NaiveDate,
    /// Front expiry ATM IV observed at entry
    pub front_iv: f64,
    /// Back expiry ATM IV observed at entry
    pub back_iv: f64,
    /// Observed ATM IV per expiry, for relative-skew preservation
    pub expiry_atm_iv: &'a BTreeMap<NaiveDate, f64>,
    pub config: &'a EngineConfig,
}

impl RepriceContext<'_> {
    fn is_front(&self, expiry: NaiveDate) -> bool {
        expiry == self.front_expiry
    }
}

/// Observed ATM IV per expiry across the supplied chains
pub fn expiry_atm_iv(chains: &[&OptionChain], spot: f64) -> BTreeMap<NaiveDate, f64> {
    let mut map = BTreeMap::new();
    for chain in chains {
        if let Ok(iv) = chain.atm_iv(spot) {
            map.insert(chain.expiry, iv);
        }
    }
    map
}

/// Net entry cost of a strategy: slippage-adjusted execution price per
/// leg, scaled by quantity and contract multiplier, signed positive for
/// bought legs and negative for sold legs.
pub fn entry_cost(strategy: &Strategy, ctx: &RepriceContext) -> EvResult<f64> {
    let mut total = 0.0;
    for leg in &strategy.legs {
        let data = ctx.lookup.leg_quote(leg)?;
        let price = execution_price(data.mid, data.spread, leg.side, ctx.config.slippage_pct);
        total += leg.side.sign() * price * leg.qty as f64 * ctx.config.contract_multiplier;
    }
    Ok(total)
}

/// Scenario-adjusted leg IV, preserving the leg's observed skew position:
/// post_iv = leg_iv * (scenario target ATM / observed ATM at that expiry).
fn post_iv(leg_expiry: NaiveDate, leg_iv: f64, scenario: &IvScenario, ctx: &RepriceContext) -> f64 {
    let epsilon = ctx.config.time_epsilon;
    let is_front = ctx.is_front(leg_expiry);

    let atm_iv = ctx
        .expiry_atm_iv
        .get(&leg_expiry)
        .copied()
        .unwrap_or(leg_iv)
        .max(epsilon);
    let base_atm = if is_front { ctx.front_iv } else { ctx.back_iv };

    let shift = if is_front { scenario.front } else { scenario.back };
    let target_atm = match shift {
        IvShift::CollapseToBack => ctx.back_iv,
        IvShift::Unchanged => base_atm,
        IvShift::Relative(pct) => base_atm * (1.0 + pct),
    };

    // Skew frozen: IV adjusted via proportional scaling relative to ATM
    // only. Post-event RR and BF are assumed unchanged.
    (leg_iv * (target_atm / atm_iv)).max(epsilon)
}

/// P&L distribution for a strategy over the simulated move array under
/// one IV scenario: exit value array minus the entry cost scalar.
pub fn strategy_pnl(
    strategy: &Strategy,
    moves: &Array1<f64>,
    scenario: &IvScenario,
    ctx: &RepriceContext,
) -> EvResult<Array1<f64>> {
    let cfg = ctx.config;
    let cost = entry_cost(strategy, ctx)?;

    let new_spots = moves.mapv(|m| ctx.spot * (1.0 + m));
    let mut exit_values = Array1::<f64>::zeros(moves.len());

    // Small loop over 1-4 legs; each leg is vectorized over all samples
    for leg in &strategy.legs {
        let data = ctx.lookup.leg_quote(leg)?;

        let prices = if cfg.hold_to_expiry {
            new_spots.mapv(|s| leg.option_type.intrinsic(s, leg.strike))
        } else {
            let t_remaining = year_fraction(ctx.event_date, leg.expiry, cfg.time_epsilon);
            let iv = post_iv(leg.expiry, data.iv, scenario, ctx);
            let repriced = black_scholes::price_vec(
                &new_spots,
                leg.strike,
                t_remaining,
                cfg.risk_free_rate,
                cfg.dividend_yield,
                iv,
                leg.option_type,
            );
            // Closing a bought leg means selling, and vice versa
            execution_price_vec(&repriced, data.spread, leg.side.opposite(), cfg.slippage_pct)
        };

        let weight = leg.side.sign() * leg.qty as f64 * cfg.contract_multiplier;
        exit_values = exit_values + prices.mapv(|p| p * weight);
    }

    Ok(exit_values.mapv(|v| v - cost))
}
