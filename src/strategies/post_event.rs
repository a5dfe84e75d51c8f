//! Post-event calendar spread
//!
//! Entry window: 1-3 days after the event, while the front leg IV is
//! still residually elevated over the back leg. The edge is structural:
//! the short leg's inflated premium exceeds theta erosion on the long
//! leg. The short leg settles at intrinsic at front expiry, so its P&L
//! is fixed at entry; spot-move scenarios test stock risk, not IV path.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::{
    EvError, EvResult, GateConfig, MarketSnapshot, OptionChain, OptionLeg, OptionType, Side,
    Strategy,
};
use crate::models::black_scholes;

/// Post-event calendar with its entry pricing
#[derive(Debug, Clone)]
pub struct PostEventCalendar {
    pub strategy: Strategy,
    pub atm_strike: f64,
    pub front_iv: f64,
    pub back_iv: f64,
    /// Premium collected on the short front leg
    pub short_premium: f64,
    /// Cost of the long back leg
    pub long_cost: f64,
    /// Net debit paid at entry
    pub net_cost: f64,
}

/// Entry gate: 1-3 days post-event, front IV still elevated, and enough
/// front DTE for the short leg to settle meaningfully above intrinsic.
pub fn post_event_calendar_conditions_met(snapshot: &MarketSnapshot, gates: &GateConfig) -> bool {
    let window_ok = (gates.post_event_entry_min_days..=gates.post_event_entry_max_days)
        .contains(&snapshot.days_after_event);
    let iv_ratio_ok = snapshot.iv_ratio >= gates.post_event_min_iv_ratio;
    let dte_ok = snapshot.front_dte >= gates.post_event_min_short_dte;

    if !window_ok {
        debug!(
            days_after_event = snapshot.days_after_event,
            "post-event calendar gate: outside entry window"
        );
    }
    if !iv_ratio_ok {
        debug!(
            iv_ratio = snapshot.iv_ratio,
            min = gates.post_event_min_iv_ratio,
            "post-event calendar gate: iv_ratio below minimum"
        );
    }
    if !dte_ok {
        debug!(
            front_dte = snapshot.front_dte,
            min = gates.post_event_min_short_dte,
            "post-event calendar gate: front DTE below minimum"
        );
    }

    window_ok && iv_ratio_ok && dte_ok
}

/// Why the post-event calendar gate rejected the snapshot
pub fn post_event_rejection_reason(snapshot: &MarketSnapshot, gates: &GateConfig) -> String {
    if snapshot.days_after_event == 0 {
        return format!(
            "entry requires {}-{} days after the event (currently pre-event)",
            gates.post_event_entry_min_days, gates.post_event_entry_max_days
        );
    }
    if snapshot.days_after_event > gates.post_event_entry_max_days {
        return format!(
            "{}d after event exceeds the {}-day entry window",
            snapshot.days_after_event, gates.post_event_entry_max_days
        );
    }
    if snapshot.iv_ratio < gates.post_event_min_iv_ratio {
        return format!(
            "IV ratio {:.2} < {:.2} required",
            snapshot.iv_ratio, gates.post_event_min_iv_ratio
        );
    }
    if snapshot.front_dte < gates.post_event_min_short_dte {
        return format!(
            "front DTE {}d < {}d minimum",
            snapshot.front_dte, gates.post_event_min_short_dte
        );
    }
    "conditions not met".to_string()
}

/// Build the post-event calendar: SELL 1 front ATM call, BUY 1 back ATM
/// call, priced off the chains' ATM IVs.
#[allow(clippy::too_many_arguments)]
pub fn build_post_event_calendar(
    front_chain: &OptionChain,
    back_chain: &OptionChain,
    spot: f64,
    t_short: f64,
    t_long: f64,
    r: f64,
    q: f64,
    epsilon: f64,
) -> EvResult<PostEventCalendar> {
    let atm_strike = front_chain
        .nearest_strike(spot)
        .ok_or_else(|| EvError::data("post-event calendar: empty front chain"))?;
    let front_iv = front_chain.atm_iv(spot)?;
    let back_iv = back_chain.atm_iv(spot)?;

    let short_premium = black_scholes::price(
        spot,
        atm_strike,
        t_short.max(epsilon),
        r,
        q,
        front_iv,
        OptionType::Call,
    );
    let long_cost = black_scholes::price(
        spot,
        atm_strike,
        t_long.max(epsilon),
        r,
        q,
        back_iv,
        OptionType::Call,
    );

    let strategy = Strategy::new(
        "post_event_calendar",
        vec![
            OptionLeg::new(OptionType::Call, atm_strike, 1, Side::Sell, front_chain.expiry),
            OptionLeg::new(OptionType::Call, atm_strike, 1, Side::Buy, back_chain.expiry),
        ],
    );

    Ok(PostEventCalendar {
        strategy,
        atm_strike,
        front_iv,
        back_iv,
        short_premium,
        long_cost,
        net_cost: long_cost - short_premium,
    })
}

/// Evaluate the post-event calendar over fixed spot-move scenarios.
///
/// Per scenario: the short leg settles at intrinsic, the long leg is
/// repriced at its remaining time with mild IV compression, and
/// pnl = long_exit - short_intrinsic - net_cost.
#[allow(clippy::too_many_arguments)]
pub fn compute_post_event_scenarios(
    calendar: &PostEventCalendar,
    spot: f64,
    t_short: f64,
    t_long: f64,
    r: f64,
    q: f64,
    long_iv_compression: f64,
    epsilon: f64,
) -> BTreeMap<String, f64> {
    let t_remaining = (t_long - t_short).max(epsilon);
    let compressed_iv = calendar.back_iv * long_iv_compression;
    let k = calendar.atm_strike;

    let spot_moves = [
        ("flat", 0.0),
        ("up_5pct", 0.05),
        ("down_5pct", -0.05),
        ("up_10pct", 0.10),
        ("down_10pct", -0.10),
    ];

    spot_moves
        .iter()
        .map(|&(name, pct)| {
            let spot_t = spot * (1.0 + pct);
            let short_intrinsic = (spot_t - k).max(0.0);
            let long_exit = black_scholes::price(
                spot_t,
                k,
                t_remaining,
                r,
                q,
                compressed_iv,
                OptionType::Call,
            );
            (name.to_string(), long_exit - short_intrinsic - calendar.net_cost)
        })
        .collect()
}
